//! Traits and types for the analysis capability boundary

use crate::harvester::IndexRanges;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Feature/weight matrix with one row per Flat Record List position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    /// Column names (e.g. vocabulary terms)
    pub feature_names: Vec<String>,
    /// One row per record, each `feature_names.len()` wide
    pub rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the matrix has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True when every row has one value per feature
    pub fn is_rectangular(&self) -> bool {
        self.rows.iter().all(|row| row.len() == self.feature_names.len())
    }
}

/// One cluster label per Flat Record List position
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterLabels(pub Vec<usize>);

/// Square pairwise similarity matrix
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimilarityMatrix(pub Vec<Vec<f64>>);

/// 2-D coordinates for each record, as rendered by [`AnalysisBackend::visualize`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Projection(pub Vec<[f64; 2]>);

/// Capabilities of an analysis backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisCapabilities {
    /// Can turn text into a feature matrix
    pub can_vectorize: bool,
    /// Can cluster a feature matrix
    pub can_cluster: bool,
    /// Can compute pairwise similarity
    pub can_compare: bool,
    /// Can project and render the matrix in two dimensions
    pub can_visualize: bool,
}

/// Trait for the downstream text analysis pipeline
///
/// The harvesting core hands the Flat Record List over this boundary and
/// never depends on how the analysis is done. Implementations can wrap an
/// external library or service, or provide stub functionality for graceful
/// degradation.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Build a feature matrix with one row per document
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot vectorize (e.g. not supported).
    async fn vectorize(&self, documents: &[String]) -> crate::Result<FeatureMatrix>;

    /// Assign each row of `matrix` to one of `cluster_count` clusters
    async fn cluster(
        &self,
        matrix: &FeatureMatrix,
        cluster_count: usize,
    ) -> crate::Result<ClusterLabels>;

    /// Pairwise similarity between the rows of `matrix`
    async fn similarity(&self, matrix: &FeatureMatrix) -> crate::Result<SimilarityMatrix>;

    /// Project `matrix` to two dimensions, grouping points by the Identifier owning them
    async fn visualize(
        &self,
        matrix: &FeatureMatrix,
        labels: &ClusterLabels,
        ranges: &IndexRanges,
    ) -> crate::Result<Projection>;

    /// Query capabilities of this backend
    fn capabilities(&self) -> AnalysisCapabilities;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
