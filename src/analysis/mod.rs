//! Analysis capability boundary
//!
//! The harvest itself ends at the Flat Record List. Everything downstream
//! (vectorizing the record text, clustering, similarity, plotting) sits behind
//! the [`AnalysisBackend`] trait so the harvesting core can be run and tested
//! without any analysis implementation.
//!
//! - [`NoOpAnalysisBackend`]: Stub implementation when no backend is available
//!
//! [`run_pipeline`] drives a backend over a [`Harvest`] in the fixed order
//! vectorize → cluster → similarity → visualize.

mod noop;
mod traits;

pub use noop::NoOpAnalysisBackend;
pub use traits::{
    AnalysisBackend, AnalysisCapabilities, ClusterLabels, FeatureMatrix, Projection,
    SimilarityMatrix,
};

use crate::error::{Error, Result};
use crate::harvester::Harvest;
use serde::Serialize;

/// Everything the analysis pipeline produced for one harvest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Backend that produced the report
    pub backend: &'static str,
    /// Cluster count actually requested
    pub cluster_count: usize,
    /// One row per record
    pub matrix: FeatureMatrix,
    /// One label per record
    pub labels: ClusterLabels,
    /// Pairwise record similarity
    pub similarity: SimilarityMatrix,
    /// 2-D coordinates per record
    pub projection: Projection,
}

/// Text documents handed to the backend, one per record, in Flat Record List order
pub fn documents(harvest: &Harvest) -> Vec<String> {
    harvest.records.iter().map(|record| record.text_blob()).collect()
}

/// Run `backend` over the harvested records
///
/// `cluster_count` defaults to the number of Identifier occurrences and is
/// clamped to the number of records.
///
/// # Errors
/// `Error::NotSupported` if the backend lacks any stage, checked before it
/// is called. `Error::Other` if there are no records to analyse, or if the backend
/// returns output whose size does not match the record count; any backend
/// error is passed through.
pub async fn run_pipeline(
    backend: &dyn AnalysisBackend,
    harvest: &Harvest,
    cluster_count: Option<usize>,
) -> Result<AnalysisReport> {
    let docs = documents(harvest);
    if docs.is_empty() {
        return Err(Error::Other("no records to analyse".into()));
    }
    let n = docs.len();

    let caps = backend.capabilities();
    let missing: Vec<&str> = [
        (caps.can_vectorize, "vectorize"),
        (caps.can_cluster, "cluster"),
        (caps.can_compare, "compare"),
        (caps.can_visualize, "visualize"),
    ]
    .into_iter()
    .filter_map(|(supported, stage)| (!supported).then_some(stage))
    .collect();
    if !missing.is_empty() {
        return Err(Error::NotSupported(format!(
            "{} cannot {}",
            backend.name(),
            missing.join(", ")
        )));
    }

    let requested = cluster_count.unwrap_or(harvest.ranges.len()).max(1);
    let cluster_count = requested.min(n);
    if cluster_count != requested {
        tracing::warn!(
            requested,
            records = n,
            "Cluster count exceeds record count, clamping"
        );
    }

    tracing::info!(backend = backend.name(), records = n, cluster_count, "Running analysis");

    let matrix = backend.vectorize(&docs).await?;
    if matrix.len() != n || !matrix.is_rectangular() {
        return Err(Error::Other(format!(
            "{} returned a {}-row feature matrix for {n} records",
            backend.name(),
            matrix.len()
        )));
    }

    let labels = backend.cluster(&matrix, cluster_count).await?;
    check_len(backend, "cluster labels", labels.0.len(), n)?;

    let similarity = backend.similarity(&matrix).await?;
    check_len(backend, "similarity rows", similarity.0.len(), n)?;
    if similarity.0.iter().any(|row| row.len() != n) {
        return Err(Error::Other(format!(
            "{} returned a non-square similarity matrix",
            backend.name()
        )));
    }

    let projection = backend.visualize(&matrix, &labels, &harvest.ranges).await?;
    check_len(backend, "projected points", projection.0.len(), n)?;

    Ok(AnalysisReport {
        backend: backend.name(),
        cluster_count,
        matrix,
        labels,
        similarity,
        projection,
    })
}

fn check_len(backend: &dyn AnalysisBackend, what: &str, got: usize, expected: usize) -> Result<()> {
    if got == expected {
        Ok(())
    } else {
        Err(Error::Other(format!(
            "{} returned {got} {what} for {expected} records",
            backend.name()
        )))
    }
}
