//! No-op analysis backend for graceful degradation

use super::traits::{
    AnalysisBackend, AnalysisCapabilities, ClusterLabels, FeatureMatrix, Projection,
    SimilarityMatrix,
};
use crate::harvester::IndexRanges;
use async_trait::async_trait;

const UNAVAILABLE: &str = "text analysis requires an analysis backend; none is configured";

/// Backend used when no analysis implementation is available
///
/// Every operation returns `Error::NotSupported`, so a harvest can still
/// complete and be written out.
///
/// # Examples
///
/// ```
/// use geo_harvest::analysis::{AnalysisBackend, NoOpAnalysisBackend};
///
/// # #[tokio::main]
/// # async fn main() {
/// let backend = NoOpAnalysisBackend;
/// assert!(backend.vectorize(&["text".to_string()]).await.is_err());
/// assert!(!backend.capabilities().can_vectorize);
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpAnalysisBackend;

#[async_trait]
impl AnalysisBackend for NoOpAnalysisBackend {
    async fn vectorize(&self, _documents: &[String]) -> crate::Result<FeatureMatrix> {
        Err(crate::Error::NotSupported(UNAVAILABLE.into()))
    }

    async fn cluster(
        &self,
        _matrix: &FeatureMatrix,
        _cluster_count: usize,
    ) -> crate::Result<ClusterLabels> {
        Err(crate::Error::NotSupported(UNAVAILABLE.into()))
    }

    async fn similarity(&self, _matrix: &FeatureMatrix) -> crate::Result<SimilarityMatrix> {
        Err(crate::Error::NotSupported(UNAVAILABLE.into()))
    }

    async fn visualize(
        &self,
        _matrix: &FeatureMatrix,
        _labels: &ClusterLabels,
        _ranges: &IndexRanges,
    ) -> crate::Result<Projection> {
        Err(crate::Error::NotSupported(UNAVAILABLE.into()))
    }

    fn capabilities(&self) -> AnalysisCapabilities {
        AnalysisCapabilities {
            can_vectorize: false,
            can_cluster: false,
            can_compare: false,
            can_visualize: false,
        }
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
