//! Bounded fan-out of workers across the Identifier list.

use super::worker::IdentifierWorker;
use crate::types::{Identifier, WorkResult};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Starts one worker per Identifier occurrence, at most `pool_size` at a time
#[derive(Clone, Debug)]
pub struct Orchestrator {
    worker: Arc<IdentifierWorker>,
    pool_size: usize,
}

impl Orchestrator {
    /// Create an orchestrator; a pool size of zero is treated as one
    pub fn new(worker: Arc<IdentifierWorker>, pool_size: usize) -> Self {
        Self {
            worker,
            pool_size: pool_size.max(1),
        }
    }

    /// Configured pool size
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Run every Identifier and collect the results in completion order
    ///
    /// Exactly one [`WorkResult`] is returned per input position. A worker
    /// task that panics contributes an empty result rather than losing its
    /// slot. Workers run under a per-call child of `cancel`, so dropping the
    /// returned future stops them too.
    pub async fn run(
        &self,
        identifiers: &[Identifier],
        cancel: &CancellationToken,
    ) -> Vec<WorkResult> {
        tracing::info!(
            identifiers = identifiers.len(),
            pool_size = self.pool_size,
            "Starting workers"
        );

        // Dropping this future cancels every worker it spawned
        let run_token = cancel.child_token();
        let _guard = run_token.clone().drop_guard();

        stream::iter(identifiers.iter().cloned().enumerate())
            .map(|(occurrence, identifier)| {
                let worker = Arc::clone(&self.worker);
                let cancel = run_token.clone();
                let fallback = identifier.clone();
                async move {
                    let handle = tokio::spawn(async move {
                        worker.run(occurrence, identifier, &cancel).await
                    });
                    match handle.await {
                        Ok(result) => result,
                        Err(e) => {
                            tracing::error!(
                                identifier = %fallback,
                                occurrence,
                                error = %e,
                                "Worker task failed, recording empty result"
                            );
                            WorkResult::empty(occurrence, fallback)
                        }
                    }
                }
            })
            .buffer_unordered(self.pool_size)
            .collect()
            .await
    }
}
