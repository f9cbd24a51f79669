//! Per-Identifier worker: resolve, then fetch each dependent in order.

use crate::lookup::LookupClient;
use crate::types::{Event, EventSink, Identifier, WorkResult};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs the sequential resolve-then-fetch loop for one Identifier occurrence
///
/// Lookups within a worker never overlap; concurrency only exists across
/// workers. A worker never fails: every remote error shortens its record list.
#[derive(Clone, Debug)]
pub struct IdentifierWorker {
    client: Arc<LookupClient>,
    events: EventSink,
    deadline: Option<Duration>,
}

impl IdentifierWorker {
    /// Create a worker sharing `client`
    pub fn new(client: Arc<LookupClient>, events: EventSink, deadline: Option<Duration>) -> Self {
        Self {
            client,
            events,
            deadline,
        }
    }

    /// Harvest every record reachable from `identifier`
    ///
    /// Runs under a child of `cancel`; when the run is cancelled or the
    /// configured deadline passes, no further lookups are issued and the
    /// records gathered so far are returned.
    pub async fn run(
        &self,
        occurrence: usize,
        identifier: Identifier,
        cancel: &CancellationToken,
    ) -> WorkResult {
        let token = cancel.child_token();
        let timer = self.deadline.map(|deadline| {
            let token = token.clone();
            let identifier = identifier.clone();
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                tracing::warn!(
                    identifier = %identifier,
                    deadline_secs = deadline.as_secs_f64(),
                    "Worker deadline reached, stopping"
                );
                token.cancel();
            })
        });

        tracing::debug!(identifier = %identifier, occurrence, "Worker started");
        self.events.emit(Event::WorkerStarted {
            identifier: identifier.clone(),
            occurrence,
        });

        let dependents = self.client.resolve_dependents(&identifier, &token).await;
        self.events.emit(Event::DependentsResolved {
            identifier: identifier.clone(),
            count: dependents.len(),
        });

        let mut records = Vec::with_capacity(dependents.len());
        for dependent_id in &dependents {
            if token.is_cancelled() {
                break;
            }
            if let Some(record) = self
                .client
                .fetch_detail(dependent_id, &identifier, &token)
                .await
            {
                records.push(record);
            }
        }

        let cancelled = token.is_cancelled();
        if let Some(timer) = timer {
            timer.abort();
        }

        tracing::info!(
            identifier = %identifier,
            occurrence,
            dependents = dependents.len(),
            records = records.len(),
            cancelled,
            "Worker finished"
        );
        self.events.emit(Event::WorkerFinished {
            identifier: identifier.clone(),
            occurrence,
            success_count: records.len(),
            cancelled,
        });

        WorkResult::from_records(occurrence, identifier, records)
    }
}
