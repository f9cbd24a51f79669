//! Harvest orchestration
//!
//! This module wires the pieces of a run together:
//! - [`worker`] - Sequential resolve-then-fetch loop for one Identifier
//! - [`orchestrator`] - Bounded pool of workers across the Identifier list
//! - [`aggregate`] - Input-order re-linearization into the Flat Record List
//!
//! [`Harvester`] is the entry point most callers want.

mod aggregate;
mod orchestrator;
mod worker;

pub use aggregate::{Harvest, IndexRanges, aggregate};
pub use orchestrator::Orchestrator;
pub use worker::IdentifierWorker;

use crate::config::Config;
use crate::error::Result;
use crate::lookup::{LookupClient, LookupTransport, ReqwestTransport};
use crate::retry::RetryPolicy;
use crate::types::{Event, EventSink, Identifier, WorkResult};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Harvests records for a list of Identifiers
///
/// # Example
///
/// ```no_run
/// use geo_harvest::{Config, Harvester, Identifier};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let harvester = Harvester::new(Config::default())?;
/// let mut events = harvester.subscribe();
/// tokio::spawn(async move {
///     while let Ok(event) = events.recv().await {
///         println!("{event:?}");
///     }
/// });
///
/// let harvest = harvester
///     .harvest(&[Identifier::new("31000000"), Identifier::new("31000001")])
///     .await;
/// for range in &harvest.ranges {
///     println!("{} -> {:?}", range.identifier, range.as_range());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Harvester {
    config: Arc<Config>,
    client: Arc<LookupClient>,
    events: EventSink,
    cancel: CancellationToken,
}

impl Harvester {
    /// Create a harvester that talks to the configured endpoints over HTTP
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or the HTTP client
    /// cannot be built
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(config.request_timeout)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a harvester with a custom transport
    ///
    /// # Errors
    /// Returns error if the configuration is invalid
    pub fn with_transport(config: Config, transport: Arc<dyn LookupTransport>) -> Result<Self> {
        config.validate()?;
        let events = EventSink::new(config.event_capacity);
        let client = LookupClient::new(&config, transport, events.clone());

        Ok(Self {
            config: Arc::new(config),
            client: Arc::new(client),
            events,
            cancel: CancellationToken::new(),
        })
    }

    /// Replace the retry policy used by every lookup
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        let client = (*self.client).clone().with_retry_policy(policy);
        self.client = Arc::new(client);
        self
    }

    /// Subscribe to harvest events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Stop issuing lookups; running workers return what they have
    ///
    /// Cancellation is permanent for this harvester: later runs finish
    /// immediately with empty results.
    pub fn cancel(&self) {
        tracing::info!("Harvest cancellation requested");
        self.cancel.cancel();
    }

    /// Token cancelled by [`Harvester::cancel`]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Configuration in effect
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run every worker and return the raw results in completion order
    pub async fn collect(&self, identifiers: &[Identifier]) -> Vec<WorkResult> {
        let worker = IdentifierWorker::new(
            Arc::clone(&self.client),
            self.events.clone(),
            self.config.worker_deadline,
        );
        Orchestrator::new(Arc::new(worker), self.config.max_concurrent_workers)
            .run(identifiers, &self.cancel)
            .await
    }

    /// Harvest `identifiers` and aggregate the results in input order
    pub async fn harvest(&self, identifiers: &[Identifier]) -> Harvest {
        let results = self.collect(identifiers).await;
        let harvest = aggregate(identifiers, results);

        tracing::info!(
            identifiers = identifiers.len(),
            records = harvest.records.len(),
            "Harvest complete"
        );
        self.events.emit(Event::HarvestComplete {
            identifiers: identifiers.len(),
            records: harvest.records.len(),
        });

        harvest
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
