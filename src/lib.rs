//! # geo-harvest
//!
//! Concurrent, rate-limited harvesting of GEO dataset records linked from
//! PubMed identifiers.
//!
//! ## Design Philosophy
//!
//! geo-harvest is designed to be:
//! - **Order-preserving** - Results come back in input order no matter which worker finishes first
//! - **Failure-tolerant** - A failed lookup means fewer records, never a failed run
//! - **Polite** - Bounded worker pool, 429-aware retry, optional API key
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use geo_harvest::{Config, Harvester, Identifier};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         api_key: Some("my-ncbi-key".to_string()),
//!         max_concurrent_workers: 4,
//!         ..Default::default()
//!     };
//!
//!     let harvester = Harvester::new(config)?;
//!
//!     // Subscribe to events
//!     let mut events = harvester.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let identifiers = vec![Identifier::new("31000000"), Identifier::new("31000001")];
//!     let harvest = harvester.harvest(&identifiers).await;
//!     println!("{} records", harvest.records.len());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Analysis capability boundary
pub mod analysis;
/// Record assembly from detail responses
pub mod assembler;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Worker pool, orchestration and aggregation
pub mod harvester;
/// Identifier list input
pub mod input;
/// Remote lookups (resolve and detail)
pub mod lookup;
/// Retry policy for rate limits and timeouts
pub mod retry;
/// Core types and events
pub mod types;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use analysis::{AnalysisBackend, AnalysisReport, NoOpAnalysisBackend, run_pipeline};
pub use config::{Config, EndpointConfig, RetryConfig};
pub use error::{Error, Result};
pub use harvester::{Harvest, Harvester, IndexRanges};
pub use lookup::{LookupClient, LookupTransport, ReqwestTransport};
pub use retry::{RetryDecision, RetryPolicy, Retryable};
pub use types::{DependentId, Event, EventSink, Identifier, IndexRange, Record, WorkResult};

/// Run a harvest, cancelling it when a termination signal arrives.
///
/// On a signal the harvester is cancelled and the partial [`Harvest`] is
/// still returned, so whatever was collected can be written out.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use geo_harvest::{Config, Harvester, Identifier, harvest_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let harvester = Harvester::new(Config::default())?;
///     let harvest = harvest_with_shutdown(&harvester, &[Identifier::new("31000000")]).await;
///     println!("{} records", harvest.records.len());
///     Ok(())
/// }
/// ```
pub async fn harvest_with_shutdown(harvester: &Harvester, identifiers: &[Identifier]) -> Harvest {
    let run = harvester.harvest(identifiers);
    tokio::pin!(run);

    tokio::select! {
        harvest = &mut run => return harvest,
        _ = wait_for_signal() => harvester.cancel(),
    }
    run.await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
