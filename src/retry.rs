//! Retry policy for remote lookups
//!
//! Lookups against the E-utilities service fail in three distinct ways, and
//! each gets its own treatment:
//! - HTTP 429 (rate limited): wait, then retry
//! - transport timeout: retry immediately
//! - anything else: give up on this lookup
//!
//! The baseline policy retries without limit and waits a fixed interval. The
//! attempt cap, the backoff multiplier and the sleep function are injectable so
//! tests can run the loop without real time passing.
//!
//! # Example
//!
//! ```no_run
//! use geo_harvest::config::RetryConfig;
//! use geo_harvest::retry::RetryPolicy;
//! use geo_harvest::error::Error;
//!
//! # async fn example() -> Result<(), Error> {
//! let policy = RetryPolicy::new(RetryConfig::default());
//! let body = policy
//!     .run("resolve 12345", || async { Ok::<_, Error>("<eLinkResult/>".to_string()) })
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use crate::types::{Event, EventSink};
use futures::future::BoxFuture;
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// What to do after a failed attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait the rate-limit delay, then try again
    AfterDelay,
    /// Try again without waiting
    Immediately,
    /// Stop and return the error
    Abort,
}

/// Trait for errors that can be classified for the retry loop
pub trait Retryable {
    /// How the retry loop should react to this error
    fn retry_decision(&self) -> RetryDecision;
}

impl Retryable for Error {
    fn retry_decision(&self) -> RetryDecision {
        match self {
            Error::RateLimited { .. } => RetryDecision::AfterDelay,
            Error::Timeout { .. } => RetryDecision::Immediately,
            Error::Network(e) if e.is_timeout() => RetryDecision::Immediately,
            // Cancellation must end the loop
            Error::Cancelled => RetryDecision::Abort,
            // HTTP status, connection, XML, field and local errors are permanent for this lookup
            _ => RetryDecision::Abort,
        }
    }
}

/// Async sleep function used between rate-limited attempts
pub type SleepFn = Arc<dyn Fn(Duration) -> BoxFuture<'static, ()> + Send + Sync>;

/// Retry loop configuration plus the sleep function it waits with
#[derive(Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
    sleep: SleepFn,
    events: Option<EventSink>,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RetryPolicy {
    /// Policy that waits with `tokio::time::sleep`
    pub fn new(config: RetryConfig) -> Self {
        Self::with_sleep(config, |delay| Box::pin(tokio::time::sleep(delay)))
    }

    /// Policy with a custom sleep function
    pub fn with_sleep<S>(config: RetryConfig, sleep: S) -> Self
    where
        S: Fn(Duration) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        Self {
            config,
            sleep: Arc::new(sleep),
            events: None,
        }
    }

    /// Report rate-limit waits to an event sink
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = Some(events);
        self
    }

    /// Retry configuration in effect
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Delay before the attempt following the `throttled`-th rate-limit response (0-based)
    pub fn rate_limit_delay(&self, throttled: u32) -> Duration {
        let base = self.config.rate_limit_delay.as_secs_f64();
        let exponent = throttled.min(i32::MAX as u32) as i32;
        let grown = if base == 0.0 {
            0.0
        } else {
            base * self.config.backoff_multiplier.powi(exponent)
        };
        let delay = Duration::from_secs_f64(grown.min(self.config.max_delay.as_secs_f64()));
        if self.config.jitter {
            add_jitter(delay)
        } else {
            delay
        }
    }

    /// Run `operation` until it succeeds, fails permanently, or hits the attempt cap
    ///
    /// `label` identifies the lookup in logs and events.
    pub async fn run<F, Fut, T, E>(&self, label: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + std::fmt::Display,
    {
        let mut attempt: u32 = 0;
        let mut throttled: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);
            let err = match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!(lookup = label, attempts = attempt, "Lookup succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) => e,
            };

            let decision = err.retry_decision();
            if decision == RetryDecision::Abort {
                tracing::warn!(lookup = label, error = %err, "Lookup failed with non-retryable error");
                return Err(err);
            }

            if let Some(cap) = self.config.max_attempts
                && attempt >= cap
            {
                tracing::warn!(
                    lookup = label,
                    error = %err,
                    attempts = attempt,
                    "Lookup failed after all retry attempts exhausted"
                );
                return Err(err);
            }

            match decision {
                RetryDecision::AfterDelay => {
                    let delay = self.rate_limit_delay(throttled);
                    throttled = throttled.saturating_add(1);
                    tracing::info!(
                        lookup = label,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Rate limited, waiting before retry"
                    );
                    if let Some(events) = &self.events {
                        events.emit(Event::RateLimited {
                            lookup: label.to_string(),
                            attempt,
                            delay_ms: delay.as_millis() as u64,
                        });
                    }
                    (self.sleep)(delay).await;
                }
                RetryDecision::Immediately => {
                    tracing::info!(lookup = label, attempt, error = %err, "Timed out, retrying immediately");
                }
                RetryDecision::Abort => unreachable!("abort handled above"),
            }
        }
    }
}

/// Add random jitter to a delay to prevent thundering herd
///
/// The actual delay will be between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}
