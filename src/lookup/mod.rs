//! Remote lookup client for the E-utilities and GEO endpoints.
//!
//! Two lookups are exposed, matching the two-stage service:
//! - [`LookupClient::resolve_dependents`]: Identifier → DependentIDs (ELink)
//! - [`LookupClient::fetch_detail`]: DependentID → [`Record`] (ESummary plus
//!   the GEO series text)
//!
//! Both run every GET through the [`RetryPolicy`] and never fail past their own
//! boundary: an abandoned lookup yields an empty list or `None`, and is
//! reported through `tracing` and the [`EventSink`].

mod links;
mod transport;

pub use transport::{HttpReply, LookupTransport, ReqwestTransport};

use crate::assembler;
use crate::config::{Config, EndpointConfig};
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use crate::types::{DependentId, Event, EventSink, Identifier, Record};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Client for the resolve and detail lookups
///
/// Holds no mutable state; one instance is shared by every worker.
#[derive(Clone)]
pub struct LookupClient {
    transport: Arc<dyn LookupTransport>,
    endpoints: EndpointConfig,
    api_key: Option<String>,
    api_key_param: String,
    retry: RetryPolicy,
    events: EventSink,
}

impl LookupClient {
    /// Create a client from the harvester configuration
    pub fn new(config: &Config, transport: Arc<dyn LookupTransport>, events: EventSink) -> Self {
        let retry = RetryPolicy::new(config.retry.clone()).with_events(events.clone());
        Self {
            transport,
            endpoints: config.endpoints.clone(),
            api_key: config.api_key.clone().filter(|key| !key.is_empty()),
            api_key_param: config.api_key_param.clone(),
            retry,
            events,
        }
    }

    /// Replace the retry policy (e.g. to inject a sleep function)
    ///
    /// The policy is attached to this client's event sink.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy.with_events(self.events.clone());
        self
    }

    /// Resolve the DependentIDs linked from `identifier`
    ///
    /// Returns them in response order. Any non-retryable failure, and
    /// cancellation, yields an empty list.
    pub async fn resolve_dependents(
        &self,
        identifier: &Identifier,
        cancel: &CancellationToken,
    ) -> Vec<DependentId> {
        let label = format!("resolve {identifier}");
        match self.try_resolve_dependents(identifier, cancel).await {
            Ok(ids) => {
                tracing::debug!(identifier = %identifier, count = ids.len(), "Resolved dependent IDs");
                ids
            }
            Err(Error::Cancelled) => {
                tracing::debug!(identifier = %identifier, "Resolve cancelled");
                Vec::new()
            }
            Err(e) => {
                self.report_failure(&label, &e);
                Vec::new()
            }
        }
    }

    /// Resolve, surfacing the error instead of absorbing it
    pub async fn try_resolve_dependents(
        &self,
        identifier: &Identifier,
        cancel: &CancellationToken,
    ) -> Result<Vec<DependentId>> {
        let url = self.lookup_url(&self.endpoints.link_url, "id", identifier.as_str(), true)?;
        let body = self
            .get_with_retry(&format!("resolve {identifier}"), &url, cancel)
            .await?;
        links::parse_link_ids(&body)
    }

    /// Fetch and assemble the record for one DependentID
    ///
    /// Returns `None` when any lookup fails or a required field is missing;
    /// the reason is emitted as a `RecordDropped` event.
    pub async fn fetch_detail(
        &self,
        dependent_id: &DependentId,
        identifier: &Identifier,
        cancel: &CancellationToken,
    ) -> Option<Record> {
        match self.try_fetch_detail(dependent_id, identifier, cancel).await {
            Ok(record) => {
                tracing::debug!(
                    identifier = %identifier,
                    dependent_id = %dependent_id,
                    accession = %record.accession,
                    "Assembled record"
                );
                self.events.emit(Event::RecordAssembled {
                    identifier: identifier.clone(),
                    dependent_id: dependent_id.clone(),
                    accession: record.accession.clone(),
                });
                Some(record)
            }
            Err(e) => {
                match &e {
                    Error::Cancelled => {
                        tracing::debug!(dependent_id = %dependent_id, "Detail lookup cancelled")
                    }
                    Error::FieldMissing { .. } => tracing::warn!(
                        identifier = %identifier,
                        dependent_id = %dependent_id,
                        error = %e,
                        "Dropping record with missing field"
                    ),
                    _ => self.report_failure(&format!("summary {dependent_id}"), &e),
                }
                self.events.emit(Event::RecordDropped {
                    identifier: identifier.clone(),
                    dependent_id: dependent_id.clone(),
                    reason: e.error_code().to_string(),
                });
                None
            }
        }
    }

    /// Fetch detail, surfacing the error instead of absorbing it
    pub async fn try_fetch_detail(
        &self,
        dependent_id: &DependentId,
        identifier: &Identifier,
        cancel: &CancellationToken,
    ) -> Result<Record> {
        let url = self.lookup_url(&self.endpoints.summary_url, "id", dependent_id.as_str(), true)?;
        let body = self
            .get_with_retry(&format!("summary {dependent_id}"), &url, cancel)
            .await?;
        let fields = assembler::parse_detail(&body, dependent_id)?;

        let accession = fields.accession();
        let url = self.lookup_url(&self.endpoints.series_text_url, "acc", &accession, false)?;
        let series_text = self
            .get_with_retry(&format!("series {accession}"), &url, cancel)
            .await?;

        Ok(assembler::assemble(identifier, dependent_id, fields, &series_text))
    }

    /// Base URL plus `param=value`, and the API key when `with_key` is set
    pub(crate) fn lookup_url(
        &self,
        base: &str,
        param: &str,
        value: &str,
        with_key: bool,
    ) -> Result<Url> {
        let mut url = Url::parse(base)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair(param, value);
            if with_key && let Some(key) = &self.api_key {
                pairs.append_pair(&self.api_key_param, key);
            }
        }
        Ok(url)
    }

    /// One logical GET: retried per policy, abandoned on cancellation
    async fn get_with_retry(
        &self,
        label: &str,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let attempt = self.retry.run(label, move || self.get_once(url));
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = attempt => result,
        }
    }

    /// Single GET; errors are redacted before the retry loop logs them
    async fn get_once(&self, url: &Url) -> Result<String> {
        self.fetch(url).await.map_err(|e| self.redact(e))
    }

    /// Single GET with status interpretation
    async fn fetch(&self, url: &Url) -> Result<String> {
        let reply = self.transport.get(url).await?;
        match reply.status {
            429 => Err(Error::RateLimited {
                url: url.to_string(),
            }),
            200..=299 => Ok(reply.body),
            status => Err(Error::HttpStatus {
                url: url.to_string(),
                status,
            }),
        }
    }

    fn report_failure(&self, label: &str, err: &Error) {
        tracing::warn!(lookup = label, code = err.error_code(), error = %err, "Lookup abandoned");
        self.events.emit(Event::LookupFailed {
            lookup: label.to_string(),
            code: err.error_code().to_string(),
            error: err.to_string(),
        });
    }

    /// Remove the API key, raw or query-encoded, from URLs carried by an error
    fn redact(&self, err: Error) -> Error {
        let Some(key) = self.api_key.as_deref() else {
            return err;
        };
        let encoded: String = url::form_urlencoded::byte_serialize(key.as_bytes()).collect();
        let scrub = |url: String| url.replace(&encoded, "REDACTED").replace(key, "REDACTED");
        match err {
            Error::Network(e) => Error::Network(e.without_url()),
            Error::RateLimited { url } => Error::RateLimited { url: scrub(url) },
            Error::Timeout { url } => Error::Timeout { url: scrub(url) },
            Error::HttpStatus { url, status } => Error::HttpStatus {
                url: scrub(url),
                status,
            },
            Error::Other(message) => Error::Other(scrub(message)),
            other => other,
        }
    }
}

impl std::fmt::Debug for LookupClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupClient")
            .field("endpoints", &self.endpoints)
            .field("api_key", &self.api_key.as_ref().map(|_| "REDACTED"))
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
