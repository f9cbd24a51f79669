//! Shared test helpers: a scripted in-memory transport and canned responses.

use crate::config::{Config, EndpointConfig, RetryConfig};
use crate::error::{Error, Result};
use crate::lookup::{HttpReply, LookupTransport};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

/// Base URL the mock endpoints live under
pub(crate) const MOCK_BASE: &str = "http://mock.invalid";

/// One scripted outcome for a GET
#[derive(Clone, Debug)]
pub(crate) enum Scripted {
    /// Reply with status and body
    Reply(u16, String),
    /// Transport timeout
    Timeout,
    /// Non-retryable transport failure
    Broken,
}

impl Scripted {
    pub(crate) fn ok(body: impl Into<String>) -> Self {
        Scripted::Reply(200, body.into())
    }

    pub(crate) fn status(status: u16) -> Self {
        Scripted::Reply(status, String::new())
    }
}

/// Which mock endpoint a URL addresses
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Endpoint {
    Link,
    Summary,
    Series,
}

type Key = (Endpoint, String);

/// In-memory [`LookupTransport`] replaying scripted replies per (endpoint, id)
///
/// The last scripted outcome for a key repeats forever. Unscripted keys answer
/// 404. Every call is counted, and optional per-key latency simulates
/// out-of-order completion.
#[derive(Default)]
pub(crate) struct MockTransport {
    script: Mutex<HashMap<Key, VecDeque<Scripted>>>,
    latency: Mutex<HashMap<Key, Duration>>,
    calls: Mutex<HashMap<Key, u32>>,
    urls: Mutex<Vec<Url>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue outcomes for a key
    pub(crate) fn script(&self, endpoint: Endpoint, id: &str, outcomes: Vec<Scripted>) -> &Self {
        self.script
            .lock()
            .unwrap()
            .entry((endpoint, id.to_string()))
            .or_default()
            .extend(outcomes);
        self
    }

    /// Script a resolve that links `identifier` to `dependents`
    pub(crate) fn links(&self, identifier: &str, dependents: &[&str]) -> &Self {
        self.script(
            Endpoint::Link,
            identifier,
            vec![Scripted::ok(elink_xml(identifier, dependents))],
        )
    }

    /// Script a fetchable dependent (summary plus series text)
    pub(crate) fn dataset(&self, dependent: &str, series: &str) -> &Self {
        self.script(
            Endpoint::Summary,
            dependent,
            vec![Scripted::ok(esummary_xml(dependent, series))],
        );
        self.script(
            Endpoint::Series,
            &format!("GSE{series}"),
            vec![Scripted::ok(series_text(series))],
        )
    }

    /// Delay every reply for a key
    pub(crate) fn delay(&self, endpoint: Endpoint, id: &str, latency: Duration) -> &Self {
        self.latency
            .lock()
            .unwrap()
            .insert((endpoint, id.to_string()), latency);
        self
    }

    /// Number of GETs seen for a key
    pub(crate) fn calls(&self, endpoint: Endpoint, id: &str) -> u32 {
        self.calls
            .lock()
            .unwrap()
            .get(&(endpoint, id.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Every URL requested, in arrival order
    pub(crate) fn urls(&self) -> Vec<Url> {
        self.urls.lock().unwrap().clone()
    }

    /// Highest number of simultaneous in-flight GETs observed
    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn key_for(url: &Url) -> Key {
        let endpoint = match url.path() {
            "/elink.fcgi" => Endpoint::Link,
            "/esummary.fcgi" => Endpoint::Summary,
            _ => Endpoint::Series,
        };
        let param = if endpoint == Endpoint::Series { "acc" } else { "id" };
        let id = url
            .query_pairs()
            .find(|(name, _)| name == param)
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default();
        (endpoint, id)
    }

    fn next_outcome(&self, key: &Key) -> Option<Scripted> {
        let mut script = self.script.lock().unwrap();
        let queue = script.get_mut(key)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl LookupTransport for MockTransport {
    async fn get(&self, url: &Url) -> Result<HttpReply> {
        let key = Self::key_for(url);
        self.urls.lock().unwrap().push(url.clone());
        *self.calls.lock().unwrap().entry(key.clone()).or_default() += 1;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let latency = self.latency.lock().unwrap().get(&key).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.next_outcome(&key) {
            Some(Scripted::Reply(status, body)) => Ok(HttpReply::new(status, body)),
            Some(Scripted::Timeout) => Err(Error::Timeout {
                url: url.to_string(),
            }),
            Some(Scripted::Broken) => Err(Error::Other(format!("connection reset: {url}"))),
            None => Ok(HttpReply::new(404, "")),
        }
    }
}

/// Config pointed at the mock endpoints, with tiny delays
pub(crate) fn mock_config() -> Config {
    Config {
        endpoints: EndpointConfig::with_base(MOCK_BASE),
        retry: RetryConfig {
            rate_limit_delay: Duration::from_millis(1),
            ..RetryConfig::default()
        },
        ..Config::default()
    }
}

/// Retry policy that never actually sleeps
pub(crate) fn instant_retry(config: RetryConfig) -> RetryPolicy {
    RetryPolicy::with_sleep(config, |_| Box::pin(async {}))
}

pub(crate) fn elink_xml(identifier: &str, dependents: &[&str]) -> String {
    let links: String = dependents
        .iter()
        .map(|id| format!("<Link><Id>{id}</Id></Link>"))
        .collect();
    format!(
        "<?xml version=\"1.0\"?><eLinkResult><LinkSet><DbFrom>pubmed</DbFrom>\
         <IdList><Id>{identifier}</Id></IdList>\
         <LinkSetDb><DbTo>gds</DbTo><LinkName>pubmed_gds</LinkName>{links}</LinkSetDb>\
         </LinkSet></eLinkResult>"
    )
}

pub(crate) fn esummary_xml(dependent: &str, series: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?><eSummaryResult><DocSum><Id>{dependent}</Id>\
         <Item Name=\"title\" Type=\"String\">Title {dependent}</Item>\
         <Item Name=\"summary\" Type=\"String\">Summary {dependent}</Item>\
         <Item Name=\"GSE\" Type=\"String\">{series}</Item>\
         <Item Name=\"taxon\" Type=\"String\">Homo sapiens</Item>\
         <Item Name=\"gdsType\" Type=\"String\">Expression profiling by array</Item>\
         </DocSum></eSummaryResult>"
    )
}

pub(crate) fn series_text(series: &str) -> String {
    format!(
        "^SERIES = GSE{series}\n!Series_title = Series {series}\n\
         !Series_overall_design = Design of {series}.\n"
    )
}
