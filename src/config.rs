//! Configuration types for geo-harvest

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default ELink endpoint (PubMed → GEO DataSets links)
pub const DEFAULT_LINK_URL: &str =
    "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/elink.fcgi?dbfrom=pubmed&db=gds";

/// Default ESummary endpoint for GEO DataSets
pub const DEFAULT_SUMMARY_URL: &str =
    "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esummary.fcgi?db=gds";

/// Default GEO accession text endpoint (series SOFT header)
pub const DEFAULT_SERIES_TEXT_URL: &str =
    "https://www.ncbi.nlm.nih.gov/geo/query/acc.cgi?targ=self&form=text&view=brief";

/// Remote endpoint base URLs
///
/// Each base URL may already carry query parameters; lookup parameters are
/// appended to them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Resolve endpoint: Identifier → DependentIDs (`&id=<identifier>` is appended)
    #[serde(default = "default_link_url")]
    pub link_url: String,

    /// Detail endpoint: DependentID → summary XML (`&id=<dependent id>` is appended)
    #[serde(default = "default_summary_url")]
    pub summary_url: String,

    /// Supplementary plain-text endpoint (`&acc=<accession>` is appended)
    #[serde(default = "default_series_text_url")]
    pub series_text_url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            link_url: default_link_url(),
            summary_url: default_summary_url(),
            series_text_url: default_series_text_url(),
        }
    }
}

impl EndpointConfig {
    /// Point every endpoint at the same host, keeping the default paths and queries.
    ///
    /// Used to redirect the harvester to a mirror or a local mock server.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            link_url: format!("{base}/elink.fcgi?dbfrom=pubmed&db=gds"),
            summary_url: format!("{base}/esummary.fcgi?db=gds"),
            series_text_url: format!("{base}/acc.cgi?targ=self&form=text&view=brief"),
        }
    }
}

/// Retry configuration for rate-limited and timed-out lookups
///
/// The defaults reproduce the baseline behavior: a fixed one second wait after
/// every HTTP 429, no growth, no cap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Delay after a rate-limit response, in milliseconds when serialized (default: 1000)
    #[serde(default = "default_rate_limit_delay", with = "millis_serde")]
    pub rate_limit_delay: Duration,

    /// Maximum number of attempts per lookup (default: None = unbounded)
    #[serde(default)]
    pub max_attempts: Option<u32>,

    /// Multiplier applied to the delay after each rate-limit response (default: 1.0 = fixed)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Upper bound for the grown delay, in milliseconds when serialized (default: 60000)
    #[serde(default = "default_max_delay", with = "millis_serde")]
    pub max_delay: Duration,

    /// Add random jitter to rate-limit delays (default: false)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            rate_limit_delay: default_rate_limit_delay(),
            max_attempts: None,
            backoff_multiplier: default_backoff_multiplier(),
            max_delay: default_max_delay(),
            jitter: false,
        }
    }
}

/// Main configuration for [`Harvester`](crate::Harvester)
///
/// `Debug` output masks the API key.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Remote endpoints
    #[serde(default)]
    pub endpoints: EndpointConfig,

    /// Optional API key appended to every E-utilities request
    #[serde(default)]
    pub api_key: Option<String>,

    /// Query parameter name carrying the API key (default: "key")
    #[serde(default = "default_api_key_param")]
    pub api_key_param: String,

    /// Number of Identifier workers running at once (default: 4)
    #[serde(default = "default_max_concurrent_workers")]
    pub max_concurrent_workers: usize,

    /// Per-request transport timeout in seconds (default: 30)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Optional wall-clock budget for a single Identifier worker, in seconds
    #[serde(default, with = "optional_duration_serde")]
    pub worker_deadline: Option<Duration>,

    /// Retry behavior
    #[serde(default)]
    pub retry: RetryConfig,

    /// Capacity of the event broadcast channel (default: 1024)
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoints: EndpointConfig::default(),
            api_key: None,
            api_key_param: default_api_key_param(),
            max_concurrent_workers: default_max_concurrent_workers(),
            request_timeout: default_request_timeout(),
            worker_deadline: None,
            retry: RetryConfig::default(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("endpoints", &self.endpoints)
            .field("api_key", &self.api_key.as_ref().map(|_| "REDACTED"))
            .field("api_key_param", &self.api_key_param)
            .field("max_concurrent_workers", &self.max_concurrent_workers)
            .field("request_timeout", &self.request_timeout)
            .field("worker_deadline", &self.worker_deadline)
            .field("retry", &self.retry)
            .field("event_capacity", &self.event_capacity)
            .finish()
    }
}

impl Config {
    /// Load a configuration from a JSON file
    ///
    /// Missing fields take their defaults. The loaded config is validated.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that would make a run impossible or meaningless
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_workers == 0 {
            return Err(Error::config(
                "max_concurrent_workers",
                "max_concurrent_workers must be at least 1",
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::config(
                "request_timeout",
                "request_timeout must be non-zero",
            ));
        }
        if self.event_capacity == 0 {
            return Err(Error::config(
                "event_capacity",
                "event_capacity must be at least 1",
            ));
        }
        let multiplier = self.retry.backoff_multiplier;
        if multiplier.is_nan() || multiplier < 1.0 {
            return Err(Error::config(
                "retry.backoff_multiplier",
                format!(
                    "backoff_multiplier must be >= 1.0, got {}",
                    self.retry.backoff_multiplier
                ),
            ));
        }
        if self.retry.rate_limit_delay > self.retry.max_delay {
            return Err(Error::config(
                "retry.rate_limit_delay",
                format!(
                    "rate_limit_delay ({:?}) must not exceed max_delay ({:?})",
                    self.retry.rate_limit_delay, self.retry.max_delay
                ),
            ));
        }
        if self.retry.max_attempts == Some(0) {
            return Err(Error::config(
                "retry.max_attempts",
                "max_attempts must be at least 1 when set",
            ));
        }
        if self.api_key_param.trim().is_empty() {
            return Err(Error::config(
                "api_key_param",
                "api_key_param must not be empty",
            ));
        }
        for (key, value) in [
            ("endpoints.link_url", &self.endpoints.link_url),
            ("endpoints.summary_url", &self.endpoints.summary_url),
            ("endpoints.series_text_url", &self.endpoints.series_text_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| Error::config(key, format!("invalid URL '{value}': {e}")))?;
        }
        Ok(())
    }
}

fn default_link_url() -> String {
    DEFAULT_LINK_URL.to_string()
}

fn default_summary_url() -> String {
    DEFAULT_SUMMARY_URL.to_string()
}

fn default_series_text_url() -> String {
    DEFAULT_SERIES_TEXT_URL.to_string()
}

fn default_api_key_param() -> String {
    "key".to_string()
}

fn default_max_concurrent_workers() -> usize {
    4
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_event_capacity() -> usize {
    1024
}

fn default_rate_limit_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_backoff_multiplier() -> f64 {
    1.0
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

// Duration serialization helper (integer seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper (integer seconds)
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

// Duration serialization helper (integer milliseconds)
mod millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
