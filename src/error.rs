//! Error types for geo-harvest
//!
//! This module provides the error taxonomy for the harvesting core:
//! - Transport-level failures (rate limiting, timeouts, HTTP status, network)
//! - Response-level failures (malformed XML, missing fields)
//! - Local failures (configuration, I/O, serialization)
//!
//! Every error carries a machine-readable code (see [`Error::error_code`]) which
//! is what gets attached to `LookupFailed` and `RecordDropped` events.

use thiserror::Error;

/// Result type alias for geo-harvest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for geo-harvest
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_concurrent_workers")
        key: Option<String>,
    },

    /// Remote service answered HTTP 429
    #[error("rate limited by {url}")]
    RateLimited {
        /// Request URL (API key included only if it was part of the request)
        url: String,
    },

    /// Transport-level timeout
    #[error("request to {url} timed out")]
    Timeout {
        /// Request URL
        url: String,
    },

    /// Remote service answered with a non-success status other than 429
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// Request URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Malformed XML in a remote response
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A required field was absent from a detail response
    #[error("field '{field}' missing from record {dependent_id}")]
    FieldMissing {
        /// Dependent ID whose detail response was incomplete
        dependent_id: String,
        /// Name of the missing `Item`
        field: &'static str,
    },

    /// Invalid URL (base URL from configuration)
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Operation not supported (analysis backend unavailable, etc.)
    #[error("not supported: {0}")]
    NotSupported(String),

    /// The run or the worker was cancelled
    #[error("cancelled")]
    Cancelled,

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::RateLimited { .. } => "rate_limited",
            Error::Timeout { .. } => "timeout",
            Error::HttpStatus { .. } => "http_status",
            Error::Network(_) => "network_error",
            Error::Xml(_) => "xml_error",
            Error::FieldMissing { .. } => "field_missing",
            Error::InvalidUrl(_) => "invalid_url",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::NotSupported(_) => "not_supported",
            Error::Cancelled => "cancelled",
            Error::Other(_) => "internal_error",
        }
    }

    /// Shorthand for a configuration error tied to a key
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}
