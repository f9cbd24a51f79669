//! HTTP transport seam for lookups.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Raw reply from a single GET
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpReply {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl HttpReply {
    /// Reply with the given status and body
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Abstraction over a single outbound GET, enabling testability.
///
/// Implementations return `Error::Timeout` for transport timeouts so the retry
/// policy can tell them apart from permanent failures. Status codes are not
/// interpreted here.
#[async_trait]
pub trait LookupTransport: Send + Sync {
    /// Issue one GET request
    async fn get(&self, url: &Url) -> Result<HttpReply>;
}

/// Production [`LookupTransport`] backed by `reqwest`.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport whose requests time out after `timeout`
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("geo-harvest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LookupTransport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<HttpReply> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify(e, url))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| classify(e, url))?;

        Ok(HttpReply { status, body })
    }
}

/// Map a reqwest failure onto the crate taxonomy
///
/// The URL is dropped from the reqwest error since it may carry the API key.
fn classify(err: reqwest::Error, url: &Url) -> Error {
    if err.is_timeout() {
        Error::Timeout {
            url: url.to_string(),
        }
    } else {
        Error::Network(err.without_url())
    }
}
