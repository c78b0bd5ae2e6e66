//! Outbound HTTP transport.
//!
//! # Responsibilities
//! - Issue a single GET to a fully-formed origin URL
//! - Send the identifying `User-Agent` and `Accept: */*`
//! - Enforce the client-wide timeout and map failures to `UpstreamError`
//!
//! # Design Decisions
//! - One `reqwest::Client` built at startup and shared by every request;
//!   it holds no per-request state, so no locking is needed
//! - No retries and no caching: a failed fetch is returned as-is
//! - `Transport` is object-safe so tests can swap in a stub

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::upstream::types::{FetchedResource, UpstreamError, UpstreamResult};

/// Something that can GET a URL and drain the full response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> UpstreamResult<FetchedResource>;
}

/// Production transport backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    user_agent: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Build the shared client from configuration.
    pub fn new(upstream: &UpstreamConfig, timeouts: &TimeoutConfig) -> UpstreamResult<Self> {
        let timeout = Duration::from_secs(timeouts.upstream_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| UpstreamError::Client(Box::new(e)))?;

        Ok(Self {
            client,
            user_agent: upstream.user_agent.clone(),
            timeout,
        })
    }

    fn classify(&self, url: &str, err: reqwest::Error, reading: bool) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout {
                url: url.to_string(),
                after_secs: self.timeout.as_secs(),
            }
        } else if err.is_builder() {
            UpstreamError::RequestConstruction {
                url: url.to_string(),
                reason: err.to_string(),
            }
        } else if reading {
            UpstreamError::Read {
                url: url.to_string(),
                source: Box::new(err),
            }
        } else {
            UpstreamError::Fetch {
                url: url.to_string(),
                source: Box::new(err),
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> UpstreamResult<FetchedResource> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, self.user_agent.as_str())
            .header(ACCEPT, "*/*")
            .send()
            .await
            .map_err(|e| self.classify(url, e, false))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_owned);

        let body = response
            .bytes()
            .await
            .map_err(|e| self.classify(url, e, true))?;

        Ok(FetchedResource {
            status,
            content_type,
            body,
        })
    }
}
