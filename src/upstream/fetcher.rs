//! Upstream fetcher: origin base + path → drained resource.

use std::sync::Arc;
use std::time::Instant;

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::observability::metrics;
use crate::upstream::transport::{HttpTransport, Transport};
use crate::upstream::types::{FetchedResource, UpstreamResult};

/// Fetches paths from the configured origin.
#[derive(Clone)]
pub struct UpstreamFetcher {
    origin_base: String,
    transport: Arc<dyn Transport>,
}

impl UpstreamFetcher {
    /// Create a fetcher over an explicit transport.
    pub fn new(origin_base: &str, transport: Arc<dyn Transport>) -> Self {
        Self {
            origin_base: origin_base.trim_end_matches('/').to_string(),
            transport,
        }
    }

    /// Create a fetcher backed by the shared HTTP client.
    pub fn from_config(upstream: &UpstreamConfig, timeouts: &TimeoutConfig) -> UpstreamResult<Self> {
        let transport = HttpTransport::new(upstream, timeouts)?;
        Ok(Self::new(&upstream.origin_base_url, Arc::new(transport)))
    }

    /// Absolute origin URL for a path (query string included).
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.origin_base, path)
    }

    /// Fetch `path` from the origin, reading the whole body.
    pub async fn fetch(&self, path: &str) -> UpstreamResult<FetchedResource> {
        let url = self.url_for(path);
        let start = Instant::now();

        let result = self.transport.get(&url).await;
        match &result {
            Ok(resource) => {
                tracing::debug!(
                    url = %url,
                    status = %resource.status,
                    content_type = resource.content_type(),
                    bytes = resource.body.len(),
                    "Fetched upstream resource"
                );
                metrics::record_upstream_fetch("ok", start);
            }
            Err(e) => {
                tracing::warn!(url = %url, kind = e.kind(), error = %e, "Upstream fetch failed");
                metrics::record_upstream_fetch(e.kind(), start);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::types::UpstreamError;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use bytes::Bytes;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        seen: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn get(&self, url: &str) -> UpstreamResult<FetchedResource> {
            self.seen.lock().unwrap().push(url.to_string());
            if self.fail {
                return Err(UpstreamError::Timeout {
                    url: url.to_string(),
                    after_secs: 30,
                });
            }
            Ok(FetchedResource {
                status: StatusCode::OK,
                content_type: Some("text/html".into()),
                body: Bytes::from_static(b"<html></html>"),
            })
        }
    }

    #[test]
    fn test_url_for_joins_without_double_slash() {
        let fetcher = UpstreamFetcher::new("https://wikipedia.org/", Arc::new(RecordingTransport::default()));
        assert_eq!(fetcher.url_for("/wiki/Cat"), "https://wikipedia.org/wiki/Cat");
        assert_eq!(
            fetcher.url_for("/w/index.php?title=Cat&action=raw"),
            "https://wikipedia.org/w/index.php?title=Cat&action=raw"
        );
    }

    #[tokio::test]
    async fn test_fetch_issues_one_request_to_origin() {
        let transport = Arc::new(RecordingTransport::default());
        let fetcher = UpstreamFetcher::new("https://wikipedia.org", transport.clone());

        let resource = fetcher.fetch("/wiki/Go").await.unwrap();
        assert_eq!(resource.content_type(), "text/html");
        assert_eq!(
            *transport.seen.lock().unwrap(),
            vec!["https://wikipedia.org/wiki/Go".to_string()]
        );
    }

    #[tokio::test]
    async fn test_failure_is_surfaced_without_retry() {
        let transport = Arc::new(RecordingTransport {
            fail: true,
            ..Default::default()
        });
        let fetcher = UpstreamFetcher::new("https://wikipedia.org", transport.clone());

        let err = fetcher.fetch("/wiki/Slow").await.unwrap_err();
        assert_eq!(err.kind(), "timeout");
        assert_eq!(transport.seen.lock().unwrap().len(), 1);
    }
}
