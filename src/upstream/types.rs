//! Fetched payloads and upstream error definitions.

use axum::http::StatusCode;
use bytes::Bytes;
use thiserror::Error;

/// Boxed transport-level cause carried by fetch errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A fully drained upstream response.
///
/// Immutable once returned; the rewrite engine produces new buffers instead
/// of touching `body`, so the raw payload stays available to the caller.
#[derive(Debug, Clone)]
pub struct FetchedResource {
    /// Status the origin answered with.
    pub status: StatusCode,
    /// Declared `Content-Type`, if the origin sent one.
    pub content_type: Option<String>,
    /// Entire response body.
    pub body: Bytes,
}

impl FetchedResource {
    /// The declared content type, or empty when absent.
    pub fn content_type(&self) -> &str {
        self.content_type.as_deref().unwrap_or_default()
    }
}

/// Errors that can occur while fetching from the origin.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The outbound request could not be built (bad URL or header).
    #[error("error creating request for {url}: {reason}")]
    RequestConstruction { url: String, reason: String },

    /// The fetch exceeded the client-wide timeout.
    #[error("upstream request to {url} timed out after {after_secs}s")]
    Timeout { url: String, after_secs: u64 },

    /// Connection or protocol failure before a response arrived.
    #[error("error fetching {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: BoxError,
    },

    /// The response body could not be drained.
    #[error("error reading response from {url}: {source}")]
    Read {
        url: String,
        #[source]
        source: BoxError,
    },

    /// The shared HTTP client could not be constructed.
    #[error("failed to build upstream client: {0}")]
    Client(#[source] BoxError),
}

impl UpstreamError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::RequestConstruction { .. } => "request_construction",
            UpstreamError::Timeout { .. } => "timeout",
            UpstreamError::Fetch { .. } => "fetch",
            UpstreamError::Read { .. } => "read",
            UpstreamError::Client(_) => "client",
        }
    }
}

/// Result type for upstream operations.
pub type UpstreamResult<T> = Result<T, UpstreamError>;
