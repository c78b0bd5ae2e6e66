//! Upstream subsystem.
//!
//! # Data Flow
//! ```text
//! request path (+ query)
//!     → fetcher.rs (origin base + path, timing, logging)
//!     → transport.rs (shared client, headers, timeout)
//!     → FetchedResource { status, content_type, body } | UpstreamError
//! ```
//!
//! # Design Decisions
//! - Body is drained fully before returning; payloads are page-sized
//! - The fetch is the only suspension point of a request and is bounded
//!   by the client timeout
//! - No retries, no caching, no cross-request state

pub mod fetcher;
pub mod transport;
pub mod types;

pub use fetcher::UpstreamFetcher;
pub use transport::{HttpTransport, Transport};
pub use types::{BoxError, FetchedResource, UpstreamError, UpstreamResult};
