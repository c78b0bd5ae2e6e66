//! Wikipedia mirroring reverse proxy.
//!
//! Fetches documents and assets from a fixed origin, rewrites navigational
//! links in HTML so they point at the mirror domain while resource loads
//! stay on the origin, and injects mirror-specific assets into every page.

// Core subsystems
pub mod config;
pub mod http;
pub mod rewrite;
pub mod routing;
pub mod upstream;

// Mirror-local content
pub mod assets;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::MirrorConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use rewrite::RewriteEngine;
pub use upstream::{FetchedResource, UpstreamFetcher};
