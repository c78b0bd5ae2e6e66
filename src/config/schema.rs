//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the mirror.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the mirroring proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MirrorConfig {
    /// Listener configuration (bind address, server identity).
    pub listener: ListenerConfig,

    /// Origin and mirror endpoints.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Mirror-local static assets.
    pub static_assets: StaticAssetsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8989").
    pub bind_address: String,

    /// Value of the `Server` header on rewritten document responses.
    pub server_name: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8989".to_string(),
            server_name: "WikiProxy/1.0".to_string(),
        }
    }
}

/// The canonical origin being mirrored and the domain links are rewritten to.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL every upstream fetch is issued against.
    pub origin_base_url: String,

    /// Base URL navigational links are rewritten to.
    pub mirror_base_url: String,

    /// `User-Agent` sent with every upstream request.
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            origin_base_url: "https://wikipedia.org".to_string(),
            mirror_base_url: "https://m-wikipedia.org".to_string(),
            user_agent: "Mozilla/5.0 WikiProxy/1.0".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Client-wide upstream fetch timeout in seconds (connect + body).
    pub upstream_secs: u64,

    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Total time budget for one inbound request in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            upstream_secs: 30,
            connect_secs: 5,
            request_secs: 60,
        }
    }
}

/// Where the allow-listed mirror assets live on disk.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticAssetsConfig {
    /// Directory holding `custom.css` and `custom.js`.
    pub dir: String,

    /// `max-age` for the `Cache-Control` header on asset responses.
    pub max_age_secs: u64,
}

impl Default for StaticAssetsConfig {
    fn default() -> Self {
        Self {
            dir: "./static".to_string(),
            max_age_secs: 86_400,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
