//! Mirror-local static assets.
//!
//! # Responsibilities
//! - Serve the stylesheet and script injected into every document
//! - Refuse every other name
//!
//! # Design Decisions
//! - Closed allow-list keyed by exact file name; the request path is never
//!   joined onto the filesystem, so traversal is impossible
//! - A file missing on disk is reported as not found, not as an I/O failure

use std::path::PathBuf;

use bytes::Bytes;
use thiserror::Error;

use crate::config::StaticAssetsConfig;

/// One allow-listed asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticAssetDescriptor {
    pub name: &'static str,
    pub content_type: &'static str,
}

/// Every name the mirror serves under `/static/`.
pub static ALLOWED_ASSETS: [StaticAssetDescriptor; 2] = [
    StaticAssetDescriptor {
        name: "custom.css",
        content_type: "text/css",
    },
    StaticAssetDescriptor {
        name: "custom.js",
        content_type: "application/javascript",
    },
];

/// Exact-name lookup in the allow-list.
pub fn lookup(name: &str) -> Option<&'static StaticAssetDescriptor> {
    ALLOWED_ASSETS.iter().find(|asset| asset.name == name)
}

/// Static asset failures; both surface as 404.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("unknown static asset '{0}'")]
    Unknown(String),

    #[error("static asset '{name}' could not be read: {source}")]
    Unreadable {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// A loaded asset ready to be written out.
#[derive(Debug, Clone)]
pub struct StaticAsset {
    pub descriptor: &'static StaticAssetDescriptor,
    pub body: Bytes,
}

/// Reads allow-listed assets from the configured directory.
#[derive(Debug, Clone)]
pub struct StaticAssets {
    dir: PathBuf,
    cache_control: String,
}

impl StaticAssets {
    pub fn new(config: &StaticAssetsConfig) -> Self {
        Self {
            dir: PathBuf::from(&config.dir),
            cache_control: format!("public, max-age={}", config.max_age_secs),
        }
    }

    /// `Cache-Control` value sent with every asset.
    pub fn cache_control(&self) -> &str {
        &self.cache_control
    }

    /// Load `name` if it is on the allow-list.
    pub async fn serve(&self, name: &str) -> Result<StaticAsset, AssetError> {
        let descriptor = lookup(name).ok_or_else(|| AssetError::Unknown(name.to_string()))?;

        let path = self.dir.join(descriptor.name);
        let body = tokio::fs::read(&path)
            .await
            .map_err(|source| AssetError::Unreadable {
                name: descriptor.name,
                source,
            })?;

        Ok(StaticAsset {
            descriptor,
            body: Bytes::from(body),
        })
    }
}
