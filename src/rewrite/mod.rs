//! Rewrite rule engine.
//!
//! # Data Flow
//! ```text
//! (content bytes, content type)
//!     → content-type gate (non-HTML returned as-is, borrowed)
//!     → rules.rs (fixed ordered scan-and-replace passes)
//!     → inject.rs (mirror assets before the first </head>)
//!     → new byte buffer
//! ```
//!
//! # Design Decisions
//! - Byte-level pattern substitution, not an HTML parser; malformed markup
//!   is passed through on a best-effort basis
//! - Pure function of its inputs: no I/O, no shared state
//! - The input is never modified; a new buffer is produced when anything
//!   changes
//! - Only HTML reaches the rules, so the `url()`/`@import` rules fire on
//!   inline styles in documents and never on proxied stylesheets

pub mod inject;
pub mod rules;

use std::borrow::Cow;

use thiserror::Error;
use url::Url;

use crate::config::UpstreamConfig;
use inject::{head_block, inject_before_head_close};
use rules::{ordered_rules, Endpoints, RewriteRule};

pub use rules::{LinkAction, Target};

/// Errors building the engine from configuration.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("base URL '{0}' has no host")]
    MissingHost(String),

    #[error("failed to compile rewrite pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// In-progress buffer threaded through the rule sequence for one call.
struct RewriteContext<'a> {
    buffer: Cow<'a, [u8]>,
}

impl<'a> RewriteContext<'a> {
    fn apply(&mut self, rule: &RewriteRule, endpoints: &Endpoints) {
        let rewritten = match rule.apply(&self.buffer, endpoints) {
            Cow::Owned(next) => Some(next),
            Cow::Borrowed(_) => None,
        };
        if let Some(next) = rewritten {
            self.buffer = Cow::Owned(next);
        }
    }
}

/// Rewrites origin documents so navigation stays on the mirror.
#[derive(Debug, Clone)]
pub struct RewriteEngine {
    endpoints: Endpoints,
    rules: Vec<RewriteRule>,
    head_block: Vec<u8>,
}

impl RewriteEngine {
    /// Build an engine for the given origin and mirror base URLs.
    pub fn new(origin_base_url: &str, mirror_base_url: &str) -> Result<Self, RewriteError> {
        let (origin_base, origin_host) = split_base(origin_base_url)?;
        let (mirror_base, mirror_host) = split_base(mirror_base_url)?;
        let rules = ordered_rules(&origin_host)?;
        let head_block = head_block(&origin_base);

        Ok(Self {
            endpoints: Endpoints {
                origin_base,
                origin_host,
                mirror_base,
                mirror_host,
            },
            rules,
            head_block,
        })
    }

    pub fn from_config(config: &UpstreamConfig) -> Result<Self, RewriteError> {
        Self::new(&config.origin_base_url, &config.mirror_base_url)
    }

    /// Rewrite `content` if `content_type` declares an HTML document.
    ///
    /// Anything else is returned borrowed and byte-identical.
    pub fn rewrite<'a>(&self, content: &'a [u8], content_type: &str) -> Cow<'a, [u8]> {
        if !is_html(content_type) {
            return Cow::Borrowed(content);
        }

        let mut ctx = RewriteContext {
            buffer: Cow::Borrowed(content),
        };
        for rule in &self.rules {
            ctx.apply(rule, &self.endpoints);
        }

        inject_before_head_close(ctx.buffer, &self.head_block)
    }
}

fn is_html(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("text/html")
}

/// Normalized `scheme://host[:port]` base and its `host[:port]`.
fn split_base(raw: &str) -> Result<(String, String), RewriteError> {
    let url = Url::parse(raw).map_err(|source| RewriteError::InvalidBaseUrl {
        url: raw.to_string(),
        source,
    })?;
    let host = url
        .host_str()
        .ok_or_else(|| RewriteError::MissingHost(raw.to_string()))?;
    let authority = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    let base = format!("{}://{}", url.scheme(), authority);
    Ok((base, authority))
}
