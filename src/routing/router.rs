//! Per-request dispatch decision.

use axum::http::Method;
use thiserror::Error;

/// Paths served from the mirror's own asset allow-list.
pub const STATIC_PREFIX: &str = "/static/";

/// Paths proxied from the origin without rewriting.
pub const RESOURCE_PREFIX: &str = "/w/";

/// Where a request is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch<'a> {
    /// Mirror-local asset; carries the requested file name.
    StaticAsset(&'a str),
    /// Raw upstream passthrough.
    Resource,
    /// Upstream document run through the rewrite engine.
    Document,
}

impl Dispatch<'_> {
    /// Route label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Dispatch::StaticAsset(_) => "static",
            Dispatch::Resource => "resource",
            Dispatch::Document => "document",
        }
    }
}

/// Only read methods are served.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("method {0} not allowed")]
pub struct MethodNotAllowed(pub Method);

/// Decide how to handle a request.
pub fn dispatch<'a>(method: &Method, path: &'a str) -> Result<Dispatch<'a>, MethodNotAllowed> {
    if *method != Method::GET && *method != Method::HEAD {
        return Err(MethodNotAllowed(method.clone()));
    }

    if let Some(name) = path.strip_prefix(STATIC_PREFIX) {
        return Ok(Dispatch::StaticAsset(name));
    }
    if path.starts_with(RESOURCE_PREFIX) {
        return Ok(Dispatch::Resource);
    }
    Ok(Dispatch::Document)
}
