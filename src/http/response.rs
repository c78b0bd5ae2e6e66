//! Response shaping and error mapping.
//!
//! # Responsibilities
//! - Build document, resource and static asset responses with their headers
//! - Map per-request errors to status codes
//!
//! # Design Decisions
//! - Upstream and encoding failures → 500 with a generic body; the cause
//!   is logged, never sent to the client
//! - Unknown or unreadable static assets → 404
//! - Upstream status codes are passed through on success

use axum::{
    body::Body,
    http::{
        header::{ALLOW, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, SERVER},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use thiserror::Error;

use crate::assets::{AssetError, StaticAsset};
use crate::upstream::{FetchedResource, UpstreamError};

/// Everything that can fail while answering one request.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("failed to encode response: {0}")]
    Encoding(#[from] axum::http::Error),
}

impl MirrorError {
    pub fn status(&self) -> StatusCode {
        match self {
            MirrorError::Upstream(_) | MirrorError::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
            MirrorError::Asset(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for MirrorError {
    fn into_response(self) -> Response {
        let message = match &self {
            MirrorError::Upstream(_) => "Error fetching content",
            MirrorError::Asset(_) => "File not found",
            MirrorError::Encoding(_) => "Error writing response",
        };
        (self.status(), message).into_response()
    }
}

/// Rewritten document: upstream status and type, computed length, proxy identity.
pub fn document(
    resource: &FetchedResource,
    body: Bytes,
    server_name: &HeaderValue,
) -> Result<Response, MirrorError> {
    let mut builder = Response::builder()
        .status(resource.status)
        .header(CONTENT_LENGTH, body.len())
        .header(SERVER, server_name.clone());
    if let Some(content_type) = &resource.content_type {
        builder = builder.header(CONTENT_TYPE, content_type.as_str());
    }
    Ok(builder.body(Body::from(body))?)
}

/// Raw upstream resource with an already-resolved content type.
pub fn resource(resource: FetchedResource, content_type: &str) -> Result<Response, MirrorError> {
    Ok(Response::builder()
        .status(resource.status)
        .header(CONTENT_TYPE, content_type)
        .body(Body::from(resource.body))?)
}

/// Allow-listed static asset with long-lived caching.
pub fn static_asset(asset: StaticAsset, cache_control: &str) -> Result<Response, MirrorError> {
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, asset.descriptor.content_type)
        .header(CACHE_CONTROL, cache_control)
        .body(Body::from(asset.body))?)
}

pub fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(ALLOW, "GET, HEAD")],
        "Method not allowed",
    )
        .into_response()
}
