//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and base URLs
//! - Validate value ranges (timeouts > 0, request budget above fetch timeout)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MirrorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::MirrorConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: '{value}' is not an absolute http(s) URL with a host")]
    InvalidBaseUrl { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("timeouts.request_secs ({request_secs}) must exceed timeouts.upstream_secs ({upstream_secs})")]
    RequestBudgetTooSmall { request_secs: u64, upstream_secs: u64 },

    #[error("listener.server_name must not be empty")]
    EmptyServerName,
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &MirrorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    check_base_url(&mut errors, "upstream.origin_base_url", &config.upstream.origin_base_url);
    check_base_url(&mut errors, "upstream.mirror_base_url", &config.upstream.mirror_base_url);

    if config.listener.server_name.trim().is_empty() {
        errors.push(ValidationError::EmptyServerName);
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("timeouts.upstream_secs", timeouts.upstream_secs),
        ("timeouts.connect_secs", timeouts.connect_secs),
        ("timeouts.request_secs", timeouts.request_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout { field });
        }
    }
    if timeouts.request_secs != 0 && timeouts.request_secs <= timeouts.upstream_secs {
        errors.push(ValidationError::RequestBudgetTooSmall {
            request_secs: timeouts.request_secs,
            upstream_secs: timeouts.upstream_secs,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_base_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let valid = Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false);
    if !valid {
        errors.push(ValidationError::InvalidBaseUrl {
            field,
            value: value.to_string(),
        });
    }
}
