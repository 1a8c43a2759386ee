//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (interval > 0, ports valid, scan range ordered)
//! - Detect ambiguous routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Config → Result<(), Vec<ValidationError>>
//! - Duplicate target paths are not an error; first match wins at runtime

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

use crate::config::schema::{BackendConfig, Config};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("host must not be empty")]
    EmptyHost,

    #[error("host[{0}] is not a valid IP address")]
    InvalidHost(String),

    #[error("port must be in 1..=65535")]
    ZeroPort,

    #[error("scan_end[{end}] < scan_begin[{begin}]")]
    ScanRangeInverted { begin: u16, end: u16 },

    #[error("scan_interval must be greater than 0")]
    ZeroInterval,

    #[error("probe.host[{0}] is not a valid IP address")]
    InvalidProbeHost(String),

    #[error("probe.timeout_ms must be greater than 0")]
    ZeroProbeTimeout,

    #[error("probe.max_concurrency must be greater than 0")]
    ZeroConcurrency,

    #[error("timeouts.backend_secs must be greater than 0")]
    ZeroBackendTimeout,

    #[error("timeouts.backend_secs[{backend}] must be below timeouts.request_secs[{request}]")]
    BackendTimeoutNotBelowRequest { backend: u64, request: u64 },

    #[error("target[{0}] must start with '/'")]
    InvalidTargetPath(String),

    #[error("target[{target}] has an empty parameter name")]
    EmptyParam { target: String },

    #[error("target[{target}] must forward the backend selector param[{param}]")]
    MissingSelectorParam { target: String, param: String },

    #[error("backend address[{0}] is not a socket address")]
    InvalidBackendAddress(String),

    #[error("backend host[{0}] is not a valid IP address")]
    InvalidBackendHost(String),

    #[error("discovery_path[{0}] must start with '/' and contain no '{{', '}}' or '*'")]
    InvalidDiscoveryPath(String),

    #[error("discovery_path[{0}] collides with a target path")]
    DiscoveryPathCollision(String),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.host.is_empty() {
        errors.push(ValidationError::EmptyHost);
    } else if config.host.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidHost(config.host.clone()));
    }

    if config.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }

    if config.scan_begin > config.scan_end {
        errors.push(ValidationError::ScanRangeInverted {
            begin: config.scan_begin,
            end: config.scan_end,
        });
    }

    if config.scan_interval == 0 {
        errors.push(ValidationError::ZeroInterval);
    }
    if config.probe.host.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidProbeHost(config.probe.host.clone()));
    }
    if config.probe.timeout_ms == 0 {
        errors.push(ValidationError::ZeroProbeTimeout);
    }
    if config.probe.max_concurrency == 0 {
        errors.push(ValidationError::ZeroConcurrency);
    }
    if config.timeouts.backend_secs == 0 {
        errors.push(ValidationError::ZeroBackendTimeout);
    } else if config.timeouts.backend_secs >= config.timeouts.request_secs {
        errors.push(ValidationError::BackendTimeoutNotBelowRequest {
            backend: config.timeouts.backend_secs,
            request: config.timeouts.request_secs,
        });
    }

    let selector = match &config.backend {
        BackendConfig::Scanned { selector_param, .. } => Some(selector_param.as_str()),
        BackendConfig::Static { .. } => None,
    };

    let mut seen = HashSet::new();
    for target in &config.targets {
        if !target.path.starts_with('/') {
            errors.push(ValidationError::InvalidTargetPath(target.path.clone()));
        }
        if target.params.iter().any(|p| p.is_empty()) {
            errors.push(ValidationError::EmptyParam {
                target: target.path.clone(),
            });
        }
        if let Some(param) = selector {
            if !target.params.contains(param) {
                errors.push(ValidationError::MissingSelectorParam {
                    target: target.path.clone(),
                    param: param.to_string(),
                });
            }
        }
        if !seen.insert(target.path.as_str()) {
            tracing::warn!(
                path = %target.path,
                "Duplicate target path, only the first entry will match"
            );
        }
    }

    match &config.backend {
        BackendConfig::Static { address } => {
            if address.parse::<SocketAddr>().is_err() {
                errors.push(ValidationError::InvalidBackendAddress(address.clone()));
            }
        }
        BackendConfig::Scanned { host, .. } => {
            if host.parse::<IpAddr>().is_err() {
                errors.push(ValidationError::InvalidBackendHost(host.clone()));
            }
        }
    }

    if let Some(path) = &config.discovery_path {
        if !path.starts_with('/') || path.contains(['{', '}', '*']) {
            errors.push(ValidationError::InvalidDiscoveryPath(path.clone()));
        } else if seen.contains(path.as_str()) {
            errors.push(ValidationError::DiscoveryPathCollision(path.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
