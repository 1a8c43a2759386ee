//! Response handling and error mapping.
//!
//! # Responsibilities
//! - Map gateway errors to HTTP status codes
//! - Render errors as `{"error_msg": "..."}`
//! - Render the service discovery listing
//!
//! # Design Decisions
//! - Unmatched path → 404, bad selector → 400, backend failure → 502
//! - Backend responses are relayed as-is; only gateway errors are rendered here

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Per-request gateway failures.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No configured target matches the request path.
    #[error("no route for {path}")]
    NotFound { path: String },

    /// The resolved backend could not be reached or did not answer in time.
    #[error("backend unavailable: {reason}")]
    BackendUnavailable { reason: String },

    /// A parameter needed to resolve the backend is missing or malformed.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParam { name: String, reason: String },
}

impl GatewayError {
    pub fn backend_unavailable(reason: impl Into<String>) -> Self {
        GatewayError::BackendUnavailable {
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::NotFound { .. } => StatusCode::NOT_FOUND,
            GatewayError::BackendUnavailable { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::InvalidParam { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error_msg: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error_msg: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Service discovery listing.
#[derive(Debug, Serialize)]
pub struct MachineList {
    pub cnt: usize,
    pub machine_list: Vec<u16>,
}

impl MachineList {
    /// Translate open ports into machine numbers relative to `base_port`.
    pub fn from_open_ports(open_ports: &[u16], base_port: u16) -> Self {
        let machine_list: Vec<u16> = open_ports
            .iter()
            .filter_map(|port| port.checked_sub(base_port))
            .collect();
        Self {
            cnt: machine_list.len(),
            machine_list,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_codes() {
        assert_eq!(
            GatewayError::NotFound { path: "/x".into() }.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GatewayError::backend_unavailable("refused").status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            GatewayError::InvalidParam {
                name: "machine_no".into(),
                reason: "missing".into()
            }
            .status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn machine_list_is_relative_to_base() {
        let list = MachineList::from_open_ports(&[5600, 5603, 5610], 5600);
        assert_eq!(list.cnt, 3);
        assert_eq!(list.machine_list, vec![0, 3, 10]);
    }

    #[test]
    fn ports_below_base_are_skipped() {
        let list = MachineList::from_open_ports(&[80, 5601], 5600);
        assert_eq!(list.machine_list, vec![1]);
        assert_eq!(list.cnt, 1);
    }
}
