//! Request handling and parameter extraction.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4)
//! - Collect parameters from the query string and the body
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Query and body parameters merge into one map; body wins on conflict
//! - Form and JSON object bodies are understood; other bodies carry no params

use std::collections::BTreeMap;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, Request};
use serde_json::Value;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::http::response::GatewayError;

/// Header carrying the request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a UUID v4 for every request lacking an `x-request-id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The request ID set by the request ID layer, or "unknown".
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Parse a query string into a parameter map. Later keys win.
pub fn query_params(query: Option<&str>) -> BTreeMap<String, String> {
    query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default()
}

/// Read the body and merge its parameters over `params`.
pub async fn merge_body_params(
    headers: &HeaderMap,
    body: Body,
    limit: usize,
    params: &mut BTreeMap<String, String>,
) -> Result<(), GatewayError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .unwrap_or_default();

    let kind = match content_type.as_str() {
        "application/x-www-form-urlencoded" => BodyKind::Form,
        "application/json" => BodyKind::Json,
        _ => return Ok(()),
    };

    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| invalid_body(format!("cannot read body: {e}")))?;

    params.extend(body_params(kind, &bytes)?);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Form,
    Json,
}

fn body_params(kind: BodyKind, bytes: &Bytes) -> Result<BTreeMap<String, String>, GatewayError> {
    if bytes.is_empty() {
        return Ok(BTreeMap::new());
    }
    match kind {
        BodyKind::Form => Ok(url::form_urlencoded::parse(bytes).into_owned().collect()),
        BodyKind::Json => {
            let value: Value = serde_json::from_slice(bytes)
                .map_err(|e| invalid_body(format!("malformed JSON: {e}")))?;
            let Value::Object(map) = value else {
                return Err(invalid_body("JSON body must be an object"));
            };
            Ok(map
                .into_iter()
                .filter_map(|(key, value)| {
                    let value = match value {
                        Value::Null => return None,
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    Some((key, value))
                })
                .collect())
        }
    }
}

fn invalid_body(reason: impl Into<String>) -> GatewayError {
    GatewayError::InvalidParam {
        name: "body".to_string(),
        reason: reason.into(),
    }
}
