//! Upstream forwarding.
//!
//! # Responsibilities
//! - Build the outbound request from the filtered parameters
//! - Send it to the resolved backend with a bounded timeout
//! - Relay the backend response unchanged
//!
//! # Design Decisions
//! - One attempt per request; retry policy belongs to the caller
//! - Params travel in the query for bodyless methods, as a form otherwise
//! - Hop-by-hop and body framing headers are not copied upstream

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, Uri};
use axum::response::Response;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use tokio::time;

use crate::http::request::X_REQUEST_ID;
use crate::http::response::GatewayError;

const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// HTTP client forwarding matched requests to backends.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
}

impl Forwarder {
    pub fn new(timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeout));
        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { client, timeout }
    }

    /// Forward `params` to `backend` and relay its response.
    pub async fn forward(
        &self,
        backend: SocketAddr,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        params: &BTreeMap<String, String>,
    ) -> Result<Response, GatewayError> {
        let request = build_request(backend, method, path, headers, params)?;

        match time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) => {
                let (parts, body) = response.into_parts();
                Ok(Response::from_parts(parts, Body::new(body)))
            }
            Ok(Err(e)) => Err(GatewayError::backend_unavailable(format!(
                "request to {backend} failed: {e}"
            ))),
            Err(_) => Err(GatewayError::backend_unavailable(format!(
                "{backend} did not answer within {:?}",
                self.timeout
            ))),
        }
    }
}

/// Whether the method carries its params in the query string.
fn params_in_query(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::DELETE | Method::OPTIONS
    )
}

fn encode(params: &BTreeMap<String, String>) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish()
}

/// Build the outbound request for `backend`.
pub fn build_request(
    backend: SocketAddr,
    method: &Method,
    path: &str,
    headers: &HeaderMap,
    params: &BTreeMap<String, String>,
) -> Result<Request<Body>, GatewayError> {
    let encoded = encode(params);
    let in_query = params_in_query(method);

    let uri = if in_query && !encoded.is_empty() {
        format!("http://{backend}{path}?{encoded}")
    } else {
        format!("http://{backend}{path}")
    };
    let uri: Uri = uri
        .parse()
        .map_err(|e| GatewayError::backend_unavailable(format!("invalid upstream uri: {e}")))?;

    let mut builder = Request::builder().method(method.clone()).uri(uri);
    if let Some(out) = builder.headers_mut() {
        for (name, value) in headers {
            if skip_header(name) {
                continue;
            }
            out.append(name.clone(), value.clone());
        }
        if let Some(id) = headers.get(X_REQUEST_ID) {
            out.insert(X_REQUEST_ID, id.clone());
        }
        if !in_query {
            out.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            );
        }
    }

    let body = if in_query { Body::empty() } else { Body::from(encoded) };
    builder
        .body(body)
        .map_err(|e| GatewayError::backend_unavailable(format!("cannot build request: {e}")))
}

fn skip_header(name: &HeaderName) -> bool {
    *name == header::HOST
        || *name == header::CONTENT_LENGTH
        || *name == header::CONTENT_TYPE
        || HOP_BY_HOP.contains(&name.as_str())
}
