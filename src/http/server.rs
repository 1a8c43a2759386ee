//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy and discovery handlers
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Dispatch requests to the routing table
//! - Forward matched requests to the resolved backend
//! - Drain in-flight requests on shutdown, within a grace period

use std::collections::BTreeMap;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{request::Parts, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::backend::BackendResolver;
use crate::config::Config;
use crate::http::forward::Forwarder;
use crate::http::request::{merge_body_params, query_params, request_id, UuidRequestId};
use crate::http::response::{GatewayError, MachineList};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::routing::RouteTable;
use crate::scanner::PortRegistry;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub resolver: Arc<dyn BackendResolver>,
    pub forwarder: Forwarder,
    pub registry: Arc<PortRegistry>,
    pub base_port: u16,
    pub max_body_bytes: usize,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: Arc<Config>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// `registry` backs the discovery endpoint and should be the sink the
    /// scanner publishes to.
    pub fn new(
        config: Arc<Config>,
        resolver: Arc<dyn BackendResolver>,
        registry: Arc<PortRegistry>,
    ) -> Self {
        let state = AppState {
            routes: Arc::new(RouteTable::from_config(&config.targets)),
            resolver,
            forwarder: Forwarder::new(Duration::from_secs(config.timeouts.backend_secs)),
            registry,
            base_port: config.base_port(),
            max_body_bytes: config.limits.max_body_bytes,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &Config, state: AppState) -> Router {
        let mut router = Router::new();
        if let Some(path) = &config.discovery_path {
            tracing::info!(path = %path, "Registered discovery endpoint");
            router = router.route(path, get(discovery_handler));
        }

        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(config.timeouts.request_secs),
            ));

        router
            .fallback(proxy_handler)
            .with_state(state)
            .layer(middleware)
    }

    /// The configured router, for driving the gateway without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain for at most the
    /// configured grace period.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Gateway starting");

        let grace = Duration::from_secs(self.config.timeouts.shutdown_grace_secs);
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.wait())
            .into_future();

        let deadline = {
            let signal = shutdown.wait();
            async move {
                signal.await;
                tracing::info!(grace = ?grace, "Draining in-flight requests");
                tokio::time::sleep(grace).await;
            }
        };

        tokio::select! {
            res = serve => res?,
            _ = deadline => {
                tracing::warn!("Grace period expired, dropping remaining requests");
            }
        }

        tracing::info!("Gateway stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Main proxy handler.
/// Collects params, matches the route, resolves the backend, and forwards.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let request_id = request_id(&parts.headers).to_string();
    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let response = match forward_request(&state, &parts, body).await {
        Ok((backend, response)) => {
            tracing::info!(
                request_id = %request_id,
                peer = %peer,
                method = %parts.method,
                path = %parts.uri.path(),
                backend = %backend,
                status = %response.status(),
                "Forwarded"
            );
            response
        }
        Err(e) => {
            match &e {
                GatewayError::BackendUnavailable { .. } => tracing::error!(
                    request_id = %request_id,
                    peer = %peer,
                    path = %parts.uri.path(),
                    error = %e,
                    "Backend unavailable"
                ),
                _ => tracing::warn!(
                    request_id = %request_id,
                    peer = %peer,
                    path = %parts.uri.path(),
                    error = %e,
                    "Request rejected"
                ),
            }
            e.into_response()
        }
    };

    metrics::record_request(parts.method.as_str(), response.status().as_u16(), start);
    response
}

async fn forward_request(
    state: &AppState,
    parts: &Parts,
    body: Body,
) -> Result<(SocketAddr, Response), GatewayError> {
    let path = parts.uri.path();

    let mut params: BTreeMap<String, String> = query_params(parts.uri.query());
    merge_body_params(&parts.headers, body, state.max_body_bytes, &mut params).await?;

    let routed = state.routes.route(path, &params)?;
    let backend = state.resolver.resolve(&routed)?;

    tracing::debug!(
        path = %path,
        backend = %backend,
        params = ?routed.params,
        "Proxying request"
    );

    let response = state
        .forwarder
        .forward(backend, &parts.method, routed.path(), &parts.headers, &routed.params)
        .await?;
    Ok((backend, response))
}

/// Lists running services as machine numbers relative to the base port.
async fn discovery_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(MachineList::from_open_ports(
        &state.registry.open_ports(),
        state.base_port,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StaticResolver;
    use crate::config::TargetRoute;
    use crate::scanner::{PortState, ScanResult, ScanSink};
    use std::time::SystemTime;
    use tower::ServiceExt;

    fn server(registry: Arc<PortRegistry>) -> HttpServer {
        let mut config = Config::new("127.0.0.1", 11000, 5600, 5605);
        config.targets.push(TargetRoute::new("/produce", ["machine_no"]));
        let resolver = Arc::new(StaticResolver::new("127.0.0.1:9".parse().unwrap()));
        HttpServer::new(Arc::new(config), resolver, registry)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn unknown_path_is_404_with_error_body() {
        let app = server(Arc::new(PortRegistry::new())).router();
        let response = app
            .oneshot(Request::get("/unknown").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key("x-request-id"));
        let body = body_json(response).await;
        assert!(body["error_msg"].as_str().unwrap().contains("/unknown"));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected_before_routing() {
        let app = server(Arc::new(PortRegistry::new())).router();
        let request = Request::post("/produce")
            .header("content-type", "application/x-www-form-urlencoded")
            .header("content-length", (2 * 1024 * 1024).to_string())
            .body(Body::from("machine_no=1"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn discovery_lists_open_machines() {
        let registry = Arc::new(PortRegistry::new());
        let ports = (5600..=5605)
            .map(|p| (p, if p == 5602 || p == 5604 { PortState::Open } else { PortState::Closed }))
            .collect();
        registry.on_scan_complete(ScanResult::new(0, SystemTime::now(), Duration::ZERO, ports));

        let app = server(registry).router();
        let response = app
            .oneshot(Request::get("/machine-list").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["cnt"], 2);
        assert_eq!(body["machine_list"], serde_json::json!([2, 4]));
    }
}
