//! End-to-end tests for the gateway over real sockets.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use axum::http::StatusCode;
use port_gateway::backend::{ScanResolver, StaticResolver};
use port_gateway::config::{Config, TargetRoute};
use port_gateway::scanner::{PortRegistry, PortState, ScanResult, ScanSink};

mod common;
use common::TestGateway;

fn produce_config() -> Config {
    let mut config = Config::new("127.0.0.1", 0, 5600, 5610);
    config
        .targets
        .push(TargetRoute::new("/produce", ["machine_no", "shift"]));
    config.timeouts.shutdown_grace_secs = 2;
    config
}

async fn static_gateway(config: Config, backend: SocketAddr) -> TestGateway {
    TestGateway::start(
        config,
        Arc::new(StaticResolver::new(backend)),
        Arc::new(PortRegistry::new()),
    )
    .await
}

fn publish(registry: &PortRegistry, open: &[u16], range: std::ops::RangeInclusive<u16>) {
    let ports: BTreeMap<u16, PortState> = range
        .map(|p| {
            let state = if open.contains(&p) {
                PortState::Open
            } else {
                PortState::Closed
            };
            (p, state)
        })
        .collect();
    registry.on_scan_complete(ScanResult::new(0, SystemTime::now(), Duration::ZERO, ports));
}

#[tokio::test]
async fn forwards_only_whitelisted_params() {
    let backend = common::start_echo_backend().await;
    let gateway = static_gateway(produce_config(), backend).await;

    let response = common::client()
        .get(gateway.url("/produce?machine_no=3&shift=A&extra=1"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let echoed: serde_json::Value = response.json().await.unwrap();
    assert_eq!(echoed["method"], "GET");
    assert_eq!(echoed["target"], "/produce?machine_no=3&shift=A");

    gateway.stop().await;
}

#[tokio::test]
async fn post_params_travel_as_form_body() {
    let backend = common::start_echo_backend().await;
    let gateway = static_gateway(produce_config(), backend).await;

    let response = common::client()
        .post(gateway.url("/produce"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("machine_no=7&debug=true")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let echoed: serde_json::Value = response.json().await.unwrap();
    assert_eq!(echoed["method"], "POST");
    assert_eq!(echoed["target"], "/produce");
    assert_eq!(echoed["body"], "machine_no=7");

    gateway.stop().await;
}

#[tokio::test]
async fn json_body_params_are_filtered_too() {
    let backend = common::start_echo_backend().await;
    let gateway = static_gateway(produce_config(), backend).await;

    let response = common::client()
        .post(gateway.url("/produce?shift=B"))
        .json(&serde_json::json!({ "machine_no": 2, "secret": "x" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let echoed: serde_json::Value = response.json().await.unwrap();
    assert_eq!(echoed["body"], "machine_no=2&shift=B");

    gateway.stop().await;
}

#[tokio::test]
async fn unknown_path_returns_404_without_contacting_backend() {
    let hits = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = hits.clone();
    let backend = common::start_programmable_backend(move |_| {
        counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        async { (200, "{}".to_string()) }
    })
    .await;
    let gateway = static_gateway(produce_config(), backend).await;

    let response = common::client()
        .get(gateway.url("/unknown?machine_no=1"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error_msg"].as_str().unwrap().contains("/unknown"));
    assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 0);

    gateway.stop().await;
}

#[tokio::test]
async fn backend_status_is_relayed_verbatim() {
    let backend = common::start_programmable_backend(|_| async {
        (418, r#"{"error_msg":"no tea"}"#.to_string())
    })
    .await;
    let gateway = static_gateway(produce_config(), backend).await;

    let response = common::client()
        .get(gateway.url("/produce?machine_no=1"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 418);
    assert_eq!(response.text().await.unwrap(), r#"{"error_msg":"no tea"}"#);

    gateway.stop().await;
}

#[tokio::test]
async fn unreachable_backend_returns_502() {
    let port = common::closed_port().await;
    let backend: SocketAddr = format!("127.0.0.1:{port}").parse().unwrap();
    let gateway = static_gateway(produce_config(), backend).await;

    let response = common::client()
        .get(gateway.url("/produce?machine_no=1"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error_msg"].is_string());

    gateway.stop().await;
}

#[tokio::test]
async fn silent_backend_times_out_with_502() {
    let backend = common::start_programmable_backend(|_| async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        (200, "{}".to_string())
    })
    .await;
    let mut config = produce_config();
    config.timeouts.backend_secs = 1;
    let gateway = static_gateway(config, backend).await;

    let start = Instant::now();
    let response = common::client()
        .get(gateway.url("/produce?machine_no=1"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(start.elapsed() < Duration::from_secs(5));

    gateway.stop().await;
}

#[tokio::test]
async fn request_id_reaches_backend_and_client() {
    let backend = common::start_echo_backend().await;
    let gateway = static_gateway(produce_config(), backend).await;

    let response = common::client()
        .get(gateway.url("/produce?machine_no=1"))
        .header("x-request-id", "trace-42")
        .send()
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "trace-42");
    let echoed: serde_json::Value = response.json().await.unwrap();
    assert_eq!(echoed["request_id"], "trace-42");

    gateway.stop().await;
}

#[tokio::test]
async fn scan_resolver_routes_to_running_machine() {
    let backend = common::start_echo_backend().await;
    let port = backend.port();
    let base = port - 3;

    let registry = Arc::new(PortRegistry::new());
    let resolver = Arc::new(ScanResolver::new(
        "127.0.0.1".parse().unwrap(),
        base,
        "machine_no",
        registry.clone(),
    ));
    let gateway = TestGateway::start(produce_config(), resolver, registry.clone()).await;
    let client = common::client();

    // Nothing scanned yet: the machine is not known to be running.
    let response = client
        .get(gateway.url("/produce?machine_no=3"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    publish(&registry, &[port], base..=port);

    let response = client
        .get(gateway.url("/produce?machine_no=3&shift=C"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let echoed: serde_json::Value = response.json().await.unwrap();
    assert_eq!(echoed["target"], "/produce?machine_no=3&shift=C");

    let response = client
        .get(gateway.url("/produce?machine_no=abc"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    gateway.stop().await;
}

#[tokio::test]
async fn discovery_endpoint_reports_open_machines() {
    let registry = Arc::new(PortRegistry::new());
    publish(&registry, &[5601, 5605], 5600..=5610);

    let resolver = Arc::new(StaticResolver::new("127.0.0.1:9".parse().unwrap()));
    let gateway = TestGateway::start(produce_config(), resolver, registry).await;

    let body: serde_json::Value = common::client()
        .get(gateway.url("/machine-list"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["cnt"], 2);
    assert_eq!(body["machine_list"], serde_json::json!([1, 5]));

    gateway.stop().await;
}

#[tokio::test]
async fn shutdown_stops_accepting_connections() {
    let backend = common::start_echo_backend().await;
    let gateway = static_gateway(produce_config(), backend).await;
    let addr = gateway.addr;

    gateway.stop().await;

    let result = common::client()
        .get(format!("http://{addr}/produce?machine_no=1"))
        .send()
        .await;
    assert!(result.is_err());
}
