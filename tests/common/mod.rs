use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use kvmesh::LogBuffer;
use kvmesh_http::AppState;
use kvmesh_replication::{NodeConfig, PeerConfig, TuningConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

/// Fast retries and a hair-trigger failure threshold.
#[allow(dead_code)]
pub fn fast_tuning() -> TuningConfig {
    TuningConfig {
        max_retries: 1,
        base_backoff_ms: 5,
        max_backoff_ms: 10,
        replication_timeout_ms: 500,
        heartbeat_timeout_ms: 200,
        failure_threshold: 1,
        success_threshold: 1,
        ..TuningConfig::default()
    }
}

pub fn node_config(node_id: &str, peers: &[String], tuning: TuningConfig) -> NodeConfig {
    NodeConfig {
        node_id: node_id.to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        peers: peers
            .iter()
            .enumerate()
            .map(|(i, addr)| PeerConfig {
                node_id: format!("peer-{}", i),
                addr: addr.clone(),
            })
            .collect(),
        tuning,
    }
}

pub fn node(config: &NodeConfig) -> (Arc<AppState>, Router) {
    let state = AppState::from_config(config, LogBuffer::new(100), CancellationToken::new());
    let router = kvmesh_http::build_router(Arc::clone(&state));
    (state, router)
}

/// Serve a node on an ephemeral port; returns its base URL.
#[allow(dead_code)]
pub async fn spawn_node(config: &NodeConfig) -> (String, Arc<AppState>) {
    let (state, router) = node(config);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{}", addr), state)
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let body = match body {
        Some(json) => Body::from(serde_json::to_vec(&json).unwrap()),
        None => Body::empty(),
    };
    send_raw(app, method, uri, body).await
}

pub async fn send_raw(
    app: &Router,
    method: &str,
    uri: &str,
    body: Body,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

#[allow(dead_code)]
pub async fn wait_until(cond: impl Fn() -> bool) {
    for _ in 0..300 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met in time");
}
