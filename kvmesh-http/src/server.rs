use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use kvmesh::{LogBuffer, TtlCleaner};
use kvmesh_replication::{HeartbeatWorker, NodeConfig};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::handlers::{
    delete_key, get_key, health, heartbeat, list_keys, list_peers, metrics, missing_key, put_key,
    replicate, replication_status, AppState,
};
use crate::middleware::{handle_panic, normalize_content_type};

/// All routes of a node, with middleware applied.
pub fn build_router(state: Arc<AppState>) -> Router {
    let kv = Router::new()
        .route("/kv/", put(missing_key).get(missing_key).delete(missing_key))
        .route("/kv/*key", put(put_key).get(get_key).delete(delete_key))
        .with_state(state.clone());

    let admin = Router::new()
        .route("/admin/keys", get(list_keys))
        .route("/admin/peers", get(list_peers))
        .route("/metrics", get(metrics))
        .route("/health", get(health))
        .with_state(state.clone());

    // Peer-to-peer endpoints
    let internal = Router::new()
        .route("/internal/replicate", post(replicate))
        .route("/internal/heartbeat", get(heartbeat))
        .route("/internal/status", get(replication_status))
        .with_state(state);

    with_middleware(Router::new().merge(kv).merge(admin).merge(internal))
}

pub(crate) fn with_middleware(router: Router) -> Router {
    router
        .layer(middleware::from_fn(normalize_content_type))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
}

fn init_tracing(logs: &Arc<LogBuffer>) {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(logs.layer())
        .try_init();
}

/// Run a node until ctrl-c. Configuration comes from `{data_dir}/node.json`;
/// `bind_addr` overrides the configured listen address.
pub async fn serve(
    data_dir: &Path,
    bind_addr: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut node_config = NodeConfig::load_or_default(data_dir);
    if let Some(addr) = bind_addr {
        node_config.bind_addr = addr;
    }

    LogBuffer::init_global(node_config.tuning.log_buffer_capacity);
    let logs = LogBuffer::global();
    init_tracing(&logs);

    let shutdown = CancellationToken::new();
    let state = AppState::from_config(&node_config, Arc::clone(&logs), shutdown.clone());

    let cleaner = TtlCleaner::new(
        state.store.clone(),
        node_config.tuning.ttl_sweep_interval(),
        Arc::clone(&state.metrics),
    );
    tokio::spawn(cleaner.run(shutdown.clone()));
    tracing::info!(
        "[TTL] cleaner running every {:?}",
        node_config.tuning.ttl_sweep_interval()
    );

    if state.replicator.is_some() {
        tracing::info!("Replication enabled: {} peers", node_config.peers.len());
        let worker = HeartbeatWorker::new(
            Arc::clone(&state.peers),
            &node_config.tuning.peer_policy(),
            Arc::clone(&state.metrics),
        );
        tokio::spawn(worker.run(shutdown.clone()));
    } else {
        tracing::info!("Replication disabled (no peers in node.json)");
    }

    let app = build_router(state);

    tracing::info!(
        "Starting kvmesh node {} on {}",
        node_config.node_id,
        node_config.bind_addr
    );

    let listener = tokio::net::TcpListener::bind(&node_config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal(token: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            token.cancelled().await;
        }
    }
    token.cancel();
}
