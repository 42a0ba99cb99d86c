use crate::handlers::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use kvmesh::KvMeshError;
use kvmesh_replication::{Payload, ReplicationStatus};
use std::sync::Arc;

/// POST /internal/replicate
/// Apply a write from a peer. Goes through the same LWW merge as local
/// writes and is never forwarded again.
pub async fn replicate(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Payload>, JsonRejection>,
) -> Result<StatusCode, KvMeshError> {
    let Json(payload) = body.map_err(|e| KvMeshError::Json(e.body_text()))?;
    if payload.key.is_empty() {
        return Err(KvMeshError::InvalidKey("empty key in payload".to_string()));
    }

    let applied = state.store.set(&payload.key, payload.entry);
    tracing::debug!(
        "[REPL] received key {} from {} (applied={})",
        payload.key,
        payload.original_node_id,
        applied
    );

    Ok(StatusCode::NO_CONTENT)
}

/// GET /internal/heartbeat
pub async fn heartbeat() -> StatusCode {
    StatusCode::OK
}

/// GET /internal/status
/// Return basic replication status for monitoring
pub async fn replication_status(State(state): State<Arc<AppState>>) -> Json<ReplicationStatus> {
    let status = match &state.replicator {
        Some(replicator) => replicator.status(),
        None => ReplicationStatus {
            node_id: state.node_id.clone(),
            replication_enabled: false,
            peer_count: 0,
        },
    };
    Json(status)
}
