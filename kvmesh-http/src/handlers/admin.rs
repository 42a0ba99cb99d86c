use crate::handlers::AppState;
use axum::{extract::State, Json};
use kvmesh::PeerSnapshot;
use std::collections::BTreeMap;
use std::sync::Arc;

/// GET /admin/keys
/// Live keys and their values; expired entries are left for the cleaner.
pub async fn list_keys(State(state): State<Arc<AppState>>) -> Json<BTreeMap<String, String>> {
    let keys = state
        .store
        .list()
        .into_iter()
        .map(|(key, entry)| (key, entry.value))
        .collect();
    Json(keys)
}

/// GET /admin/peers
pub async fn list_peers(State(state): State<Arc<AppState>>) -> Json<Vec<PeerSnapshot>> {
    Json(state.peers.snapshot())
}

/// GET /metrics
pub async fn metrics(State(state): State<Arc<AppState>>) -> Json<BTreeMap<String, i64>> {
    Json(state.metrics.snapshot())
}
