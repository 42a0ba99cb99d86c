use crate::dto::{GetResponse, PutRequest};
use crate::handlers::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use kvmesh::{Entry, KvMeshError};
use std::sync::Arc;
use std::time::Duration;

fn require_key(key: &str) -> Result<(), KvMeshError> {
    if key.is_empty() {
        return Err(KvMeshError::InvalidKey("missing key in URL".to_string()));
    }
    Ok(())
}

/// PUT /kv/*key
/// Store locally, then hand the write to the replicator.
pub async fn put_key(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    body: Result<Json<PutRequest>, JsonRejection>,
) -> Result<StatusCode, KvMeshError> {
    require_key(&key)?;
    let Json(req) = body.map_err(|e| KvMeshError::Json(e.body_text()))?;

    let mut entry = Entry::now(req.value);
    if let Some(ttl_ms) = req.ttl_ms.filter(|ttl| *ttl > 0) {
        entry = entry.with_ttl(Duration::from_millis(ttl_ms as u64));
    }

    state.store.set(&key, entry.clone());

    if let Some(replicator) = &state.replicator {
        let dispatched = replicator.replicate(&state.shutdown, &key, entry);
        tracing::debug!("[REPL] key {} dispatched to {} peers", key, dispatched);
    }

    Ok(StatusCode::NO_CONTENT)
}

/// GET /kv/*key
pub async fn get_key(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>, KvMeshError> {
    require_key(&key)?;
    state
        .store
        .get(&key)
        .map(|value| Json(GetResponse { value }))
        .ok_or(KvMeshError::KeyNotFound(key))
}

/// DELETE /kv/*key
/// Local only; deletes are not replicated.
pub async fn delete_key(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<StatusCode, KvMeshError> {
    require_key(&key)?;
    state.store.delete(&key);
    Ok(StatusCode::NO_CONTENT)
}

/// Any method on `/kv/` with no key.
pub async fn missing_key() -> KvMeshError {
    KvMeshError::InvalidKey("missing key in URL".to_string())
}
