use axum::{extract::State, Json};
use kvmesh::HealthReport;
use std::sync::Arc;

use super::AppState;

/// Health check endpoint
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(state.analyzer.analyze())
}
