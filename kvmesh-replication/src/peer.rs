use super::types::Payload;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Why a single call to a peer did not succeed. Every variant is retryable.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("failed to encode payload: {0}")]
    Encode(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status {0}")]
    UnexpectedStatus(u16),
}

/// HTTP client for the `/internal/*` endpoints of peer nodes.
///
/// Peers are addressed by base URL (e.g. `http://10.0.1.2:8080`); one client
/// is shared across all of them.
#[derive(Debug, Clone)]
pub struct PeerClient {
    http_client: reqwest::Client,
}

impl PeerClient {
    pub fn new(timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { http_client }
    }

    /// Ship one write to `addr`. Only `204 No Content` counts as accepted; the
    /// response body is never read.
    pub async fn replicate(&self, addr: &str, payload: &Payload) -> Result<(), SendError> {
        let body = serde_json::to_vec(payload).map_err(|e| SendError::Encode(e.to_string()))?;
        let url = format!("{}/internal/replicate", addr);

        let response = self
            .http_client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(()),
            status => Err(SendError::UnexpectedStatus(status.as_u16())),
        }
    }

    /// Liveness probe; only `200 OK` counts as alive.
    pub async fn heartbeat(&self, addr: &str) -> Result<(), SendError> {
        let url = format!("{}/internal/heartbeat", addr);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(SendError::UnexpectedStatus(status.as_u16())),
        }
    }
}
