use super::peer::{PeerClient, SendError};
use super::types::{Payload, ReplicationStatus};
use kvmesh::metrics::keys;
use kvmesh::retry::{retry, RetryError, RetryPolicy};
use kvmesh::{Entry, Metrics, PeerManager, PeerPolicy};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Fans local writes out to every healthy peer and feeds the outcome of each
/// send back into [`PeerManager`].
pub struct Replicator {
    node_id: String,
    peers: Arc<PeerManager>,
    client: PeerClient,
    retry: RetryPolicy,
    metrics: Arc<Metrics>,
}

impl Replicator {
    pub fn new(
        node_id: impl Into<String>,
        peers: Arc<PeerManager>,
        policy: &PeerPolicy,
        metrics: Arc<Metrics>,
    ) -> Arc<Self> {
        Arc::new(Self {
            node_id: node_id.into(),
            peers,
            client: PeerClient::new(policy.timeout.replication),
            retry: policy.retry.clone(),
            metrics,
        })
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn peers(&self) -> &Arc<PeerManager> {
        &self.peers
    }

    pub fn status(&self) -> ReplicationStatus {
        let peer_count = self.peers.peer_count();
        ReplicationStatus {
            node_id: self.node_id.clone(),
            replication_enabled: peer_count > 0,
            peer_count,
        }
    }

    /// Replicate one write to all healthy peers (fire-and-forget).
    ///
    /// Spawns one task per healthy peer and returns how many were dispatched;
    /// per-peer outcomes are only visible through peer health, metrics and
    /// logs. Cancelling `token` stops tasks that are waiting in backoff.
    pub fn replicate(self: &Arc<Self>, token: &CancellationToken, key: &str, entry: Entry) -> usize {
        let payload = Arc::new(Payload {
            key: key.to_string(),
            entry,
            original_node_id: self.node_id.clone(),
        });

        let mut dispatched = 0;
        for peer in self.peers.get_peers() {
            if !self.peers.is_healthy(&peer) {
                tracing::debug!("[REPL] skipping unhealthy peer {}", peer);
                continue;
            }

            self.metrics.inc(keys::REPLICATION_ATTEMPTS_TOTAL);
            dispatched += 1;

            let replicator = Arc::clone(self);
            let payload = Arc::clone(&payload);
            let token = token.clone();

            tokio::spawn(async move {
                let _ = replicator.send_with_retry(&token, &peer, &payload).await;
            });
        }
        dispatched
    }

    /// Send `payload` to one peer under the retry policy and record the final
    /// outcome. Cancellation leaves the peer's health untouched.
    pub async fn send_with_retry(
        &self,
        token: &CancellationToken,
        peer: &str,
        payload: &Payload,
    ) -> Result<(), RetryError<SendError>> {
        let sends = &AtomicU32::new(0);

        let result = retry(token, &self.retry, || async move {
            if sends.fetch_add(1, Ordering::Relaxed) > 0 {
                self.metrics.inc(keys::REPLICATION_RETRIES_TOTAL);
            }
            self.client.replicate(peer, payload).await
        })
        .await;

        match &result {
            Ok(()) => {
                self.peers.mark_success(peer);
                self.metrics.inc(keys::REPLICATION_SUCCESS_TOTAL);
                tracing::debug!(
                    "[REPL] replicated key {} to peer {}",
                    payload.key,
                    peer
                );
            }
            Err(RetryError::Cancelled) => {
                tracing::debug!(
                    "[REPL] replication of key {} to peer {} cancelled",
                    payload.key,
                    peer
                );
            }
            Err(RetryError::Exhausted { attempts, last }) => {
                self.peers.mark_failure(peer);
                self.metrics.inc(keys::REPLICATION_FAILURE_TOTAL);
                tracing::warn!(
                    "[REPL] replication failed to peer {} for key {} after {} attempts: {}",
                    peer,
                    payload.key,
                    attempts,
                    last
                );
            }
        }
        result
    }
}
