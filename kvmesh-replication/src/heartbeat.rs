use super::peer::PeerClient;
use kvmesh::metrics::keys;
use kvmesh::{Metrics, PeerManager, PeerPolicy};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

const MIN_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(1);

/// Periodic liveness probe for every registered peer.
///
/// Only talks to [`PeerManager`] through `get_peers`, `mark_success` and
/// `mark_failure`; a probe is a single request with no retries.
pub struct HeartbeatWorker {
    peers: Arc<PeerManager>,
    client: PeerClient,
    interval: Duration,
    metrics: Arc<Metrics>,
}

impl HeartbeatWorker {
    pub fn new(peers: Arc<PeerManager>, policy: &PeerPolicy, metrics: Arc<Metrics>) -> Self {
        Self {
            peers,
            client: PeerClient::new(policy.timeout.heartbeat),
            interval: policy.heartbeat.interval.max(MIN_HEARTBEAT_INTERVAL),
            metrics,
        }
    }

    /// Probe all peers once. Returns how many answered.
    pub async fn run_once(&self) -> usize {
        self.metrics.inc(keys::HEARTBEAT_RUNS_TOTAL);

        let mut alive = 0;
        for peer in self.peers.get_peers() {
            match self.client.heartbeat(&peer).await {
                Ok(()) => {
                    self.metrics.inc(keys::HEARTBEAT_SUCCESS_TOTAL);
                    self.peers.mark_success(&peer);
                    alive += 1;
                }
                Err(e) => {
                    self.metrics.inc(keys::HEARTBEAT_FAILURES_TOTAL);
                    self.peers.mark_failure(&peer);
                    tracing::debug!("[HEARTBEAT] peer {} did not answer: {}", peer, e);
                }
            }
        }
        alive
    }

    pub async fn run(self, token: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        // slow probe rounds push the next tick back instead of bunching up
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // skip the first immediate tick

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!("[HEARTBEAT] worker stopped");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_once().await;
                }
            }
        }
    }
}
