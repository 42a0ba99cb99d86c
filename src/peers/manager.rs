use super::config::HealthPolicy;
use crate::metrics::{keys, Metrics};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerState {
    Healthy,
    Unhealthy,
}

impl fmt::Display for PeerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerState::Healthy => write!(f, "healthy"),
            PeerState::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Copy of one peer's health bookkeeping, for admin endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerSnapshot {
    pub address: String,
    pub state: PeerState,
    pub failure_count: u32,
    pub success_count: u32,
}

#[derive(Debug)]
struct Peer {
    state: PeerState,
    /// Consecutive failures; zeroed by any success.
    failure_count: u32,
    /// Consecutive successes; zeroed by any failure.
    success_count: u32,
}

impl Peer {
    fn new() -> Self {
        Self {
            state: PeerState::Healthy,
            failure_count: 0,
            success_count: 0,
        }
    }
}

/// Health view of every registered peer, shared by the replicator and the
/// heartbeat prober.
///
/// Transitions use hysteresis: a healthy peer goes unhealthy after
/// `failure_threshold` consecutive failures, and an unhealthy peer recovers
/// after `success_threshold` consecutive successes. Events for unknown
/// addresses are ignored. Peers are never removed.
pub struct PeerManager {
    peers: RwLock<HashMap<String, Peer>>,
    health: HealthPolicy,
    metrics: Arc<Metrics>,
}

impl PeerManager {
    pub fn new(health: HealthPolicy, metrics: Arc<Metrics>) -> Arc<Self> {
        Arc::new(Self {
            peers: RwLock::new(HashMap::new()),
            health,
            metrics,
        })
    }

    pub fn health_policy(&self) -> HealthPolicy {
        self.health
    }

    /// Register `address` as healthy. No-op if it is already known.
    pub fn add_peer(&self, address: &str) {
        let mut peers = self.write();
        if peers.contains_key(address) {
            return;
        }
        peers.insert(address.to_string(), Peer::new());
        self.metrics.inc(keys::PEERS_HEALTHY);
        tracing::info!("[PEERS] registered peer {}", address);
    }

    pub fn mark_failure(&self, address: &str) {
        let mut peers = self.write();
        let Some(peer) = peers.get_mut(address) else {
            return;
        };

        peer.failure_count = peer.failure_count.saturating_add(1);
        peer.success_count = 0;
        self.metrics.inc(keys::PEER_FAILURES_TOTAL);

        if peer.state == PeerState::Healthy && peer.failure_count >= self.health.failure_threshold
        {
            peer.state = PeerState::Unhealthy;
            self.metrics.add(keys::PEERS_HEALTHY, -1);
            self.metrics.inc(keys::PEERS_UNHEALTHY);
            tracing::warn!(
                "[PEERS] peer {} marked unhealthy after {} consecutive failures",
                address,
                peer.failure_count
            );
        }
    }

    pub fn mark_success(&self, address: &str) {
        let mut peers = self.write();
        let Some(peer) = peers.get_mut(address) else {
            return;
        };

        peer.success_count = peer.success_count.saturating_add(1);
        peer.failure_count = 0;

        if peer.state == PeerState::Unhealthy
            && peer.success_count >= self.health.success_threshold
        {
            peer.state = PeerState::Healthy;
            self.metrics.add(keys::PEERS_UNHEALTHY, -1);
            self.metrics.inc(keys::PEERS_HEALTHY);
            tracing::info!(
                "[PEERS] peer {} recovered after {} consecutive successes",
                address,
                peer.success_count
            );
        }
    }

    /// `false` both for unknown and for unhealthy peers.
    pub fn is_healthy(&self, address: &str) -> bool {
        self.read()
            .get(address)
            .is_some_and(|peer| peer.state == PeerState::Healthy)
    }

    /// Registered addresses, in no particular order.
    pub fn get_peers(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    pub fn snapshot(&self) -> Vec<PeerSnapshot> {
        let mut snapshot: Vec<PeerSnapshot> = self
            .read()
            .iter()
            .map(|(address, peer)| PeerSnapshot {
                address: address.clone(),
                state: peer.state,
                failure_count: peer.failure_count,
                success_count: peer.success_count,
            })
            .collect();
        snapshot.sort_by(|a, b| a.address.cmp(&b.address));
        snapshot
    }

    pub fn peer_count(&self) -> usize {
        self.read().len()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Peer>> {
        self.peers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Peer>> {
        self.peers.write().unwrap_or_else(PoisonError::into_inner)
    }
}
