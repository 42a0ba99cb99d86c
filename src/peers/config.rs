use crate::retry::RetryPolicy;
use std::time::Duration;

/// Consecutive-event thresholds for the peer health state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthPolicy {
    /// Consecutive failures that take a healthy peer out of rotation.
    pub failure_threshold: u32,
    /// Consecutive successes that bring an unhealthy peer back.
    pub success_threshold: u32,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            success_threshold: 2,
        }
    }
}

/// Per-request timeouts for outbound peer calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    pub replication: Duration,
    pub heartbeat: Duration,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            replication: Duration::from_secs(2),
            heartbeat: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatPolicy {
    pub interval: Duration,
}

impl Default for HeartbeatPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
        }
    }
}

/// Everything a node needs to talk to its peers.
#[derive(Debug, Clone, Default)]
pub struct PeerPolicy {
    pub retry: RetryPolicy,
    pub timeout: TimeoutPolicy,
    pub health: HealthPolicy,
    pub heartbeat: HeartbeatPolicy,
}
