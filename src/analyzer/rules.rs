use super::report::HealthStatus;
use crate::metrics::keys;
use std::collections::BTreeMap;

/// A triggered rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub signal: &'static str,
    pub recommendation: &'static str,
    pub severity: HealthStatus,
}

/// Evaluates a metrics snapshot; `None` when the rule does not fire.
pub type Rule = fn(&BTreeMap<String, i64>) -> Option<Finding>;

pub const DEFAULT_RULES: &[Rule] = &[
    replication_retry_rule,
    peer_unhealthy_rule,
    heartbeat_failure_rule,
];

fn counter(snapshot: &BTreeMap<String, i64>, key: &str) -> i64 {
    snapshot.get(key).copied().unwrap_or(0)
}

pub fn replication_retry_rule(snapshot: &BTreeMap<String, i64>) -> Option<Finding> {
    (counter(snapshot, keys::REPLICATION_RETRIES_TOTAL) > 0).then_some(Finding {
        signal: "Replication retries detected",
        recommendation: "Check network connectivity or replication timeouts",
        severity: HealthStatus::Degraded,
    })
}

pub fn peer_unhealthy_rule(snapshot: &BTreeMap<String, i64>) -> Option<Finding> {
    (counter(snapshot, keys::PEERS_UNHEALTHY) > 0).then_some(Finding {
        signal: "One or more peers are unhealthy",
        recommendation: "Inspect peer health and heartbeat configuration",
        severity: HealthStatus::Critical,
    })
}

pub fn heartbeat_failure_rule(snapshot: &BTreeMap<String, i64>) -> Option<Finding> {
    (counter(snapshot, keys::HEARTBEAT_FAILURES_TOTAL) > 0).then_some(Finding {
        signal: "Heartbeat failures detected",
        recommendation: "Check peer availability and heartbeat endpoints",
        severity: HealthStatus::Degraded,
    })
}
