use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Counter names shared by every component that reports into [`Metrics`].
pub mod keys {
    // Cache
    pub const CACHE_KEYS_TOTAL: &str = "cache_keys_total";
    pub const CACHE_SETS_TOTAL: &str = "cache_sets_total";
    pub const CACHE_GETS_TOTAL: &str = "cache_gets_total";
    pub const CACHE_MISSES_TOTAL: &str = "cache_misses_total";
    pub const CACHE_EXPIRED_TOTAL: &str = "cache_expired_total";

    // Replication
    pub const REPLICATION_ATTEMPTS_TOTAL: &str = "replication_attempts_total";
    pub const REPLICATION_SUCCESS_TOTAL: &str = "replication_success_total";
    pub const REPLICATION_FAILURE_TOTAL: &str = "replication_failure_total";
    pub const REPLICATION_RETRIES_TOTAL: &str = "replication_retries_total";

    // TTL
    pub const TTL_CLEANUP_RUNS_TOTAL: &str = "ttl_cleanup_runs_total";
    pub const TTL_KEYS_REMOVED_TOTAL: &str = "ttl_keys_removed_total";

    // Peers
    pub const PEERS_HEALTHY: &str = "peers_healthy";
    pub const PEERS_UNHEALTHY: &str = "peers_unhealthy";
    pub const PEER_FAILURES_TOTAL: &str = "peer_failures_total";

    // Heartbeat
    pub const HEARTBEAT_RUNS_TOTAL: &str = "heartbeat_runs_total";
    pub const HEARTBEAT_SUCCESS_TOTAL: &str = "heartbeat_success_total";
    pub const HEARTBEAT_FAILURES_TOTAL: &str = "heartbeat_failures_total";
}

/// Process-wide counter registry.
///
/// Existing counters are bumped with a relaxed atomic add while only holding
/// the shard read guard; the first use of a key takes the shard write guard
/// to insert it.
#[derive(Debug, Default)]
pub struct Metrics {
    counters: DashMap<String, AtomicI64>,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc(&self, key: &str) {
        self.add(key, 1);
    }

    pub fn add(&self, key: &str, delta: i64) {
        if let Some(counter) = self.counters.get(key) {
            counter.fetch_add(delta, Ordering::Relaxed);
            return;
        }

        self.counters
            .entry(key.to_string())
            .or_insert_with(|| AtomicI64::new(0))
            .fetch_add(delta, Ordering::Relaxed);
    }

    /// Current value, zero for counters never touched.
    pub fn get(&self, key: &str) -> i64 {
        self.counters
            .get(key)
            .map(|counter| counter.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Detached copy of every counter, sorted by name.
    pub fn snapshot(&self) -> BTreeMap<String, i64> {
        self.counters
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().load(Ordering::Relaxed)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inc_and_add() {
        let metrics = Metrics::new();
        metrics.inc(keys::CACHE_SETS_TOTAL);
        metrics.add(keys::CACHE_SETS_TOTAL, 2);

        assert_eq!(metrics.get(keys::CACHE_SETS_TOTAL), 3);
        assert_eq!(metrics.snapshot()[keys::CACHE_SETS_TOTAL], 3);
    }

    #[test]
    fn test_negative_delta_acts_as_gauge() {
        let metrics = Metrics::new();
        metrics.add(keys::CACHE_KEYS_TOTAL, 5);
        metrics.add(keys::CACHE_KEYS_TOTAL, -2);
        assert_eq!(metrics.get(keys::CACHE_KEYS_TOTAL), 3);
    }

    #[test]
    fn test_untouched_counter_reads_zero() {
        let metrics = Metrics::new();
        assert_eq!(metrics.get(keys::HEARTBEAT_RUNS_TOTAL), 0);
        assert!(metrics.snapshot().is_empty());
    }

    #[test]
    fn test_unknown_key_is_created_on_demand() {
        let metrics = Metrics::new();
        metrics.inc("unknown_metric");
        assert_eq!(metrics.snapshot()["unknown_metric"], 1);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let metrics = Metrics::new();
        metrics.inc(keys::CACHE_KEYS_TOTAL);

        let mut snap = metrics.snapshot();
        snap.insert(keys::CACHE_KEYS_TOTAL.to_string(), 999);

        assert_eq!(metrics.get(keys::CACHE_KEYS_TOTAL), 1);
    }

    #[test]
    fn test_concurrent_increments() {
        let metrics = Metrics::new();
        let workers = 16;
        let increments = 500;

        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                std::thread::spawn(move || {
                    for _ in 0..increments {
                        metrics.inc(keys::REPLICATION_ATTEMPTS_TOTAL);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(
            metrics.get(keys::REPLICATION_ATTEMPTS_TOTAL),
            (workers * increments) as i64
        );
    }
}
