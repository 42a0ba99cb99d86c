use crate::metrics::{keys, Metrics};
use crate::store::ExpirySweep;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// A zero period would make `tokio::time::interval` panic.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Periodic active sweep for keys nobody reads.
///
/// Depends only on [`ExpirySweep`], so tests can hand it a fake store.
pub struct TtlCleaner {
    sweep: Arc<dyn ExpirySweep>,
    interval: Duration,
    metrics: Arc<Metrics>,
}

impl TtlCleaner {
    pub fn new(sweep: Arc<dyn ExpirySweep>, interval: Duration, metrics: Arc<Metrics>) -> Self {
        Self {
            sweep,
            interval: interval.max(MIN_SWEEP_INTERVAL),
            metrics,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// One sweep. Returns the number of keys removed.
    pub fn run_once(&self) -> usize {
        let removed = self.sweep.remove_expired();
        self.metrics.inc(keys::TTL_CLEANUP_RUNS_TOTAL);
        if removed > 0 {
            self.metrics
                .add(keys::TTL_KEYS_REMOVED_TOTAL, removed as i64);
            tracing::info!("[TTL] cleaner removed {} expired keys", removed);
        }
        removed
    }

    /// Sweep every `interval` until `token` is cancelled. Should be spawned as
    /// a tokio task.
    pub async fn run(self, token: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // skip the first immediate tick

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!("[TTL] cleaner stopped");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_once();
                }
            }
        }
    }
}
