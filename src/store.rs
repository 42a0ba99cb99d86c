use crate::metrics::{keys, Metrics};
use crate::types::Entry;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// The one capability the TTL cleaner needs from a store.
pub trait ExpirySweep: Send + Sync {
    /// Delete every expired entry and return how many were removed.
    fn remove_expired(&self) -> usize;
}

/// Concurrency-safe in-memory key-value map.
///
/// Writes are merged last-write-wins on `Entry::timestamp`: an incoming entry
/// replaces the stored one only when its timestamp is strictly greater, so on
/// a tie the first writer seen is kept. Expired entries are dropped lazily by
/// [`Store::get`] and actively by [`ExpirySweep::remove_expired`].
pub struct Store {
    data: RwLock<HashMap<String, Entry>>,
    metrics: Arc<Metrics>,
}

impl Store {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            metrics,
        }
    }

    /// Insert or merge `entry` under `key`. Returns `false` when the write lost
    /// to an existing entry with an equal or newer timestamp.
    pub fn set(&self, key: &str, entry: Entry) -> bool {
        self.metrics.inc(keys::CACHE_SETS_TOTAL);

        let mut data = self.write();
        match data.get(key) {
            Some(existing) if entry.timestamp <= existing.timestamp => {
                tracing::debug!(
                    "[STORE] ignored stale write for {} (ts {} <= {})",
                    key,
                    entry.timestamp,
                    existing.timestamp
                );
                false
            }
            Some(_) => {
                data.insert(key.to_string(), entry);
                true
            }
            None => {
                data.insert(key.to_string(), entry);
                self.metrics.inc(keys::CACHE_KEYS_TOTAL);
                true
            }
        }
    }

    /// Read a live value. An expired entry is deleted on the way out and
    /// reported as missing.
    pub fn get(&self, key: &str) -> Option<String> {
        self.metrics.inc(keys::CACHE_GETS_TOTAL);
        let now = Utc::now();

        {
            let data = self.read();
            match data.get(key) {
                None => {
                    self.metrics.inc(keys::CACHE_MISSES_TOTAL);
                    return None;
                }
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        // Re-check under the write lock: a newer write may have landed after
        // the read guard was released.
        let mut data = self.write();
        match data.get(key) {
            Some(entry) if entry.is_expired(now) => {
                data.remove(key);
                self.metrics.inc(keys::CACHE_EXPIRED_TOTAL);
                self.metrics.add(keys::CACHE_KEYS_TOTAL, -1);
                self.metrics.inc(keys::CACHE_MISSES_TOTAL);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => {
                self.metrics.inc(keys::CACHE_MISSES_TOTAL);
                None
            }
        }
    }

    pub fn delete(&self, key: &str) {
        if self.write().remove(key).is_some() {
            self.metrics.add(keys::CACHE_KEYS_TOTAL, -1);
        }
    }

    /// Point-in-time copy of all live entries. Expired entries are skipped,
    /// not removed.
    pub fn list(&self) -> HashMap<String, Entry> {
        let now = Utc::now();
        self.read()
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    /// Number of stored entries, including expired ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Entry>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Entry>> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ExpirySweep for Store {
    fn remove_expired(&self) -> usize {
        let now = Utc::now();
        let mut data = self.write();

        let before = data.len();
        data.retain(|_, entry| !entry.is_expired(now));
        let removed = before - data.len();

        if removed > 0 {
            self.metrics.add(keys::CACHE_EXPIRED_TOTAL, removed as i64);
            self.metrics.add(keys::CACHE_KEYS_TOTAL, -(removed as i64));
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn store() -> (Store, Arc<Metrics>) {
        let metrics = Metrics::new();
        (Store::new(Arc::clone(&metrics)), metrics)
    }

    #[test]
    fn test_set_and_get() {
        let (store, _) = store();
        assert!(store.set("key1", Entry::new("hello", 1)));
        assert_eq!(store.get("key1").as_deref(), Some("hello"));
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn test_newer_timestamp_wins() {
        let (store, _) = store();
        store.set("k", Entry::new("old", 1));
        assert!(store.set("k", Entry::new("new", 2)));
        assert_eq!(store.get("k").as_deref(), Some("new"));
    }

    #[test]
    fn test_older_timestamp_is_ignored() {
        let (store, _) = store();
        store.set("k", Entry::new("a", 5));
        assert!(!store.set("k", Entry::new("b", 3)));
        assert_eq!(store.get("k").as_deref(), Some("a"));
    }

    #[test]
    fn test_equal_timestamp_keeps_first_writer() {
        let (store, _) = store();
        store.set("k", Entry::new("first", 4));
        assert!(!store.set("k", Entry::new("second", 4)));
        assert_eq!(store.get("k").as_deref(), Some("first"));
    }

    #[test]
    fn test_lww_result_independent_of_arrival_order() {
        let (forward, _) = store();
        forward.set("k", Entry::new("v1", 1));
        forward.set("k", Entry::new("v2", 2));

        let (reverse, _) = store();
        reverse.set("k", Entry::new("v2", 2));
        reverse.set("k", Entry::new("v1", 1));

        assert_eq!(forward.get("k"), reverse.get("k"));
        assert_eq!(forward.get("k").as_deref(), Some("v2"));
    }

    #[test]
    fn test_delete() {
        let (store, metrics) = store();
        store.set("k", Entry::new("1", 1));
        store.delete("k");
        store.delete("absent");

        assert_eq!(store.get("k"), None);
        assert_eq!(metrics.get(keys::CACHE_KEYS_TOTAL), 0);
    }

    #[test]
    fn test_get_deletes_expired_entry() {
        let (store, metrics) = store();
        store.set(
            "temp",
            Entry::new("value", 1).with_expiry(Utc::now() - Duration::milliseconds(1)),
        );

        assert_eq!(store.get("temp"), None);
        assert_eq!(store.len(), 0);
        assert_eq!(store.get("temp"), None);

        assert_eq!(metrics.get(keys::CACHE_EXPIRED_TOTAL), 1);
        assert_eq!(metrics.get(keys::CACHE_KEYS_TOTAL), 0);
        assert_eq!(metrics.get(keys::CACHE_MISSES_TOTAL), 2);
        assert_eq!(metrics.get(keys::CACHE_GETS_TOTAL), 2);
    }

    #[test]
    fn test_list_filters_without_deleting() {
        let (store, _) = store();
        store.set(
            "alive",
            Entry::new("ok", 1).with_expiry(Utc::now() + Duration::seconds(60)),
        );
        store.set(
            "expired",
            Entry::new("gone", 2).with_expiry(Utc::now() - Duration::seconds(1)),
        );

        let listed = store.list();
        assert!(listed.contains_key("alive"));
        assert!(!listed.contains_key("expired"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_remove_expired_only_drops_expired() {
        let (store, metrics) = store();
        store.set(
            "k1",
            Entry::new("v1", 1).with_expiry(Utc::now() - Duration::seconds(1)),
        );
        store.set("k2", Entry::new("v2", 2));

        assert_eq!(store.remove_expired(), 1);
        assert_eq!(store.get("k1"), None);
        assert_eq!(store.get("k2").as_deref(), Some("v2"));
        assert_eq!(store.remove_expired(), 0);

        assert_eq!(metrics.get(keys::CACHE_EXPIRED_TOTAL), 1);
        assert_eq!(metrics.get(keys::CACHE_KEYS_TOTAL), 1);
    }

    #[test]
    fn test_newer_write_revives_expired_key() {
        let (store, metrics) = store();
        store.set(
            "k",
            Entry::new("stale", 1).with_expiry(Utc::now() - Duration::seconds(1)),
        );
        store.set("k", Entry::new("fresh", 2));

        assert_eq!(store.get("k").as_deref(), Some("fresh"));
        assert_eq!(metrics.get(keys::CACHE_KEYS_TOTAL), 1);
    }

    #[test]
    fn test_concurrent_writes_keep_highest_timestamp() {
        let (store, metrics) = store();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..50i64)
            .map(|ts| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store.set("key", Entry::new(format!("value-{}", ts), ts));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get("key").as_deref(), Some("value-49"));
        assert_eq!(metrics.get(keys::CACHE_SETS_TOTAL), 50);
        assert_eq!(metrics.get(keys::CACHE_KEYS_TOTAL), 1);
    }
}
