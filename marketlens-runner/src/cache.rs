//! In-memory response cache keyed by `(source, zip)`.
//!
//! Entries carry their own TTL, taken from the adapter's `cache_ttl_ms` at
//! insert time. Expired entries are treated as misses and dropped lazily or by
//! `purge_expired`.

use marketlens_core::{DataSource, StandardMarketData};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

struct CacheEntry {
    record: StandardMarketData,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) < self.ttl
    }
}

/// Thread-safe cache shared by the aggregator's worker threads.
#[derive(Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<(DataSource, String), CacheEntry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(DataSource, String), CacheEntry>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fresh record for `(source, zip)`, if any.
    pub fn get(&self, source: DataSource, zip: &str) -> Option<StandardMarketData> {
        let mut entries = self.lock();
        let key = (source, zip.to_string());
        match entries.get(&key) {
            Some(entry) if entry.is_fresh(Instant::now()) => Some(entry.record.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Store a record. A zero TTL disables caching for that entry.
    pub fn insert(&self, source: DataSource, zip: &str, record: StandardMarketData, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        self.lock().insert(
            (source, zip.to_string()),
            CacheEntry {
                record,
                stored_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Drop expired entries; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
