//! Time-boxed store of recent search results.
//!
//! Entries expire after a fixed TTL. When the table grows past capacity the
//! oldest entries by insertion time go first; reads do not refresh anything.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

use super::models::{ResultSource, VideoSummary};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(10 * 60),
            capacity: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub videos: Vec<VideoSummary>,
    pub timestamp: Instant,
    pub source: ResultSource,
}

impl CacheEntry {
    pub fn new(videos: Vec<VideoSummary>, source: ResultSource) -> Self {
        Self {
            videos,
            timestamp: Instant::now(),
            source,
        }
    }
}

pub struct ResultCache {
    config: CacheConfig,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResultCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn table(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_fresh(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.timestamp) < self.config.ttl
    }

    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.get_at(key, Instant::now())
    }

    /// Returns the entry only while it is inside the TTL.
    pub fn get_at(&self, key: &str, now: Instant) -> Option<CacheEntry> {
        let table = self.table();
        table
            .get(key)
            .filter(|entry| self.is_fresh(entry, now))
            .cloned()
    }

    /// Returns the entry regardless of age, as long as it was not purged.
    pub fn peek_stale(&self, key: &str) -> Option<CacheEntry> {
        self.table().get(key).cloned()
    }

    pub fn set(&self, key: &str, entry: CacheEntry) {
        let mut table = self.table();
        table.insert(key.to_string(), entry);

        let overflow = table.len().saturating_sub(self.config.capacity);
        if overflow > 0 {
            let mut by_age: Vec<(String, Instant)> = table
                .iter()
                .map(|(k, e)| (k.clone(), e.timestamp))
                .collect();
            by_age.sort_by_key(|(_, timestamp)| *timestamp);
            for (key, _) in by_age.into_iter().take(overflow) {
                table.remove(&key);
            }
            debug!("Evicted {} cache entries over capacity", overflow);
        }
    }

    pub fn clean_expired(&self) {
        self.clean_expired_at(Instant::now())
    }

    pub fn clean_expired_at(&self, now: Instant) {
        let ttl = self.config.ttl;
        let mut table = self.table();
        let before = table.len();
        table.retain(|_, entry| now.saturating_duration_since(entry.timestamp) < ttl);
        let removed = before - table.len();
        if removed > 0 {
            debug!("Dropped {} expired cache entries", removed);
        }
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
