//! Per-client admission control.
//!
//! Sliding window over request timestamps: a client may make at most
//! `max_requests` requests within any `window`.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Rate limit configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 8,
            window: Duration::from_secs(60),
        }
    }
}

pub struct RateLimiter {
    config: RateLimitConfig,
    requests: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            requests: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn table(&self) -> MutexGuard<'_, HashMap<String, VecDeque<Instant>>> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drops timestamps that left the window. Timestamps are recorded in
    /// order, so only the front needs checking.
    fn prune(timestamps: &mut VecDeque<Instant>, window: Duration, now: Instant) {
        while let Some(oldest) = timestamps.front() {
            if now.saturating_duration_since(*oldest) >= window {
                timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn is_allowed(&self, id: &str) -> bool {
        self.is_allowed_at(id, Instant::now())
    }

    /// Admits and records the request, or refuses it without recording.
    pub fn is_allowed_at(&self, id: &str, now: Instant) -> bool {
        let mut table = self.table();
        let timestamps = table.entry(id.to_string()).or_default();
        Self::prune(timestamps, self.config.window, now);

        if timestamps.len() >= self.config.max_requests as usize {
            debug!(
                "Refusing {}: {} requests in the last {}s",
                id,
                timestamps.len(),
                self.config.window.as_secs()
            );
            return false;
        }
        timestamps.push_back(now);
        true
    }

    pub fn remaining_requests(&self, id: &str) -> u32 {
        self.remaining_requests_at(id, Instant::now())
    }

    pub fn remaining_requests_at(&self, id: &str, now: Instant) -> u32 {
        let table = self.table();
        let used = table
            .get(id)
            .map(|timestamps| {
                timestamps
                    .iter()
                    .filter(|t| now.saturating_duration_since(**t) < self.config.window)
                    .count()
            })
            .unwrap_or(0);
        self.config.max_requests.saturating_sub(used as u32)
    }

    /// Whole seconds, rounded up, until the oldest recorded request leaves
    /// the window. 0 when nothing is recorded.
    pub fn time_until_reset(&self, id: &str) -> u64 {
        self.time_until_reset_at(id, Instant::now())
    }

    pub fn time_until_reset_at(&self, id: &str, now: Instant) -> u64 {
        let table = self.table();
        let Some(oldest) = table.get(id).and_then(|timestamps| {
            timestamps
                .iter()
                .find(|t| now.saturating_duration_since(**t) < self.config.window)
                .copied()
        }) else {
            return 0;
        };
        let left = self
            .config
            .window
            .saturating_sub(now.saturating_duration_since(oldest));
        left.as_millis().div_ceil(1000) as u64
    }

    /// Forgets clients without any timestamp inside the window.
    pub fn cleanup(&self) {
        self.cleanup_at(Instant::now())
    }

    pub fn cleanup_at(&self, now: Instant) {
        let window = self.config.window;
        let mut table = self.table();
        table.retain(|_, timestamps| {
            Self::prune(timestamps, window, now);
            !timestamps.is_empty()
        });
    }

    pub fn tracked_clients(&self) -> usize {
        self.table().len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}
