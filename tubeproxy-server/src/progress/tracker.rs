use std::time::{Duration, Instant};

use super::format::{format_bytes, format_eta, format_speed, megabytes};

/// Minimum spacing between two emitted updates.
pub const UPDATE_INTERVAL: Duration = Duration::from_millis(100);

/// Ceiling while the total size is unknown; only completion reaches 100.
const UNKNOWN_SIZE_CEILING: u8 = 99;

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub progress: u8,
    pub received: u64,
    pub total: Option<u64>,
    pub speed: Option<String>,
    pub eta: Option<String>,
    pub downloaded_size: String,
    pub total_size: Option<String>,
}

/// Byte accounting for a single streamed response.
#[derive(Debug)]
pub struct ProgressTracker {
    total: Option<u64>,
    received: u64,
    started: Instant,
    last_emit: Option<Instant>,
    progress: u8,
}

impl ProgressTracker {
    pub fn new(total: Option<u64>, started: Instant) -> Self {
        Self {
            total: total.filter(|total| *total > 0),
            received: 0,
            started,
            last_emit: None,
            progress: 0,
        }
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Accounts `len` bytes. Returns a snapshot when at least
    /// [`UPDATE_INTERVAL`] passed since the previous one.
    pub fn record(&mut self, len: usize, now: Instant) -> Option<ProgressSnapshot> {
        self.received += len as u64;
        let due = self
            .last_emit
            .map_or(true, |last| now.duration_since(last) >= UPDATE_INTERVAL);
        if !due {
            return None;
        }
        self.last_emit = Some(now);
        Some(self.snapshot(now))
    }

    pub fn snapshot(&mut self, now: Instant) -> ProgressSnapshot {
        let computed = match self.total {
            Some(total) => {
                let ratio = self.received as f64 / total as f64 * 100.0;
                ratio.round().min(100.0) as u8
            }
            None => {
                let heuristic = (megabytes(self.received) * 10.0).floor();
                heuristic.min(f64::from(UNKNOWN_SIZE_CEILING)) as u8
            }
        };
        self.progress = self.progress.max(computed);
        self.build(now)
    }

    pub fn finish(&mut self, now: Instant) -> ProgressSnapshot {
        self.progress = 100;
        let mut snapshot = self.build(now);
        snapshot.eta = None;
        snapshot
    }

    fn build(&self, now: Instant) -> ProgressSnapshot {
        let elapsed = now.duration_since(self.started).as_secs_f64();
        let rate = if elapsed > 0.0 {
            Some(self.received as f64 / elapsed)
        } else {
            None
        };
        let eta = match (self.total, rate) {
            (Some(total), Some(rate)) if rate > 0.0 => {
                let remaining = total.saturating_sub(self.received) as f64;
                Some(format_eta((remaining / rate).ceil() as u64))
            }
            _ => None,
        };
        ProgressSnapshot {
            progress: self.progress,
            received: self.received,
            total: self.total,
            speed: rate.map(format_speed),
            eta,
            downloaded_size: format_bytes(self.received),
            total_size: self.total.map(format_bytes),
        }
    }
}
