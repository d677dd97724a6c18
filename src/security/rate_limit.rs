//! Fixed-window request counters.
//!
//! # Responsibilities
//! - Count requests per client key within a fixed window
//! - Admit or reject atomically per key
//! - Report remaining quota and reset time
//!
//! # Design Decisions
//! - Check-and-increment happens under the key's shard lock, so two
//!   concurrent requests can never both take the last slot
//! - Rejected requests do not consume quota
//! - A window that has passed its reset time is reopened on the next hit

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use std::fmt::Debug;

/// Result of counting one request against a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowDecision {
    pub admitted: bool,
    pub limit: u64,
    pub remaining: u64,
    pub reset_at: DateTime<Utc>,
}

/// Port for the shared counter store used by rate limiting.
pub trait CounterStore: Send + Sync + Debug {
    /// Count one hit for `key` if it stays within `limit` for the window
    /// containing `now`. Must be atomic per key.
    fn hit(&self, key: &str, now: DateTime<Utc>, window: TimeDelta, limit: u64) -> WindowDecision;

    /// Drop windows that ended at or before `now`. Returns how many were dropped.
    fn prune(&self, now: DateTime<Utc>) -> usize;
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u64,
    reset_at: DateTime<Utc>,
}

impl Window {
    fn open(now: DateTime<Utc>, width: TimeDelta) -> Self {
        Self {
            count: 0,
            reset_at: now + width,
        }
    }
}

/// In-process counter store backed by DashMap.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    windows: DashMap<String, Window>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked client windows.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

impl CounterStore for MemoryCounterStore {
    fn hit(&self, key: &str, now: DateTime<Utc>, window: TimeDelta, limit: u64) -> WindowDecision {
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| Window::open(now, window));

        if now >= entry.reset_at {
            *entry = Window::open(now, window);
        }

        let admitted = entry.count < limit;
        if admitted {
            entry.count += 1;
        }

        WindowDecision {
            admitted,
            limit,
            remaining: limit.saturating_sub(entry.count),
            reset_at: entry.reset_at,
        }
    }

    fn prune(&self, now: DateTime<Utc>) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| window.reset_at > now);
        before.saturating_sub(self.windows.len())
    }
}
