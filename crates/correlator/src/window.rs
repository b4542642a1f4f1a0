//! Bounded sliding window of recent Write/Bash events (§3 "Correlator
//! window", §4.8). FIFO eviction by count, plus time-based eviction on
//! every insert; queries never see an evicted entry because eviction
//! runs before the scan, not lazily during it.

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

pub const DEFAULT_SIZE_LIMIT: usize = 50;
pub const DEFAULT_TIME_LIMIT_SECS: u64 = 300;

pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Write,
    Bash,
}

#[derive(Debug, Clone)]
pub struct WindowEntry {
    pub timestamp: u64,
    pub kind: EventKind,
    pub normalized_target: String,
    pub content_fingerprint: String,
}

pub struct Window {
    entries: VecDeque<WindowEntry>,
    size_limit: usize,
    time_limit_secs: u64,
}

impl Default for Window {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE_LIMIT, DEFAULT_TIME_LIMIT_SECS)
    }
}

impl Window {
    pub fn new(size_limit: usize, time_limit_secs: u64) -> Self {
        Self {
            entries: VecDeque::new(),
            size_limit,
            time_limit_secs,
        }
    }

    /// Drop entries older than `time_limit_secs`. Called on every
    /// insert and exposed for an explicit expiry call (§3).
    pub fn expire(&mut self) {
        let now = now_unix();
        while let Some(front) = self.entries.front() {
            if now.saturating_sub(front.timestamp) > self.time_limit_secs {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn insert(&mut self, kind: EventKind, normalized_target: String, content_fingerprint: String) {
        self.expire();
        self.entries.push_back(WindowEntry {
            timestamp: now_unix(),
            kind,
            normalized_target,
            content_fingerprint,
        });
        while self.entries.len() > self.size_limit {
            self.entries.pop_front();
        }
    }

    /// Oldest-first scan, per the ordering guarantee in §5.
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = &WindowEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
