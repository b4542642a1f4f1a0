//! The content correlator: a bounded in-process window of recent
//! Write/Bash events used to detect multi-step attacks (§4.8). Scope
//! is strictly in-process (§9 "Correlator scope") — no cross-process
//! store is wired in here, by design.

pub mod patterns;
pub mod risk;
pub mod window;

pub use patterns::{CorrelationKind, Finding};
pub use risk::risk_score;
pub use window::{EventKind, Window, DEFAULT_SIZE_LIMIT, DEFAULT_TIME_LIMIT_SECS};

use std::path::Path;

use parking_lot::RwLock;
use sha2::{Digest, Sha256};

fn fingerprint(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Thread-safe façade over a [`Window`], exposing the record/check
/// operations the Bash and Write handlers call into.
pub struct Correlator {
    window: RwLock<Window>,
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE_LIMIT, DEFAULT_TIME_LIMIT_SECS)
    }
}

impl Correlator {
    pub fn new(size_limit: usize, time_limit_secs: u64) -> Self {
        Self {
            window: RwLock::new(Window::new(size_limit, time_limit_secs)),
        }
    }

    /// Record a Write and return a config-poisoning finding, if any —
    /// flagged unconditionally at write time regardless of follow-up.
    pub fn record_write(&self, target: &str, content: &str) -> Option<Finding> {
        let finding = patterns::check_write_time(target);
        self.window.write().insert(EventKind::Write, target.to_owned(), fingerprint(content));
        finding
    }

    /// Record a Bash invocation and check it against the window for a
    /// write-then-execute / download-then-execute / staged-building
    /// shape before inserting it.
    pub fn record_bash(&self, command: &str) -> Option<Finding> {
        let finding = {
            let window = self.window.read();
            patterns::check_bash(&window, command)
        };
        self.window.write().insert(EventKind::Bash, command.to_owned(), fingerprint(command));
        finding
    }

    pub fn risk_score(&self, target: &str, cwd: &Path) -> u32 {
        risk::risk_score(target, cwd, &self.window.read())
    }

    pub fn expire(&self) {
        self.window.write().expire();
    }

    pub fn len(&self) -> usize {
        self.window.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.read().is_empty()
    }
}
