//! Tool registry (§3, §4.1): a known `name -> handler_id` table plus
//! frequency tracking for unrecognised tool names, which are sanitised
//! before storage.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Conservative charset and bounded length for storing an otherwise
/// untrusted tool name.
const MAX_SANITIZED_LEN: usize = 64;

pub fn sanitize_tool_name(raw: &str) -> String {
    let filtered: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect();
    let truncated: String = filtered.chars().take(MAX_SANITIZED_LEN).collect();
    if truncated.is_empty() {
        "unknown".to_owned()
    } else {
        truncated
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnknownToolStats {
    pub first_seen: u64,
    pub last_seen: u64,
    pub count: u64,
}

const KNOWN_TOOLS: &[(&str, &str)] = &[
    ("Bash", "bash"),
    ("Write", "write"),
    ("Edit", "edit"),
    ("Read", "read"),
    ("Glob", "glob"),
    ("Grep", "grep"),
    ("Task", "task"),
    ("WebFetch", "web_fetch"),
    ("WebSearch", "web_search"),
];

pub struct ToolRegistry {
    known: HashMap<&'static str, &'static str>,
    unknown: RwLock<HashMap<String, UnknownToolStats>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            known: KNOWN_TOOLS.iter().copied().collect(),
            unknown: RwLock::new(HashMap::new()),
        }
    }

    /// The handler id for a known tool name, or `None` for anything
    /// not in the closed set of recognised tools.
    pub fn handler_id(&self, tool: &str) -> Option<&'static str> {
        self.known.get(tool).copied()
    }

    pub fn is_known(&self, tool: &str) -> bool {
        self.known.contains_key(tool)
    }

    /// Record an occurrence of an unknown tool name, sanitising it
    /// first. Returns the updated stats.
    pub fn record_unknown(&self, tool: &str) -> UnknownToolStats {
        let key = sanitize_tool_name(tool);
        let now = now_unix();
        let mut guard = self.unknown.write();
        let entry = guard.entry(key).or_insert(UnknownToolStats {
            first_seen: now,
            last_seen: now,
            count: 0,
        });
        entry.count += 1;
        entry.last_seen = now;
        *entry
    }

    pub fn unknown_stats(&self, tool: &str) -> Option<UnknownToolStats> {
        let key = sanitize_tool_name(tool);
        self.unknown.read().get(&key).copied()
    }

    pub fn unknown_tool_count(&self) -> usize {
        self.unknown.read().len()
    }
}
