//! In-memory, namespaced key/value store with JSON snapshotting.
//!
//! One process-wide `StateManager` replaces the associative maps the
//! original guard kept as globals (tool registry counts, session scratch
//! data, etc.) — every caller now holds an explicit `Arc<StateManager>`.

use std::collections::HashMap;
use std::path::Path;

use parking_lot::RwLock;
use serde_json::Value;

use wow_domain::error::{Error, Result};

/// Namespaced in-memory key/value store. Keys are stored flat as
/// `"namespace:key"`; `namespaced()` returns a thin view that prefixes
/// every call for callers that want a scoped handle.
pub struct StateManager {
    store: RwLock<HashMap<String, Value>>,
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StateManager {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
        }
    }

    pub fn set(&self, key: &str, value: Value) {
        self.store.write().insert(key.to_owned(), value);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.store.read().get(key).cloned()
    }

    /// Like `get`, but returns `default` instead of `None`.
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.store.read().contains_key(key)
    }

    /// Returns whether a value was actually removed.
    pub fn delete(&self, key: &str) -> bool {
        self.store.write().remove(key).is_some()
    }

    /// Atomically add `by` to the integer stored at `key` (0 if absent)
    /// and return the new value. Used for counters and sequences.
    pub fn increment(&self, key: &str, by: i64) -> i64 {
        let mut guard = self.store.write();
        let current = guard.get(key).and_then(Value::as_i64).unwrap_or(0);
        let next = current + by;
        guard.insert(key.to_owned(), Value::from(next));
        next
    }

    pub fn decrement(&self, key: &str, by: i64) -> i64 {
        self.increment(key, -by)
    }

    /// The next value of a monotonic sequence named `name`.
    pub fn next_sequence(&self, name: &str) -> i64 {
        self.increment(&format!("__seq:{name}"), 1)
    }

    /// Append `value` to the JSON array stored at `key`, creating it if
    /// absent. Returns an error if `key` holds a non-array value.
    pub fn append(&self, key: &str, value: Value) -> Result<()> {
        let mut guard = self.store.write();
        match guard.get_mut(key) {
            Some(Value::Array(arr)) => {
                arr.push(value);
                Ok(())
            }
            Some(other) => Err(Error::Other(format!(
                "cannot append to non-array value at '{key}' ({other})"
            ))),
            None => {
                guard.insert(key.to_owned(), Value::Array(vec![value]));
                Ok(())
            }
        }
    }

    /// All keys, optionally restricted to those starting with `prefix`.
    pub fn keys(&self, prefix: Option<&str>) -> Vec<String> {
        let guard = self.store.read();
        let mut keys: Vec<String> = match prefix {
            Some(p) => guard.keys().filter(|k| k.starts_with(p)).cloned().collect(),
            None => guard.keys().cloned().collect(),
        };
        keys.sort();
        keys
    }

    pub fn clear(&self) {
        self.store.write().clear();
    }

    /// Serialize the whole store to `path` as JSON (write-tmp-then-rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        let snapshot = self.store.read().clone();
        let json = serde_json::to_vec_pretty(&snapshot).map_err(Error::Json)?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, json).map_err(Error::Io)?;
        std::fs::rename(&tmp, path).map_err(Error::Io)?;
        Ok(())
    }

    /// Load a previously-saved snapshot, replacing the current contents.
    /// A missing file is treated as "absent": the store is left empty.
    pub fn load(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            self.store.write().clear();
            return Ok(());
        }
        let raw = std::fs::read_to_string(path).map_err(Error::Io)?;
        let snapshot: HashMap<String, Value> = serde_json::from_str(&raw).map_err(Error::Json)?;
        *self.store.write() = snapshot;
        Ok(())
    }

    /// A view scoped to a namespace prefix (`"ns:key"`).
    pub fn namespaced<'a>(&'a self, namespace: &str) -> Namespace<'a> {
        Namespace {
            state: self,
            prefix: format!("{namespace}:"),
        }
    }
}

/// A namespace-scoped handle onto a [`StateManager`].
pub struct Namespace<'a> {
    state: &'a StateManager,
    prefix: String,
}

impl Namespace<'_> {
    fn key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }

    pub fn set(&self, key: &str, value: Value) {
        self.state.set(&self.key(key), value)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.state.get(&self.key(key))
    }

    pub fn exists(&self, key: &str) -> bool {
        self.state.exists(&self.key(key))
    }

    pub fn delete(&self, key: &str) -> bool {
        self.state.delete(&self.key(key))
    }

    pub fn increment(&self, key: &str, by: i64) -> i64 {
        self.state.increment(&self.key(key), by)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_get_roundtrip() {
        let state = StateManager::new();
        state.set("foo", json!(42));
        assert_eq!(state.get("foo"), Some(json!(42)));
        assert!(state.exists("foo"));
        assert!(!state.exists("bar"));
    }

    #[test]
    fn get_or_default_when_missing() {
        let state = StateManager::new();
        assert_eq!(state.get_or("missing", json!("fallback")), json!("fallback"));
    }

    #[test]
    fn delete_reports_whether_removed() {
        let state = StateManager::new();
        state.set("a", json!(1));
        assert!(state.delete("a"));
        assert!(!state.delete("a"));
    }

    #[test]
    fn increment_and_decrement() {
        let state = StateManager::new();
        assert_eq!(state.increment("counter", 1), 1);
        assert_eq!(state.increment("counter", 5), 6);
        assert_eq!(state.decrement("counter", 2), 4);
    }

    #[test]
    fn sequences_are_monotonic() {
        let state = StateManager::new();
        assert_eq!(state.next_sequence("ids"), 1);
        assert_eq!(state.next_sequence("ids"), 2);
        assert_eq!(state.next_sequence("ids"), 3);
    }

    #[test]
    fn append_creates_and_extends_array() {
        let state = StateManager::new();
        state.append("log", json!("first")).unwrap();
        state.append("log", json!("second")).unwrap();
        assert_eq!(state.get("log"), Some(json!(["first", "second"])));
    }

    #[test]
    fn append_to_non_array_errors() {
        let state = StateManager::new();
        state.set("scalar", json!(1));
        assert!(state.append("scalar", json!(2)).is_err());
    }

    #[test]
    fn keys_filters_by_prefix() {
        let state = StateManager::new();
        state.set("ns:a", json!(1));
        state.set("ns:b", json!(2));
        state.set("other:c", json!(3));
        assert_eq!(state.keys(Some("ns:")), vec!["ns:a", "ns:b"]);
    }

    #[test]
    fn clear_removes_everything() {
        let state = StateManager::new();
        state.set("a", json!(1));
        state.clear();
        assert!(state.keys(None).is_empty());
    }

    #[test]
    fn save_then_load_is_observational_identity() {
        let state = StateManager::new();
        state.set("a", json!(1));
        state.set("b", json!({"nested": true}));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        state.save(&path).unwrap();

        let restored = StateManager::new();
        restored.load(&path).unwrap();

        assert_eq!(restored.get("a"), Some(json!(1)));
        assert_eq!(restored.get("b"), Some(json!({"nested": true})));
        assert_eq!(restored.keys(None), state.keys(None));
    }

    #[test]
    fn load_missing_file_leaves_store_empty() {
        let state = StateManager::new();
        state.set("a", json!(1));
        let dir = tempfile::tempdir().unwrap();
        state.load(&dir.path().join("does_not_exist.json")).unwrap();
        assert!(state.keys(None).is_empty());
    }

    #[test]
    fn namespaced_view_prefixes_keys() {
        let state = StateManager::new();
        let ns = state.namespaced("sessions");
        ns.set("a", json!(1));
        assert_eq!(state.get("sessions:a"), Some(json!(1)));
        assert_eq!(ns.get("a"), Some(json!(1)));
    }
}
