//! Session manager (§4.9): session id, metrics, event log, duration,
//! save/restore/archive/end.
//!
//! Grounded in the gateway's `SessionStore` — a JSON file behind an
//! `RwLock`, reloaded on start and flushed on demand — narrowed from a
//! map of many concurrent sessions down to the one session a guard
//! process owns for its lifetime.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use wow_domain::error::{Error, Result};

use crate::event::{EventLog, EventRecord};
use crate::session_id::generate_session_id;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub metrics: HashMap<String, i64>,
}

impl Session {
    fn new(id: String) -> Self {
        Self {
            id,
            started_at: Utc::now(),
            metrics: HashMap::new(),
        }
    }
}

/// Owns the active session, its metrics file, and its event log.
pub struct SessionManager {
    sessions_root: PathBuf,
    session: RwLock<Session>,
    events: EventLog,
}

fn metrics_path(session_dir: &Path) -> PathBuf {
    session_dir.join("metrics.json")
}

impl SessionManager {
    /// Start a brand new session under `state_dir/sessions/<id>/`.
    pub fn start(state_dir: &Path) -> Result<Self> {
        let sessions_root = state_dir.join("sessions");
        let id = generate_session_id();
        let session_dir = sessions_root.join(&id);
        std::fs::create_dir_all(&session_dir).map_err(Error::Io)?;

        let manager = Self {
            sessions_root,
            session: RwLock::new(Session::new(id.clone())),
            events: EventLog::new(&session_dir),
        };

        manager.record_event("session_start", None)?;
        tracing::info!(session_id = %id, "session started");
        Ok(manager)
    }

    /// Restore a previously saved session by id, picking metrics back
    /// up from `metrics.json` and continuing to append to its event log.
    pub fn restore(state_dir: &Path, id: &str) -> Result<Self> {
        let sessions_root = state_dir.join("sessions");
        let session_dir = sessions_root.join(id);
        let path = metrics_path(&session_dir);

        let session = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(Error::Io)?;
            serde_json::from_str(&raw).map_err(Error::Json)?
        } else {
            Session::new(id.to_owned())
        };

        let manager = Self {
            sessions_root,
            session: RwLock::new(session),
            events: EventLog::new(&session_dir),
        };
        manager.record_event("session_restore", None)?;
        Ok(manager)
    }

    pub fn id(&self) -> String {
        self.session.read().id.clone()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.session.read().started_at
    }

    pub fn session_dir(&self) -> PathBuf {
        self.sessions_root.join(self.id())
    }

    /// Bump a monotonic counter and return its new value.
    pub fn increment_metric(&self, name: &str, by: i64) -> i64 {
        let mut session = self.session.write();
        let entry = session.metrics.entry(name.to_owned()).or_insert(0);
        *entry += by;
        *entry
    }

    pub fn metric(&self, name: &str) -> i64 {
        self.session.read().metrics.get(name).copied().unwrap_or(0)
    }

    pub fn record_event(&self, kind: &str, payload: Option<serde_json::Value>) -> Result<()> {
        self.events.append(&EventRecord::new(kind, payload))
    }

    pub fn events(&self) -> Result<Vec<EventRecord>> {
        self.events.read()
    }

    /// Persist `metrics.json` for the current session.
    pub fn save(&self) -> Result<()> {
        let session_dir = self.session_dir();
        std::fs::create_dir_all(&session_dir).map_err(Error::Io)?;
        let session = self.session.read();
        let json = serde_json::to_string_pretty(&*session).map_err(Error::Json)?;
        std::fs::write(metrics_path(&session_dir), json).map_err(Error::Io)?;
        Ok(())
    }

    /// Move the session directory under a date-keyed archive directory.
    /// Returns the archived path.
    pub fn archive(&self) -> Result<PathBuf> {
        self.save()?;
        let date = self.started_at().format("%Y-%m-%d").to_string();
        let archive_root = self.sessions_root.join("archive").join(&date);
        std::fs::create_dir_all(&archive_root).map_err(Error::Io)?;

        let from = self.session_dir();
        let to = archive_root.join(self.id());
        std::fs::rename(&from, &to).map_err(Error::Io)?;
        tracing::info!(session_id = %self.id(), path = %to.display(), "session archived");
        Ok(to)
    }

    /// Save, record an `end` event, and archive. Returns the final
    /// archived path.
    pub fn end(&self) -> Result<PathBuf> {
        self.record_event("session_end", None)?;
        self.archive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_creates_session_dir_and_start_event() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = SessionManager::start(dir.path()).unwrap();
        assert!(mgr.session_dir().exists());
        let events = mgr.events().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, "session_start");
    }

    #[test]
    fn increment_metric_accumulates() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = SessionManager::start(dir.path()).unwrap();
        assert_eq!(mgr.increment_metric("bash_commands", 1), 1);
        assert_eq!(mgr.increment_metric("bash_commands", 1), 2);
        assert_eq!(mgr.metric("bash_commands"), 2);
        assert_eq!(mgr.metric("never_touched"), 0);
    }

    #[test]
    fn save_then_restore_recovers_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = SessionManager::start(dir.path()).unwrap();
        mgr.increment_metric("warnings", 3);
        mgr.save().unwrap();
        let id = mgr.id();

        let restored = SessionManager::restore(dir.path(), &id).unwrap();
        assert_eq!(restored.metric("warnings"), 3);
        assert_eq!(restored.id(), id);
    }

    #[test]
    fn end_archives_under_date_keyed_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = SessionManager::start(dir.path()).unwrap();
        let id = mgr.id();
        let archived = mgr.end().unwrap();

        assert!(archived.exists());
        assert!(!dir.path().join("sessions").join(&id).exists());
        let date = mgr.started_at().format("%Y-%m-%d").to_string();
        assert!(archived.starts_with(dir.path().join("sessions").join("archive").join(date)));
    }
}
