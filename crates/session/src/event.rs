//! Append-only JSONL event log (§4.9).
//!
//! Every session gets an `events.log` file under its session directory.
//! Each recorded event — a decision, a correlator finding, an
//! elevation change — is appended as one JSON line.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use wow_domain::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub ts: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl EventRecord {
    pub fn new(kind: impl Into<String>, payload: Option<serde_json::Value>) -> Self {
        Self {
            ts: Utc::now().to_rfc3339(),
            kind: kind.into(),
            payload,
        }
    }
}

pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    pub fn new(session_dir: &Path) -> Self {
        Self {
            path: session_dir.join("events.log"),
        }
    }

    pub fn append(&self, record: &EventRecord) -> Result<()> {
        use std::io::Write;

        let json = serde_json::to_string(record).map_err(Error::Json)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(Error::Io)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(Error::Io)?;
        writeln!(file, "{json}").map_err(Error::Io)?;
        Ok(())
    }

    pub fn read(&self) -> Result<Vec<EventRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let raw = std::fs::read_to_string(&self.path).map_err(Error::Io)?;
        let mut events = Vec::new();
        for line in raw.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<EventRecord>(line) {
                Ok(record) => events.push(record),
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "skipping malformed event line");
                }
            }
        }
        Ok(events)
    }
}
