use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single tool-use request from the assistant to the guard.
///
/// `tool` selects the handler; the remaining fields are tool-specific and
/// optional, mirroring the hook's JSON payload (see §6 of the spec). The
/// invocation is immutable inside the guard — handlers that want to change
/// it (e.g. stripping emoji from a commit message) produce a *new* value via
/// [`Invocation::with_command`] rather than mutating in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invocation {
    pub tool: String,

    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub output_mode: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub allowed_domains: Option<Vec<String>>,
    #[serde(default)]
    pub blocked_domains: Option<Vec<String>>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub subagent_type: Option<String>,

    /// Any field the hook sends that the guard doesn't model explicitly.
    /// Preserved so a rewritten invocation round-trips unknown fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Invocation {
    /// Parse a raw JSON invocation payload.
    ///
    /// Malformed JSON is the caller's concern (see §7): this just surfaces
    /// `serde_json::Error` so the caller can turn it into a BLOCK decision
    /// with a diagnostic.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Return a copy with `command` replaced. Used by the Bash handler to
    /// emit a normalized commit command without mutating the original.
    pub fn with_command(&self, command: String) -> Self {
        let mut next = self.clone();
        next.command = Some(command);
        next
    }

    /// Best-effort "target" string used by the correlator and zone
    /// classifier: the file path, the command, or the URL, whichever is
    /// present for this tool.
    pub fn target(&self) -> Option<&str> {
        self.file_path
            .as_deref()
            .or(self.path.as_deref())
            .or(self.command.as_deref())
            .or(self.url.as_deref())
    }
}
