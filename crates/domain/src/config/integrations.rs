use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct IntegrationsConfig {
    #[serde(default)]
    pub claude_code: ClaudeCodeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClaudeCodeConfig {
    #[serde(default = "d_true")]
    pub hooks_enabled: bool,
    #[serde(default = "d_true")]
    pub session_tracking: bool,
}

impl Default for ClaudeCodeConfig {
    fn default() -> Self {
        Self {
            hooks_enabled: true,
            session_tracking: true,
        }
    }
}

fn d_true() -> bool {
    true
}
