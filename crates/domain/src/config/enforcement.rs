use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnforcementConfig {
    #[serde(default = "d_true")]
    pub enabled: bool,
    #[serde(default)]
    pub strict_mode: bool,
    #[serde(default = "d_true")]
    pub block_on_violation: bool,
}

impl Default for EnforcementConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            strict_mode: false,
            block_on_violation: true,
        }
    }
}

fn d_true() -> bool {
    true
}
