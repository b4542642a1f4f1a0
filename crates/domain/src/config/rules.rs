use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RulesConfig {
    #[serde(default = "d_max_file_operations")]
    pub max_file_operations: u32,
    #[serde(default = "d_max_bash_commands")]
    pub max_bash_commands: u32,
    #[serde(default)]
    pub require_documentation: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            max_file_operations: d_max_file_operations(),
            max_bash_commands: d_max_bash_commands(),
            require_documentation: false,
        }
    }
}

fn d_max_file_operations() -> u32 {
    200
}

fn d_max_bash_commands() -> u32 {
    100
}
