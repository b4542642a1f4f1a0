mod dotted;
mod enforcement;
mod integrations;
mod rules;
mod scoring;

pub use enforcement::EnforcementConfig;
pub use integrations::{ClaudeCodeConfig, IntegrationsConfig};
pub use rules::RulesConfig;
pub use scoring::ScoringConfig;

use std::fmt;
use std::path::Path;

use serde_json::Value;

use crate::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// JSON configuration with dotted-path access, following the layout in
/// §6 of the spec: a `version` string plus `enforcement`, `scoring`,
/// `rules`, and `integrations.claude_code` sections. Unknown top-level
/// or nested keys are ignored by the typed accessors but preserved in
/// the raw value (so `merge`/`save` round-trip them).
#[derive(Debug, Clone)]
pub struct Config {
    raw: Value,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            raw: serde_json::json!({
                "version": "1.0.0",
                "enforcement": EnforcementConfig::default(),
                "scoring": ScoringConfig::default(),
                "rules": RulesConfig::default(),
                "integrations": IntegrationsConfig::default(),
            }),
        }
    }
}

impl Config {
    /// Parse a JSON configuration string. Malformed JSON is rejected here
    /// rather than deferred to first access (§7: "malformed JSON ...
    /// results in BLOCK with a diagnostic").
    pub fn from_str(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw).map_err(Error::Json)?;
        if !value.is_object() {
            return Err(Error::Config("top-level config must be a JSON object".into()));
        }
        Ok(Self { raw: value })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(Error::Io)?;
        Self::from_str(&raw)
    }

    pub fn to_json_string_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.raw).map_err(Error::Json)
    }

    /// Raw dotted-path lookup; returns `None` for any missing segment.
    pub fn get(&self, path: &str) -> Option<&Value> {
        dotted::get(&self.raw, path)
    }

    pub fn get_bool(&self, path: &str, default: bool) -> bool {
        self.get(path).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn get_int(&self, path: &str, default: i64) -> i64 {
        self.get(path).and_then(Value::as_i64).unwrap_or(default)
    }

    pub fn get_float(&self, path: &str, default: f64) -> f64 {
        self.get(path).and_then(Value::as_f64).unwrap_or(default)
    }

    pub fn get_str<'a>(&'a self, path: &str, default: &'a str) -> &'a str {
        self.get(path).and_then(Value::as_str).unwrap_or(default)
    }

    /// Set a value at a dotted path, creating intermediate objects.
    pub fn set(&mut self, path: &str, value: Value) {
        dotted::set(&mut self.raw, path, value);
    }

    /// Deep-merge `other` onto `self`; `other`'s values win on conflict.
    pub fn merge(&mut self, other: &Config) {
        dotted::merge(&mut self.raw, &other.raw);
    }

    pub fn version(&self) -> &str {
        self.get_str("version", "0.0.0")
    }

    pub fn enforcement(&self) -> EnforcementConfig {
        self.section_or_default("enforcement")
    }

    pub fn scoring(&self) -> ScoringConfig {
        self.section_or_default("scoring")
    }

    pub fn rules(&self) -> RulesConfig {
        self.section_or_default("rules")
    }

    pub fn integrations(&self) -> IntegrationsConfig {
        self.section_or_default("integrations")
    }

    fn section_or_default<T>(&self, path: &str) -> T
    where
        T: Default + serde::de::DeserializeOwned,
    {
        self.get(path)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    /// Validate the configuration and return a list of severity-tagged
    /// issues. An empty vec means the config is usable as-is.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.version().is_empty() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "version".into(),
                message: "version must not be empty".into(),
            });
        } else if self.version().split('.').count() != 3 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "version".into(),
                message: format!(
                    "version \"{}\" does not look like semver (major.minor.patch)",
                    self.version()
                ),
            });
        }

        let scoring = self.scoring();
        if scoring.threshold_warn > scoring.threshold_block {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "scoring.threshold_warn".into(),
                message: format!(
                    "threshold_warn ({}) must not exceed threshold_block ({})",
                    scoring.threshold_warn, scoring.threshold_block
                ),
            });
        }
        if !(0.0..=1.0).contains(&scoring.decay_rate) {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "scoring.decay_rate".into(),
                message: format!(
                    "decay_rate {} is outside the conventional [0,1] range",
                    scoring.decay_rate
                ),
            });
        }

        let rules = self.rules();
        if rules.max_file_operations == 0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "rules.max_file_operations".into(),
                message: "max_file_operations is 0 — every file operation will be refused".into(),
            });
        }
        if rules.max_bash_commands == 0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "rules.max_bash_commands".into(),
                message: "max_bash_commands is 0 — every bash invocation will be refused".into(),
            });
        }

        issues
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Validation issues
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
