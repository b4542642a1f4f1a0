use serde::{Deserialize, Serialize};

use crate::invocation::Invocation;

/// The guard's verdict on an invocation, with its wire-level exit code.
///
/// Derived `Ord` follows the exit-code/severity order (`Allow < Warn <
/// Block < Critical < SuperadminRequired`), useful for picking the
/// more severe of two decisions. It is *not* the pattern-tier
/// precedence used to pick which tier's pattern set wins when several
/// match — that ordering (CRITICAL > SUPERADMIN-REQUIRED > ALWAYS-BLOCK
/// > ZONE-derived > WARN > ALLOW) is enforced explicitly by the policy
/// catalogue in `wow-policy`, by cascade order rather than by comparing
/// `DecisionKind` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    Allow = 0,
    Warn = 1,
    Block = 2,
    Critical = 3,
    SuperadminRequired = 4,
}

impl DecisionKind {
    /// Identity mapping to the hook's process exit code.
    pub fn exit_code(self) -> i32 {
        self as i32
    }

    pub fn is_blocking(self) -> bool {
        matches!(
            self,
            DecisionKind::Block | DecisionKind::Critical | DecisionKind::SuperadminRequired
        )
    }
}

/// A decision plus its human-readable reason and, for ALLOW/WARN, the
/// (possibly rewritten) invocation to emit on stdout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub kind: DecisionKind,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewritten: Option<Invocation>,
}

impl Decision {
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            kind: DecisionKind::Allow,
            reason: reason.into(),
            rewritten: None,
        }
    }

    pub fn allow_rewritten(reason: impl Into<String>, rewritten: Invocation) -> Self {
        Self {
            kind: DecisionKind::Allow,
            reason: reason.into(),
            rewritten: Some(rewritten),
        }
    }

    pub fn warn(reason: impl Into<String>) -> Self {
        Self {
            kind: DecisionKind::Warn,
            reason: reason.into(),
            rewritten: None,
        }
    }

    pub fn block(reason: impl Into<String>) -> Self {
        Self {
            kind: DecisionKind::Block,
            reason: reason.into(),
            rewritten: None,
        }
    }

    pub fn critical(reason: impl Into<String>) -> Self {
        Self {
            kind: DecisionKind::Critical,
            reason: reason.into(),
            rewritten: None,
        }
    }

    pub fn superadmin_required(reason: impl Into<String>) -> Self {
        Self {
            kind: DecisionKind::SuperadminRequired,
            reason: format!(
                "SuperAdmin authentication required: {}. Run `wow-guard superadmin activate` to unlock.",
                reason.into()
            ),
            rewritten: None,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }
}
