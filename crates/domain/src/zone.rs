use serde::{Deserialize, Serialize};

/// Filesystem zone — an equivalence class of paths sharing an auth-tier
/// requirement. Classification itself (`wow_policy::zone::classify`) is a
/// pure function of a canonicalised path; this type is just the closed
/// enum plus the total `required_tier` mapping (§3, §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    General,
    Development,
    Config,
    Sensitive,
    System,
    WowSelf,
}

/// Auth tier required to operate on a zone (§3, §4.3 step 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AuthTier {
    /// No elevated auth required.
    General = 0,
    /// Bypass or SuperAdmin required.
    Development = 1,
    /// SuperAdmin required.
    Elevated = 2,
}

impl Zone {
    /// Total function mapping a zone to its required auth tier.
    pub const fn required_tier(self) -> AuthTier {
        match self {
            Zone::General => AuthTier::General,
            Zone::Development => AuthTier::Development,
            Zone::Config | Zone::Sensitive | Zone::System | Zone::WowSelf => AuthTier::Elevated,
        }
    }
}
