//! Tier-specific constants distinguishing Bypass from SuperAdmin so a
//! single [`crate::core::AuthCore`] implementation serves both (§9
//! open question: share one audited state machine instead of
//! duplicating it).

use std::time::Duration;

/// Per-tier parameters for an [`crate::core::AuthCore`] instantiation.
pub trait AuthProfile {
    /// Subdirectory name under the data dir (`bypass`, `superadmin`).
    const DIR_NAME: &'static str;
    /// Maximum token lifetime from issuance.
    fn max_duration() -> Duration;
    /// Maximum gap between successful activity checks before a token
    /// is treated as stale.
    fn inactivity_timeout() -> Duration;
}

pub struct BypassProfile;

impl AuthProfile for BypassProfile {
    const DIR_NAME: &'static str = "bypass";

    fn max_duration() -> Duration {
        Duration::from_secs(14_400) // 4h, per §4.6
    }

    fn inactivity_timeout() -> Duration {
        Duration::from_secs(1_800)
    }
}

pub struct SuperAdminProfile;

impl AuthProfile for SuperAdminProfile {
    const DIR_NAME: &'static str = "superadmin";

    fn max_duration() -> Duration {
        Duration::from_secs(900) // 15m, per §4.7
    }

    fn inactivity_timeout() -> Duration {
        Duration::from_secs(300)
    }
}
