//! The platform biometric probe (§4.7) is an external collaborator —
//! the concrete fingerprint/Face ID/Windows Hello call lives outside
//! core scope. This module only specifies the contract: whether a
//! biometric sensor is available, and the fallback path when it isn't
//! or when it fails.

/// Returns whether a platform biometric sensor is available. The core
/// has no platform integration; callers in the `wow-guard` binary may
/// override this via configuration once a real probe exists.
pub fn has_biometric() -> bool {
    false
}

/// Fallback strong-secondary-password path when biometric auth is
/// unavailable or declined — delegates straight to passphrase
/// verification, since the core defines no separate secondary secret.
pub fn fallback_auth(passphrase: &str, hash_line: &str) -> bool {
    crate::passphrase::verify_passphrase(passphrase, hash_line)
}
