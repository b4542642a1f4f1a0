//! Generic authentication state machine shared by Bypass and
//! SuperAdmin (§4.6, §4.7). Both cores have the identical contract —
//! hash/verify passphrase, issue/verify token, rate-limit failures,
//! own a private directory of files — differing only in durations and
//! directory name, which [`crate::profile::AuthProfile`] supplies.

use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::atomic::{ensure_dir_mode, read_if_present, remove_if_present, write_atomic};
use crate::failures::{check_rate_limit, FailureRecord, RateLimit};
use crate::passphrase::{hash_passphrase, verify_passphrase};
use crate::profile::AuthProfile;
use crate::token::{now_unix, verify_token, Token, TokenVerdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    NotConfigured,
    Protected,
    Active,
    LockedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Allow,
    Reject,
    NotConfigured,
}

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("no passphrase configured")]
    NotConfigured,
    #[error("wrong passphrase")]
    WrongPassphrase,
    #[error("rate limited: wait {0}s")]
    RateLimited(u64),
    #[error("rate limited: permanently locked out, reset_failures required")]
    PermanentlyLockedOut,
    #[error("token expired")]
    ExpiredToken,
    #[error("token tampered or passphrase rotated")]
    TamperedToken,
    #[error("inactivity timeout")]
    InactivityTimeout,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// One instantiation of the auth state machine, rooted at
/// `<data_dir>/<P::DIR_NAME>/`.
pub struct AuthCore<P: AuthProfile> {
    dir: PathBuf,
    _profile: PhantomData<P>,
}

impl<P: AuthProfile> AuthCore<P> {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            dir: data_dir.join(P::DIR_NAME),
            _profile: PhantomData,
        }
    }

    fn hash_path(&self) -> PathBuf {
        self.dir.join("passphrase.hash")
    }

    fn token_path(&self) -> PathBuf {
        self.dir.join("active.token")
    }

    fn activity_path(&self) -> PathBuf {
        self.dir.join("last_activity")
    }

    fn failures_path(&self) -> PathBuf {
        self.dir.join("failures.json")
    }

    fn read_hash_line(&self) -> Option<String> {
        read_if_present(&self.hash_path())
            .ok()
            .flatten()
            .map(|s| s.trim().to_owned())
    }

    fn read_failures(&self) -> FailureRecord {
        read_if_present(&self.failures_path())
            .ok()
            .flatten()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    fn write_failures(&self, record: &FailureRecord) -> std::io::Result<()> {
        let json = serde_json::to_vec(record).expect("FailureRecord always serializes");
        write_atomic(&self.failures_path(), &json, 0o600)
    }

    /// Mutate the failures file under a short advisory lock so
    /// concurrent invocations never lose an increment (§5).
    fn with_failures_locked<T>(&self, f: impl FnOnce(&mut FailureRecord) -> T) -> std::io::Result<T> {
        ensure_dir_mode(&self.dir, 0o700)?;
        let lock_path = self.dir.join(".failures.lock");
        let lock_file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)?;
        lock_file.lock_exclusive()?;
        let mut record = self.read_failures();
        let result = f(&mut record);
        self.write_failures(&record)?;
        FileExt::unlock(&lock_file)?;
        Ok(result)
    }

    /// Set (or rotate) the passphrase. Rotating invalidates any
    /// outstanding token (its HMAC is keyed on the old hash line).
    pub fn set_passphrase(&self, passphrase: &str) -> std::io::Result<()> {
        ensure_dir_mode(&self.dir, 0o700)?;
        let line = hash_passphrase(passphrase);
        write_atomic(&self.hash_path(), line.as_bytes(), 0o600)
    }

    pub fn verify_passphrase(&self, passphrase: &str) -> VerifyOutcome {
        match self.read_hash_line() {
            None => VerifyOutcome::NotConfigured,
            Some(line) => {
                if verify_passphrase(passphrase, &line) {
                    VerifyOutcome::Allow
                } else {
                    VerifyOutcome::Reject
                }
            }
        }
    }

    fn touch_activity(&self) -> std::io::Result<()> {
        write_atomic(&self.activity_path(), now_unix().to_string().as_bytes(), 0o600)
    }

    fn read_activity(&self) -> u64 {
        read_if_present(&self.activity_path())
            .ok()
            .flatten()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0)
    }

    fn read_token(&self) -> Option<Token> {
        read_if_present(&self.token_path()).ok().flatten().and_then(|s| Token::parse(s.trim()))
    }

    /// Current observable state (§4.6).
    pub fn state(&self) -> AuthState {
        let hash_line = match self.read_hash_line() {
            Some(h) => h,
            None => return AuthState::NotConfigured,
        };

        if check_rate_limit(&self.read_failures()) == RateLimit::Permanent {
            return AuthState::LockedOut;
        }

        match self.read_token() {
            Some(token) => {
                let verdict = verify_token(&token, &hash_line, self.read_activity(), P::inactivity_timeout().as_secs());
                if verdict == TokenVerdict::Valid {
                    AuthState::Active
                } else {
                    AuthState::Protected
                }
            }
            None => AuthState::Protected,
        }
    }

    /// Verify a passphrase attempt, issue a fresh token on success,
    /// initialise activity and reset the failure counter.
    pub fn activate(&self, passphrase: &str) -> Result<(), AuthError> {
        let limit = check_rate_limit(&self.read_failures());
        match limit {
            RateLimit::Permanent => return Err(AuthError::PermanentlyLockedOut),
            RateLimit::Wait(secs) => return Err(AuthError::RateLimited(secs)),
            RateLimit::Ok => {}
        }

        let hash_line = self.read_hash_line().ok_or(AuthError::NotConfigured)?;
        if !verify_passphrase(passphrase, &hash_line) {
            self.record_failure()?;
            return Err(AuthError::WrongPassphrase);
        }

        let token = Token::issue(&hash_line, P::max_duration().as_secs());
        ensure_dir_mode(&self.dir, 0o700)?;
        write_atomic(&self.token_path(), token.to_line().as_bytes(), 0o600)?;
        self.touch_activity()?;
        self.reset_failures()?;
        Ok(())
    }

    /// Idempotent: removes the token and activity files if present.
    pub fn deactivate(&self) -> std::io::Result<()> {
        remove_if_present(&self.token_path())?;
        remove_if_present(&self.activity_path())
    }

    /// `true` iff a valid, unexpired, recently-active token exists.
    /// Auto-deactivates on detecting an expired/tampered token.
    pub fn is_active(&self) -> bool {
        let Some(hash_line) = self.read_hash_line() else {
            return false;
        };
        let Some(token) = self.read_token() else {
            return false;
        };
        let verdict = verify_token(&token, &hash_line, self.read_activity(), P::inactivity_timeout().as_secs());
        match verdict {
            TokenVerdict::Valid => {
                let _ = self.touch_activity();
                true
            }
            _ => {
                let _ = self.deactivate();
                false
            }
        }
    }

    pub fn record_failure(&self) -> std::io::Result<()> {
        self.with_failures_locked(|record| record.record())
    }

    pub fn reset_failures(&self) -> std::io::Result<()> {
        self.with_failures_locked(|record| record.reset())
    }

    pub fn check_rate_limit(&self) -> RateLimit {
        check_rate_limit(&self.read_failures())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::BypassProfile;

    fn core(dir: &Path) -> AuthCore<BypassProfile> {
        AuthCore::new(dir)
    }

    #[test]
    fn not_configured_before_any_passphrase_is_set() {
        let dir = tempfile::tempdir().unwrap();
        let auth = core(dir.path());
        assert_eq!(auth.state(), AuthState::NotConfigured);
        assert_eq!(auth.verify_passphrase("x"), VerifyOutcome::NotConfigured);
    }

    #[test]
    fn protected_after_passphrase_set_with_no_token() {
        let dir = tempfile::tempdir().unwrap();
        let auth = core(dir.path());
        auth.set_passphrase("swordfish").unwrap();
        assert_eq!(auth.state(), AuthState::Protected);
    }

    #[test]
    fn activate_then_is_active_then_deactivate_leaves_no_artefacts() {
        let dir = tempfile::tempdir().unwrap();
        let auth = core(dir.path());
        auth.set_passphrase("swordfish").unwrap();
        auth.activate("swordfish").unwrap();
        assert!(auth.is_active());
        assert_eq!(auth.state(), AuthState::Active);

        auth.deactivate().unwrap();
        assert!(!auth.token_path().exists());
        assert!(!auth.activity_path().exists());
        assert_eq!(auth.state(), AuthState::Protected);
    }

    #[test]
    fn wrong_passphrase_is_rejected_and_recorded_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let auth = core(dir.path());
        auth.set_passphrase("swordfish").unwrap();
        let err = auth.activate("wrong").unwrap_err();
        assert!(matches!(err, AuthError::WrongPassphrase));
        assert_eq!(auth.read_failures().count, 1);
    }

    #[test]
    fn ten_failures_locks_out_permanently() {
        let dir = tempfile::tempdir().unwrap();
        let auth = core(dir.path());
        auth.set_passphrase("swordfish").unwrap();
        for _ in 0..10 {
            let _ = auth.activate("wrong");
        }
        assert_eq!(auth.state(), AuthState::LockedOut);
    }

    #[test]
    fn rotating_passphrase_invalidates_outstanding_token() {
        let dir = tempfile::tempdir().unwrap();
        let auth = core(dir.path());
        auth.set_passphrase("first").unwrap();
        auth.activate("first").unwrap();
        assert!(auth.is_active());

        auth.set_passphrase("second").unwrap();
        assert!(!auth.is_active());
    }
}
