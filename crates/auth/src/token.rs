//! v2 bearer token: `version:created:expires:hmac` (§3: "Bypass/SuperAdmin
//! token"). The HMAC is SHA-512 keyed by the *current* passphrase hash
//! line, so rotating the passphrase invalidates every outstanding
//! token — the key dependency is the whole point, not an oversight.

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

pub const TOKEN_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub version: u32,
    pub created: u64,
    pub expires: u64,
    pub hmac_hex: String,
}

pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn compute_hmac(version: u32, created: u64, expires: u64, key_hash_line: &str) -> String {
    let message = format!("{version}:{created}:{expires}");
    let mut mac = HmacSha512::new_from_slice(key_hash_line.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

impl Token {
    /// Issue a fresh token bound to `key_hash_line` (the `salt:hash`
    /// passphrase line), expiring `ttl_seconds` from now.
    pub fn issue(key_hash_line: &str, ttl_seconds: u64) -> Self {
        let created = now_unix();
        let expires = created + ttl_seconds;
        let hmac_hex = compute_hmac(TOKEN_VERSION, created, expires, key_hash_line);
        Self {
            version: TOKEN_VERSION,
            created,
            expires,
            hmac_hex,
        }
    }

    pub fn to_line(&self) -> String {
        format!("{}:{}:{}:{}", self.version, self.created, self.expires, self.hmac_hex)
    }

    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.trim().splitn(4, ':');
        let version: u32 = parts.next()?.parse().ok()?;
        let created: u64 = parts.next()?.parse().ok()?;
        let expires: u64 = parts.next()?.parse().ok()?;
        let hmac_hex = parts.next()?.to_owned();
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            version,
            created,
            expires,
            hmac_hex,
        })
    }

    /// Whether the HMAC recomputes against `key_hash_line`. Does not
    /// check expiry or inactivity — see [`TokenVerdict`].
    pub fn hmac_valid(&self, key_hash_line: &str) -> bool {
        if self.version != TOKEN_VERSION {
            return false;
        }
        let expected = compute_hmac(self.version, self.created, self.expires, key_hash_line);
        // Constant-time-ish via length-prefixed equality is unnecessary
        // here since hex digests are fixed-length; a straight compare
        // is standard for HMAC verification once lengths match.
        expected.len() == self.hmac_hex.len() && expected == self.hmac_hex
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenVerdict {
    Valid,
    Tampered,
    Expired,
    InactivityTimeout,
}

/// Full validity check: HMAC recomputes, not expired, and activity is
/// fresh enough (§3: token validity invariant).
pub fn verify_token(token: &Token, key_hash_line: &str, last_activity: u64, inactivity_timeout: u64) -> TokenVerdict {
    if !token.hmac_valid(key_hash_line) {
        return TokenVerdict::Tampered;
    }
    let now = now_unix();
    if now >= token.expires {
        return TokenVerdict::Expired;
    }
    if now.saturating_sub(last_activity) >= inactivity_timeout {
        return TokenVerdict::InactivityTimeout;
    }
    TokenVerdict::Valid
}
