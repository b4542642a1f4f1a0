//! Passphrase hashing and constant-time verification (§3: "Passphrase
//! hash"). Format is `salt:hash` where salt is 128 fresh CSPRNG bits
//! (32 lowercase hex chars) and hash is SHA-512 of `salt||passphrase`
//! (128 lowercase hex chars) — grounded on the bearer-token compare in
//! the teacher's `gateway/src/api/auth.rs`, generalised from SHA-256 to
//! SHA-512 and from a fixed secret to a salted passphrase.

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

/// `hash_passphrase("") ` and friends always match this shape.
pub const HASH_LINE_PATTERN_DESCRIPTION: &str = "^[a-f0-9]{32}:[a-f0-9]{128}$";

fn random_salt_hex() -> String {
    let mut bytes = [0u8; 16]; // 128 bits
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn sha512_hex(salt: &str, passphrase: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(salt.as_bytes());
    hasher.update(passphrase.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash a passphrase into a fresh `salt:hash` line. Two invocations on
/// the same passphrase always differ, because the salt is drawn from
/// an OS CSPRNG each time.
pub fn hash_passphrase(passphrase: &str) -> String {
    let salt = random_salt_hex();
    let hash = sha512_hex(&salt, passphrase);
    format!("{salt}:{hash}")
}

/// Verify `passphrase` against a stored `salt:hash` line using a
/// constant-time comparison on the hash portion, so a mistyped
/// passphrase of the right length doesn't leak timing information
/// about how many hex characters matched.
pub fn verify_passphrase(passphrase: &str, hash_line: &str) -> bool {
    let Some((salt, expected_hash)) = hash_line.split_once(':') else {
        return false;
    };
    let candidate_hash = sha512_hex(salt, passphrase);
    bool::from(candidate_hash.as_bytes().ct_eq(expected_hash.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn hash_matches_documented_shape() {
        let re = Regex::new(HASH_LINE_PATTERN_DESCRIPTION).unwrap();
        assert!(re.is_match(&hash_passphrase("correct horse battery staple")));
    }

    #[test]
    fn distinct_invocations_on_same_passphrase_differ() {
        let a = hash_passphrase("same");
        let b = hash_passphrase("same");
        assert_ne!(a, b, "salt randomness must make repeated hashes differ");
    }

    #[test]
    fn verify_accepts_correct_passphrase() {
        let line = hash_passphrase("hunter2");
        assert!(verify_passphrase("hunter2", &line));
    }

    #[test]
    fn verify_rejects_wrong_passphrase() {
        let line = hash_passphrase("hunter2");
        assert!(!verify_passphrase("hunter3", &line));
    }

    #[test]
    fn empty_passphrase_still_produces_well_formed_hash() {
        let re = Regex::new(HASH_LINE_PATTERN_DESCRIPTION).unwrap();
        let line = hash_passphrase("");
        assert!(re.is_match(&line));
        assert!(verify_passphrase("", &line));
    }

    #[test]
    fn thousand_character_passphrase_is_accepted() {
        let long = "a".repeat(1000);
        let line = hash_passphrase(&long);
        assert!(verify_passphrase(&long, &line));
    }

    #[test]
    fn malformed_hash_line_rejects_rather_than_panics() {
        assert!(!verify_passphrase("anything", "not-a-valid-line"));
    }
}
