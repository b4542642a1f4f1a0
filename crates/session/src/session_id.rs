//! Session id generation — `session_<ulid-like>` (§4.9).
//!
//! A UUIDv4 rather than a true ULID: the workspace already carries
//! `uuid` for this shape of id elsewhere, and a sortable-by-time id
//! buys nothing the event log's own timestamps don't already give us.

use uuid::Uuid;

pub fn generate_session_id() -> String {
    format!("session_{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_prefixed() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert_ne!(a, b);
        assert!(a.starts_with("session_"));
    }
}
