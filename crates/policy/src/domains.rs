//! Three-tier domain catalogue and URL/host validator used by the
//! WebFetch and WebSearch handlers.
//!
//! TIER 1 (compiled-in, never overridable) rejects loopback/private/
//! link-local/cloud-metadata literals the way the teacher's
//! `web_fetch::is_private_ip` does for outbound HTTP. TIER 2 is the
//! system-maintained safe list; TIER 3 is the user's custom safe/block
//! lists. Precedence: TIER1 > user-block > (system-safe or user-safe) >
//! unknown.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use wow_domain::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainDecision {
    Allow,
    Warn,
    Block,
}

#[derive(Debug, Clone)]
pub struct DomainVerdict {
    pub decision: DomainDecision,
    pub reason: String,
}

fn verdict(decision: DomainDecision, reason: impl Into<String>) -> DomainVerdict {
    DomainVerdict {
        decision,
        reason: reason.into(),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TIER 1: compiled-in critical block
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

const CRITICAL_HOST_LITERALS: &[&str] = &[
    "localhost",
    "metadata.google.internal",
    "metadata.azure.com",
    "169.254.169.254",
];

pub fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                || is_v4_shared_address(v4)
                || is_v4_documentation(v4)
                || is_v4_benchmarking(v4)
        }
        IpAddr::V6(v6) => {
            v6.is_loopback() || v6.is_unspecified() || is_v6_unique_local(v6) || is_v6_link_local(v6)
        }
    }
}

fn is_v4_shared_address(ip: &Ipv4Addr) -> bool {
    let o = ip.octets();
    o[0] == 100 && (o[1] & 0xC0) == 64
}

fn is_v4_documentation(ip: &Ipv4Addr) -> bool {
    let o = ip.octets();
    (o[0] == 192 && o[1] == 0 && o[2] == 2)
        || (o[0] == 198 && o[1] == 51 && o[2] == 100)
        || (o[0] == 203 && o[1] == 0 && o[2] == 113)
}

fn is_v4_benchmarking(ip: &Ipv4Addr) -> bool {
    let o = ip.octets();
    o[0] == 198 && (o[1] & 0xFE) == 18
}

fn is_v6_unique_local(ip: &Ipv6Addr) -> bool {
    (ip.segments()[0] & 0xFE00) == 0xFC00
}

fn is_v6_link_local(ip: &Ipv6Addr) -> bool {
    (ip.segments()[0] & 0xFFC0) == 0xFE80
}

fn is_critical(host: &str) -> bool {
    if CRITICAL_HOST_LITERALS.contains(&host) {
        return true;
    }
    if let Ok(ip) = host.parse::<IpAddr>() {
        return is_private_ip(&ip);
    }
    false
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Normalisation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Normalise a bare domain or a full URL down to a lowercase host with
/// scheme, userinfo, port, path and fragment stripped.
pub fn normalize_host(input: &str) -> std::result::Result<String, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("empty domain".into());
    }

    let host = if trimmed.contains("://") {
        let parsed = url::Url::parse(trimmed).map_err(|e| format!("invalid URL: {e}"))?;
        parsed
            .host_str()
            .ok_or_else(|| "URL has no host".to_string())?
            .to_owned()
    } else {
        // Bare "host[:port][/path]" forms without a scheme.
        let without_userinfo = trimmed.rsplit('@').next().unwrap_or(trimmed);
        let without_path = without_userinfo.split(['/', '?', '#']).next().unwrap_or("");
        if without_path.starts_with('[') {
            // bracketed IPv6 literal, optionally with a port
            without_path
                .split(']')
                .next()
                .map(|s| s.trim_start_matches('['))
                .unwrap_or(without_path)
                .to_owned()
        } else {
            without_path.rsplit_once(':').map(|(h, _)| h).unwrap_or(without_path).to_owned()
        }
    };

    let host = host.to_lowercase();
    let host = host.trim_end_matches('.').to_owned();

    if host.len() > 253 {
        return Err(format!("domain exceeds 253 characters ({})", host.len()));
    }
    if host.is_empty() {
        return Err("empty host after normalisation".into());
    }
    if !host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == ':')
    {
        return Err(format!("host contains non-DNS characters: '{host}'"));
    }

    Ok(host)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// List files
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Default)]
pub struct DomainList {
    exact: HashSet<String>,
    wildcards: Vec<String>,
}

impl DomainList {
    /// Parse a list file: one entry per line, `#` comments, blank lines
    /// ignored, `*.example.com` wildcard prefixes, case-insensitive.
    /// Corrupt (non-DNS) lines are skipped with a diagnostic rather than
    /// failing the whole file. Symlinked files and `..`-shaped entries
    /// are rejected outright.
    pub fn load(path: &Path) -> Result<Self> {
        let meta = std::fs::symlink_metadata(path).map_err(Error::Io)?;
        if meta.file_type().is_symlink() {
            return Err(Error::Config(format!(
                "domain list '{}' is a symlink, refusing to load",
                path.display()
            )));
        }

        let raw = std::fs::read_to_string(path).map_err(Error::Io)?;
        let mut list = DomainList::default();
        for (lineno, line) in raw.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if trimmed.contains("..") {
                tracing::warn!(file = %path.display(), line = lineno + 1, "skipping path-traversal-shaped domain entry");
                continue;
            }
            let lower = trimmed.to_lowercase();
            if let Some(suffix) = lower.strip_prefix("*.") {
                if suffix.is_empty() {
                    tracing::warn!(file = %path.display(), line = lineno + 1, "skipping malformed wildcard entry");
                    continue;
                }
                list.wildcards.push(suffix.to_owned());
            } else {
                list.exact.insert(lower);
            }
        }
        Ok(list)
    }

    pub fn contains(&self, host: &str) -> bool {
        if self.exact.contains(host) {
            return true;
        }
        self.wildcards
            .iter()
            .any(|suffix| host != *suffix && host.ends_with(suffix) && host.ends_with(&format!(".{suffix}")))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Validator
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Holds the mutable TIER 2/3 lists behind double-buffered pointers:
/// a reload parses into a fresh `DomainList` and then swaps the `Arc`
/// under a short write lock, so readers never observe a half-parsed
/// list.
pub struct DomainValidator {
    system_safe: RwLock<Arc<DomainList>>,
    system_blocked: RwLock<Arc<DomainList>>,
    custom_safe: RwLock<Arc<DomainList>>,
    custom_blocked: RwLock<Arc<DomainList>>,
}

impl Default for DomainValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainValidator {
    pub fn new() -> Self {
        Self {
            system_safe: RwLock::new(Arc::new(DomainList::default())),
            system_blocked: RwLock::new(Arc::new(DomainList::default())),
            custom_safe: RwLock::new(Arc::new(DomainList::default())),
            custom_blocked: RwLock::new(Arc::new(DomainList::default())),
        }
    }

    pub fn reload_system_safe(&self, path: &Path) -> Result<()> {
        let fresh = DomainList::load(path)?;
        *self.system_safe.write() = Arc::new(fresh);
        Ok(())
    }

    pub fn reload_system_blocked(&self, path: &Path) -> Result<()> {
        let fresh = DomainList::load(path)?;
        *self.system_blocked.write() = Arc::new(fresh);
        Ok(())
    }

    pub fn reload_custom_safe(&self, path: &Path) -> Result<()> {
        let fresh = DomainList::load(path)?;
        *self.custom_safe.write() = Arc::new(fresh);
        Ok(())
    }

    pub fn reload_custom_blocked(&self, path: &Path) -> Result<()> {
        let fresh = DomainList::load(path)?;
        *self.custom_blocked.write() = Arc::new(fresh);
        Ok(())
    }

    /// Validate a bare domain or full URL. `interactive` selects the
    /// behaviour for domains of unknown standing; non-interactive mode
    /// (the only one in core scope) always yields WARN for unknowns.
    pub fn validate(&self, domain_or_url: &str, interactive: bool) -> DomainVerdict {
        let host = match normalize_host(domain_or_url) {
            Ok(h) => h,
            Err(e) => return verdict(DomainDecision::Block, format!("invalid domain: {e}")),
        };

        if is_critical(&host) {
            return verdict(
                DomainDecision::Block,
                format!("TIER 1: '{host}' is a loopback/private/link-local/metadata address"),
            );
        }

        if self.custom_blocked.read().contains(&host) {
            return verdict(DomainDecision::Block, format!("'{host}' is on the custom blocked list"));
        }
        if self.system_blocked.read().contains(&host) {
            return verdict(DomainDecision::Block, format!("'{host}' is on the system blocked list"));
        }

        if self.system_safe.read().contains(&host) || self.custom_safe.read().contains(&host) {
            return verdict(DomainDecision::Allow, format!("'{host}' is on a safe list"));
        }

        if interactive {
            verdict(DomainDecision::Warn, format!("'{host}' is unrecognised; prompting is out of core scope"))
        } else {
            verdict(DomainDecision::Warn, format!("'{host}' is unrecognised"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_list(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn normalization_is_scheme_port_path_insensitive() {
        assert_eq!(normalize_host("https://D/p").unwrap(), "d");
        assert_eq!(normalize_host("http://D:443/p/").unwrap(), "d");
        assert_eq!(normalize_host("d").unwrap(), "d");
    }

    #[test]
    fn rejects_over_253_chars_accepts_253() {
        let host253 = "a".repeat(249) + ".com"; // 253 chars total
        assert_eq!(host253.len(), 253);
        assert!(normalize_host(&host253).is_ok());

        let host254 = "a".repeat(250) + ".com";
        assert_eq!(host254.len(), 254);
        assert!(normalize_host(&host254).is_err());
    }

    #[test]
    fn wildcard_matches_strict_subdomains_only() {
        let mut list = DomainList::default();
        list.wildcards.push("example.com".to_owned());
        assert!(list.contains("a.example.com"));
        assert!(list.contains("x.y.example.com"));
        assert!(!list.contains("example.com"));
    }

    #[test]
    fn tier1_cannot_be_overridden_by_user_safe_list() {
        let dir = tempfile::tempdir().unwrap();
        let safe = write_list(dir.path(), "custom-safe.conf", "localhost\n");
        let validator = DomainValidator::new();
        validator.reload_custom_safe(&safe).unwrap();

        let v = validator.validate("localhost", false);
        assert_eq!(v.decision, DomainDecision::Block);
    }

    #[test]
    fn custom_blocked_wins_over_custom_safe_on_tie() {
        let dir = tempfile::tempdir().unwrap();
        let safe = write_list(dir.path(), "custom-safe.conf", "evil.example\n");
        let blocked = write_list(dir.path(), "custom-blocked.conf", "evil.example\n");
        let validator = DomainValidator::new();
        validator.reload_custom_safe(&safe).unwrap();
        validator.reload_custom_blocked(&blocked).unwrap();

        assert_eq!(validator.validate("evil.example", false).decision, DomainDecision::Block);
    }

    #[test]
    fn unknown_domain_warns_in_non_interactive_mode() {
        let validator = DomainValidator::new();
        assert_eq!(validator.validate("totally-unrecognised.example", false).decision, DomainDecision::Warn);
    }

    #[test]
    fn safe_listed_domain_allows() {
        let dir = tempfile::tempdir().unwrap();
        let safe = write_list(dir.path(), "system-safe.conf", "github.com\n*.github.com\n");
        let validator = DomainValidator::new();
        validator.reload_system_safe(&safe).unwrap();

        assert_eq!(validator.validate("https://github.com/foo", false).decision, DomainDecision::Allow);
        assert_eq!(validator.validate("api.github.com", false).decision, DomainDecision::Allow);
    }

    #[test]
    fn corrupt_lines_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_list(dir.path(), "custom-safe.conf", "# comment\n\ngood.example\n*.\nbad..entry\n");
        let list = DomainList::load(&path).unwrap();
        assert!(list.contains("good.example"));
        assert!(!list.contains("bad..entry"));
    }

    #[test]
    fn symlinked_list_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let real = write_list(dir.path(), "real.conf", "safe.example\n");
        let link = dir.path().join("link.conf");
        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(&real, &link).unwrap();
            assert!(DomainList::load(&link).is_err());
        }
    }

    #[test]
    fn private_ip_literal_is_critical() {
        let validator = DomainValidator::new();
        assert_eq!(validator.validate("http://169.254.169.254/", false).decision, DomainDecision::Block);
        assert_eq!(validator.validate("127.0.0.1", false).decision, DomainDecision::Block);
        assert_eq!(validator.validate("10.0.0.5", false).decision, DomainDecision::Block);
    }
}
