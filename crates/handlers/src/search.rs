//! Glob / Grep handlers (§4.2): block enumeration rooted at sensitive
//! directories, warn on overly broad or credential-shaped patterns.

use std::sync::OnceLock;

use regex::Regex;

use wow_domain::{Decision, Invocation};

use crate::context::GuardContext;
use crate::path_util::expand_tilde;
use crate::router::ToolHandler;

const SENSITIVE_ROOTS: &[&str] = &[
    "/etc", "/root", "/sys", "/proc", "/.ssh", "/.aws", "/.gnupg", "/.kube",
];

const CREDENTIAL_PATTERN_NEEDLES: &[&str] =
    &["id_rsa", "id_ed25519", ".env", "wallet.dat", "credentials", "secret", "password", "api_key", "api-key"];

fn pattern_root_is_sensitive(resolved: &str) -> bool {
    SENSITIVE_ROOTS.iter().any(|root| resolved.starts_with(root) || resolved.contains(&format!("{root}/")))
}

fn is_overly_broad(pattern: &str) -> bool {
    matches!(pattern, "**" | "**/*" | "/**/*" | "/**" | "**/*.*")
}

fn credential_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)password|api[_-]?key|secret|BEGIN[A-Z ]*PRIVATE KEY|mongodb://|postgres://"#)
            .expect("valid regex")
    })
}

fn evaluate_pattern(ctx: &GuardContext<'_>, raw_pattern: &str) -> Decision {
    let resolved = expand_tilde(raw_pattern, ctx.home_dir.as_deref());
    let resolved_str = resolved.to_string_lossy();

    if pattern_root_is_sensitive(&resolved_str) {
        return Decision::block(format!("pattern '{raw_pattern}' is rooted at a sensitive directory"));
    }

    if is_overly_broad(raw_pattern) {
        return Decision::warn(format!("pattern '{raw_pattern}' enumerates the entire filesystem"));
    }

    if CREDENTIAL_PATTERN_NEEDLES.iter().any(|needle| raw_pattern.to_lowercase().contains(needle)) {
        return Decision::warn(format!("pattern '{raw_pattern}' looks like it targets credential material"));
    }

    Decision::allow("search permitted")
}

pub struct GlobHandler;

impl ToolHandler for GlobHandler {
    fn handle(&self, ctx: &GuardContext<'_>, inv: &Invocation) -> Decision {
        let Some(pattern) = inv.pattern.as_deref() else {
            return Decision::block("Glob invocation missing 'pattern'");
        };
        evaluate_pattern(ctx, pattern)
    }
}

pub struct GrepHandler;

impl ToolHandler for GrepHandler {
    fn handle(&self, ctx: &GuardContext<'_>, inv: &Invocation) -> Decision {
        let Some(pattern) = inv.pattern.as_deref() else {
            return Decision::block("Grep invocation missing 'pattern'");
        };

        if let Some(path) = inv.path.as_deref() {
            let decision = evaluate_pattern(ctx, path);
            if decision.kind.is_blocking() {
                return decision;
            }
        }

        if credential_regex().is_match(pattern) {
            return Decision::warn(format!("regex '{pattern}' looks like a credential search"));
        }

        Decision::allow("search permitted")
    }
}
