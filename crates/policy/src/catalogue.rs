//! Ordered security-policy catalogue (§4.3): the first tier whose
//! pattern set matches an invocation wins. Tier precedence is fixed by
//! construction, not by the caller — CRITICAL > SUPERADMIN-REQUIRED >
//! ALWAYS-BLOCK > ZONE-derived > WARN > ALLOW.

use regex::Regex;

use wow_domain::{Decision, Zone};

/// The string an invocation reduces to before catalogue evaluation: a
/// shell command line, or a canonicalised filesystem path.
pub enum PolicyTarget<'a> {
    Command(&'a str),
    Path(&'a str),
}

struct Pattern {
    regex: Regex,
    reason: &'static str,
}

fn pat(expr: &str, reason: &'static str) -> Pattern {
    Pattern {
        regex: Regex::new(expr).unwrap_or_else(|e| panic!("bad policy regex {expr:?}: {e}")),
        reason,
    }
}

pub struct PolicyCatalogue {
    critical_command: Vec<Pattern>,
    critical_path: Vec<Pattern>,
    always_block_command: Vec<Pattern>,
    warn_command: Vec<Pattern>,
    warn_path: Vec<Pattern>,
}

impl Default for PolicyCatalogue {
    fn default() -> Self {
        Self::standard()
    }
}

impl PolicyCatalogue {
    /// The built-in catalogue. Pattern order within a tier is an
    /// explicit invariant — do not reorder without re-checking the
    /// scenarios in spec §8.
    pub fn standard() -> Self {
        Self {
            critical_command: vec![
                pat(r":\(\)\s*\{\s*:\|:&\s*\}\s*;\s*:", "fork bomb literal"),
                pat(r"\brm\s+-[a-zA-Z]*rf[a-zA-Z]*\s+/(\s|$|\*)", "rm -rf on a protected root"),
                pat(r"\bmkfs(\.\w+)?\s+/dev/", "mkfs on a block device"),
                pat(r"\bdd\b[^\n]*\bof=/dev/(sd|nvme|hd|xvd)", "dd writing directly to a block device"),
                pat(
                    r"\b(curl|wget)\b[^\n]*169\.254\.169\.254",
                    "cloud metadata SSRF via curl/wget",
                ),
                pat(r">\s*/dev/sd[a-z]\b", "raw write to a block device"),
            ],
            critical_path: vec![
                pat(r"^/etc/shadow$", "write to /etc/shadow"),
                pat(r"^/etc/gshadow$", "write to /etc/gshadow"),
                pat(r"^/etc/sudoers(\.d/.*)?$", "write to /etc/sudoers"),
            ],
            always_block_command: vec![
                pat(r"\bchmod\s+(-R\s+)?777\s+/(\s|$)", "world-writable permissions on root"),
                pat(r"\biptables\s+-F\b", "flushing all firewall rules"),
                pat(r"\buserdel\s+-r\s+root\b", "deleting the root account"),
            ],
            warn_command: vec![
                pat(r"\bcurl\b[^\n]*\|\s*(ba)?sh\b", "piping a remote download directly into a shell"),
                pat(r"(?i)\bapi[_-]?key\b", "command line mentions an API key"),
                pat(r"(?i)\bpassword\s*=", "command line embeds a password literal"),
            ],
            warn_path: vec![
                pat(r"(?i)\.env$", "path targets a dotenv file"),
                pat(r"(?i)credentials\.json$", "path targets a credentials file"),
                pat(r"(?i)secrets\.ya?ml$", "path targets a secrets file"),
            ],
        }
    }

    /// Evaluate one invocation-derived target against the catalogue.
    ///
    /// `is_hook_entrypoint` distinguishes the guard's own hook entry
    /// point (always CRITICAL, §4.3 tier 1) from its other WOW_SELF
    /// files (SUPERADMIN-REQUIRED, tier 2) — both classify as
    /// [`Zone::WowSelf`] but only the former is unlockable by nobody.
    pub fn evaluate(
        &self,
        target: &PolicyTarget<'_>,
        zone: Zone,
        is_hook_entrypoint: bool,
        bypass_active: bool,
        superadmin_active: bool,
    ) -> Decision {
        if is_hook_entrypoint {
            return Decision::critical("modification of the guard's hook entrypoint is never permitted");
        }

        match target {
            PolicyTarget::Command(cmd) => {
                if let Some(p) = self.critical_command.iter().find(|p| p.regex.is_match(cmd)) {
                    return Decision::critical(p.reason);
                }
            }
            PolicyTarget::Path(path) => {
                if let Some(p) = self.critical_path.iter().find(|p| p.regex.is_match(path)) {
                    return Decision::critical(p.reason);
                }
            }
        }

        if zone == Zone::WowSelf {
            return if superadmin_active {
                Decision::allow("SuperAdmin active: WOW_SELF path permitted")
            } else {
                Decision::superadmin_required("target is a WOW_SELF path")
            };
        }

        if let PolicyTarget::Command(cmd) = target {
            if let Some(p) = self.always_block_command.iter().find(|p| p.regex.is_match(cmd)) {
                return if bypass_active {
                    Decision::allow(format!("Bypass active: {} permitted", p.reason))
                } else {
                    Decision::block(p.reason)
                };
            }
        }

        match zone {
            Zone::General => {}
            Zone::Development => {
                if !(bypass_active || superadmin_active) {
                    return Decision::block("DEVELOPMENT zone requires Bypass or SuperAdmin to be active");
                }
            }
            Zone::Config | Zone::Sensitive | Zone::System => {
                return if superadmin_active {
                    Decision::allow("SuperAdmin active: elevated zone permitted")
                } else {
                    Decision::superadmin_required("target is in a CONFIG/SENSITIVE/SYSTEM zone")
                };
            }
            Zone::WowSelf => unreachable!("handled above"),
        }

        match target {
            PolicyTarget::Command(cmd) => {
                if let Some(p) = self.warn_command.iter().find(|p| p.regex.is_match(cmd)) {
                    return Decision::warn(p.reason);
                }
            }
            PolicyTarget::Path(path) => {
                if let Some(p) = self.warn_path.iter().find(|p| p.regex.is_match(path)) {
                    return Decision::warn(p.reason);
                }
            }
        }

        Decision::allow("no policy tier matched")
    }
}
