//! Bash handler (§4.2): policy-catalogue evaluation, correlator
//! recording, and git commit message normalisation.

use std::sync::OnceLock;

use regex::Regex;

use wow_domain::{Decision, Invocation};
use wow_policy::PolicyTarget;

use crate::context::GuardContext;
use crate::router::ToolHandler;

pub struct BashHandler;

/// Remove anything outside a conservative ASCII/punctuation set —
/// strips emoji and other non-ASCII decoration from a commit message.
fn strip_emoji(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii() && (c.is_ascii_graphic() || *c == ' '))
        .collect::<String>()
        .trim()
        .to_owned()
}

/// Normalise a `git commit -m <msg>` invocation: strip emoji from the
/// message and inject `--author` if absent. Commands containing a
/// heredoc are returned unchanged — parsing around `<<` is unsafe to
/// attempt textually, so the raw command is preserved verbatim.
fn normalize_git_commit(command: &str) -> Option<String> {
    if !command.contains("git commit") || !command.contains("-m") {
        return None;
    }
    if command.contains("<<") {
        return None;
    }

    // Match the quoted -m argument; quote char is recorded via \1 but
    // regex crate has no backreferences, so match both quote kinds and
    // require the closing quote to match by post-filtering.
    let re = {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r#"-m\s*(['"])(.*?)(['"])"#).expect("valid regex"))
    };
    let caps = re.captures(command)?;
    let open = caps.get(1)?.as_str();
    let close = caps.get(3)?.as_str();
    if open != close {
        return None;
    }
    let original_message = caps.get(2)?.as_str();
    let whole_match = caps.get(0)?.as_str();

    let cleaned = strip_emoji(original_message);
    let replacement = format!("-m {open}{cleaned}{close}");
    let mut rewritten = command.replacen(whole_match, &replacement, 1);

    if !rewritten.contains("--author") {
        rewritten.push_str(" --author='Chude <chude@emeke.org>'");
    }

    Some(rewritten)
}

impl ToolHandler for BashHandler {
    fn handle(&self, ctx: &GuardContext<'_>, inv: &Invocation) -> Decision {
        let Some(command) = inv.command.as_deref() else {
            return Decision::block("Bash invocation missing 'command'");
        };

        let mut decision = ctx.policy.evaluate(
            &PolicyTarget::Command(command),
            wow_domain::Zone::General,
            false,
            ctx.elevation.bypass_active,
            ctx.elevation.superadmin_active,
        );

        if !decision.kind.is_blocking() {
            if let Some(finding) = ctx.correlator.record_bash(command) {
                decision = Decision::block(finding.reason);
            }
        } else {
            // Still feed the window so later commands can correlate
            // against this one, even though this one is itself blocked.
            let _ = ctx.correlator.record_bash(command);
        }

        if !decision.kind.is_blocking() {
            if let Some(rewritten_command) = normalize_git_commit(command) {
                if rewritten_command != command {
                    let rewritten_inv = inv.with_command(rewritten_command);
                    return Decision::allow_rewritten(decision.reason, rewritten_inv);
                }
            }
        }

        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use wow_auth::ElevationState;
    use wow_correlator::Correlator;
    use wow_policy::{DomainValidator, PolicyCatalogue, ZoneClassifier};
    use wow_state::StateManager;

    fn ctx<'a>(
        policy: &'a PolicyCatalogue,
        zones: &'a ZoneClassifier,
        domains: &'a DomainValidator,
        correlator: &'a Correlator,
        state: &'a StateManager,
    ) -> GuardContext<'a> {
        GuardContext {
            policy,
            zones,
            domains,
            correlator,
            state,
            elevation: ElevationState::default(),
            cwd: PathBuf::from("/home/u/project"),
            home_dir: Some(PathBuf::from("/home/u")),
            strict_mode: false,
            interactive: false,
        }
    }

    fn fixture() -> (PolicyCatalogue, ZoneClassifier, DomainValidator, Correlator, StateManager) {
        (
            PolicyCatalogue::standard(),
            ZoneClassifier::new("/opt/wow".into(), "/opt/wow/hook.sh".into(), None),
            DomainValidator::new(),
            Correlator::default(),
            StateManager::new(),
        )
    }

    #[test]
    fn fork_bomb_is_critical() {
        let (policy, zones, domains, correlator, state) = fixture();
        let c = ctx(&policy, &zones, &domains, &correlator, &state);
        let inv = Invocation::from_json(r#"{"tool":"Bash","command":":(){ :|:& };:"}"#).unwrap();
        let d = BashHandler.handle(&c, &inv);
        assert_eq!(d.kind, wow_domain::DecisionKind::Critical);
        assert!(d.reason.contains("fork bomb"));
    }

    #[test]
    fn git_commit_strips_emoji_and_adds_author() {
        let (policy, zones, domains, correlator, state) = fixture();
        let c = ctx(&policy, &zones, &domains, &correlator, &state);
        let inv = Invocation::from_json(r#"{"tool":"Bash","command":"git commit -m '🚀 Initial'"}"#).unwrap();
        let d = BashHandler.handle(&c, &inv);
        assert_eq!(d.kind, wow_domain::DecisionKind::Allow);
        let rewritten = d.rewritten.expect("expected a rewritten invocation");
        assert_eq!(
            rewritten.command.as_deref(),
            Some("git commit -m 'Initial' --author='Chude <chude@emeke.org>'")
        );
    }

    #[test]
    fn existing_author_flag_is_not_duplicated() {
        let (policy, zones, domains, correlator, state) = fixture();
        let c = ctx(&policy, &zones, &domains, &correlator, &state);
        let inv = Invocation::from_json(
            r#"{"tool":"Bash","command":"git commit -m 'fix' --author='Someone <s@example.com>'"}"#,
        )
        .unwrap();
        let d = BashHandler.handle(&c, &inv);
        let rewritten = d.rewritten.unwrap();
        assert_eq!(rewritten.command.as_deref().unwrap().matches("--author").count(), 1);
    }

    #[test]
    fn heredoc_commands_pass_through_verbatim() {
        let (policy, zones, domains, correlator, state) = fixture();
        let c = ctx(&policy, &zones, &domains, &correlator, &state);
        let command = "git commit -m 'x' <<'EOF'\nbody\nEOF";
        let inv = Invocation::from_json(&serde_json::json!({"tool": "Bash", "command": command}).to_string()).unwrap();
        let d = BashHandler.handle(&c, &inv);
        assert!(d.rewritten.is_none());
    }

    #[test]
    fn write_then_execute_sequence_blocks_second_command() {
        let (policy, zones, domains, correlator, state) = fixture();
        let c = ctx(&policy, &zones, &domains, &correlator, &state);
        correlator.record_write("/tmp/x.sh", "echo hi");
        let inv = Invocation::from_json(r#"{"tool":"Bash","command":"bash /tmp/x.sh"}"#).unwrap();
        let d = BashHandler.handle(&c, &inv);
        assert_eq!(d.kind, wow_domain::DecisionKind::Block);
        assert!(d.reason.contains("write-then-execute"));
    }

    #[test]
    fn safe_command_passes_through_unchanged() {
        let (policy, zones, domains, correlator, state) = fixture();
        let c = ctx(&policy, &zones, &domains, &correlator, &state);
        let inv = Invocation::from_json(r#"{"tool":"Bash","command":"ls -la"}"#).unwrap();
        let d = BashHandler.handle(&c, &inv);
        assert_eq!(d.kind, wow_domain::DecisionKind::Allow);
        assert!(d.rewritten.is_none());
    }
}
