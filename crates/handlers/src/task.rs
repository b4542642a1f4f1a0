//! Task handler (§4.2): inspects a subagent launch for meta-attacks —
//! self-replication, credential harvesting, exfiltration, recursive
//! spawning — rather than any single file or command target.

use std::sync::OnceLock;

use regex::Regex;

use wow_domain::{Decision, Invocation};

use crate::context::GuardContext;
use crate::router::ToolHandler;

fn meta_attack_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?i)spawn (itself|another copy|a new agent that spawns)|replicate itself|self-replicat|harvest (credentials|secrets|api keys)|exfiltrat|scan (the|this) network|without (any )?restrictions?|ignore (all )?(previous|prior) instructions"#,
        )
        .expect("valid regex")
    })
}

const SPAWN_BURST_THRESHOLD: i64 = 20;

pub struct TaskHandler;

impl ToolHandler for TaskHandler {
    fn handle(&self, ctx: &GuardContext<'_>, inv: &Invocation) -> Decision {
        let Some(prompt) = inv.prompt.as_deref() else {
            return Decision::block("Task invocation missing 'prompt'");
        };

        if meta_attack_regex().is_match(prompt) {
            return Decision::block("subagent prompt matches a known meta-attack pattern");
        }

        let subagent_type = inv.subagent_type.as_deref().unwrap_or("general-purpose");
        let spawns = ctx.state.namespaced("task_spawns").increment(subagent_type, 1);
        if spawns > SPAWN_BURST_THRESHOLD {
            return Decision::warn(format!(
                "'{subagent_type}' has been spawned {spawns} times this session; possible recursive loop"
            ));
        }

        Decision::allow("subagent launch permitted")
    }
}
