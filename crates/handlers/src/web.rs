//! WebFetch / WebSearch handlers (§4.2): host validation against the
//! three-tier domain catalogue, plus query inspection for WebSearch.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use wow_domain::{Decision, Invocation};
use wow_policy::domains::DomainDecision;

use crate::context::GuardContext;
use crate::router::ToolHandler;

fn host_from_target(raw: &str) -> Option<String> {
    if let Ok(url) = Url::parse(raw) {
        return url.host_str().map(str::to_owned);
    }
    Some(raw.to_owned())
}

fn pii_and_injection_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?i)\b\d{3}-\d{2}-\d{4}\b|\b(?:\d[ -]*?){13,16}\b|[\w.+-]+@[\w-]+\.[\w.-]+|<script|;\s*(rm|curl|wget)\b|'\s*OR\s*'1'\s*=\s*'1"#,
        )
        .expect("valid regex")
    })
}

fn evaluate_host(ctx: &GuardContext<'_>, raw_target: &str) -> Decision {
    if raw_target.starts_with("file://") {
        return Decision::block("file:// is not a valid fetch scheme");
    }
    if raw_target.starts_with("data:") {
        return Decision::block("data: URLs are not permitted");
    }

    let Some(host) = host_from_target(raw_target) else {
        return Decision::block(format!("could not determine a host for '{raw_target}'"));
    };

    let verdict = ctx.domains.validate(&host, ctx.interactive);
    match verdict.decision {
        DomainDecision::Allow => Decision::allow(verdict.reason),
        DomainDecision::Warn => Decision::warn(verdict.reason),
        DomainDecision::Block => Decision::block(verdict.reason),
    }
}

pub struct WebFetchHandler;

impl ToolHandler for WebFetchHandler {
    fn handle(&self, ctx: &GuardContext<'_>, inv: &Invocation) -> Decision {
        let Some(url) = inv.url.as_deref() else {
            return Decision::block("WebFetch invocation missing 'url'");
        };
        evaluate_host(ctx, url)
    }
}

pub struct WebSearchHandler;

impl ToolHandler for WebSearchHandler {
    fn handle(&self, ctx: &GuardContext<'_>, inv: &Invocation) -> Decision {
        let Some(query) = inv.query.as_deref() else {
            return Decision::block("WebSearch invocation missing 'query'");
        };

        if let Some(domains) = &inv.allowed_domains {
            for domain in domains {
                let decision = evaluate_host(ctx, domain);
                if decision.kind.is_blocking() {
                    return decision;
                }
            }
        }

        if let Some(domains) = &inv.blocked_domains {
            for domain in domains {
                let decision = evaluate_host(ctx, domain);
                if decision.kind.is_blocking() {
                    return decision;
                }
            }
        }

        if pii_and_injection_regex().is_match(query) {
            let reason = "query contains a PII- or injection-shaped pattern";
            return if ctx.strict_mode {
                Decision::block(reason)
            } else {
                Decision::warn(reason)
            };
        }

        Decision::allow("search permitted")
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

    fn fixture() -> (PolicyCatalogue, ZoneClassifier, DomainValidator, Correlator, StateManager) {
        (
            PolicyCatalogue::standard(),
            ZoneClassifier::new("/opt/wow".into(), "/opt/wow/hook.sh".into(), None),
            DomainValidator::new(),
            Correlator::default(),
            StateManager::new(),
        )
    }

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
            home_dir: None,
            strict_mode: false,
            interactive: false,
        }
    }

    #[test]
    fn fetch_localhost_is_blocked() {
        let (policy, zones, domains, correlator, state) = fixture();
        let c = ctx(&policy, &zones, &domains, &correlator, &state);
        let inv = Invocation::from_json(r#"{"tool":"WebFetch","url":"http://localhost:8080/admin"}"#).unwrap();
        let d = WebFetchHandler.handle(&c, &inv);
        assert_eq!(d.kind, wow_domain::DecisionKind::Block);
    }

    #[test]
    fn fetch_cloud_metadata_is_blocked() {
        let (policy, zones, domains, correlator, state) = fixture();
        let c = ctx(&policy, &zones, &domains, &correlator, &state);
        let inv = Invocation::from_json(r#"{"tool":"WebFetch","url":"http://169.254.169.254/latest/meta-data/"}"#).unwrap();
        let d = WebFetchHandler.handle(&c, &inv);
        assert_eq!(d.kind, wow_domain::DecisionKind::Block);
    }

    #[test]
    fn fetch_file_scheme_is_blocked() {
        let (policy, zones, domains, correlator, state) = fixture();
        let c = ctx(&policy, &zones, &domains, &correlator, &state);
        let inv = Invocation::from_json(r#"{"tool":"WebFetch","url":"file:///etc/passwd"}"#).unwrap();
        let d = WebFetchHandler.handle(&c, &inv);
        assert_eq!(d.kind, wow_domain::DecisionKind::Block);
    }

    #[test]
    fn search_with_ssn_shaped_query_warns_outside_strict_mode() {
        let (policy, zones, domains, correlator, state) = fixture();
        let c = ctx(&policy, &zones, &domains, &correlator, &state);
        let inv = Invocation::from_json(r#"{"tool":"WebSearch","query":"lookup 123-45-6789"}"#).unwrap();
        let d = WebSearchHandler.handle(&c, &inv);
        assert_eq!(d.kind, wow_domain::DecisionKind::Warn);
    }

    #[test]
    fn search_with_blocked_domain_entry_is_blocked() {
        let (policy, zones, domains, correlator, state) = fixture();
        let c = ctx(&policy, &zones, &domains, &correlator, &state);
        let inv = Invocation::from_json(
            r#"{"tool":"WebSearch","query":"anything","blocked_domains":["169.254.169.254"]}"#,
        )
        .unwrap();
        let d = WebSearchHandler.handle(&c, &inv);
        assert_eq!(d.kind, wow_domain::DecisionKind::Block);
    }

    #[test]
    fn ordinary_search_allows() {
        let (policy, zones, domains, correlator, state) = fixture();
        let c = ctx(&policy, &zones, &domains, &correlator, &state);
        let inv = Invocation::from_json(r#"{"tool":"WebSearch","query":"idiomatic rust error handling"}"#).unwrap();
        let d = WebSearchHandler.handle(&c, &inv);
        assert_eq!(d.kind, wow_domain::DecisionKind::Allow);
    }
}
