//! Deterministic, dependency-ordered initialisation (§4.10).
//!
//! Order: utils → state → config → session → event bus → tool
//! registry → zone classifier → domain lists → policy catalogue →
//! bypass/SuperAdmin → correlator → handlers → router. A failure at
//! any step short-circuits the rest and is surfaced to `main` as a
//! non-zero result.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use wow_auth::{Bypass, ElevationState, SuperAdmin};
use wow_correlator::Correlator;
use wow_domain::config::Config;
use wow_handlers::{GuardContext, HandlerRouter};
use wow_policy::{DomainValidator, PolicyCatalogue, ZoneClassifier};
use wow_registry::ToolRegistry;
use wow_session::SessionManager;
use wow_state::{EventBus, StateManager};

/// Every initialised subsystem a CLI command needs, borrowed together
/// to build a [`wow_handlers::GuardContext`] for a `decide` call, or
/// consulted individually by the administrative subcommands.
pub struct Guard {
    pub data_dir: PathBuf,
    pub config: Config,
    pub session: SessionManager,
    pub events: EventBus,
    pub registry: ToolRegistry,
    pub zones: ZoneClassifier,
    pub domains: DomainValidator,
    pub policy: PolicyCatalogue,
    pub bypass: Bypass,
    pub superadmin: SuperAdmin,
    pub correlator: Correlator,
    pub router: HandlerRouter,
    pub state: StateManager,
}

/// Resolve the data directory from `WOW_DATA_DIR`, then `WOW_HOME`,
/// falling back to `~/.wow-guard` (§6 "Environment").
pub fn resolve_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("WOW_DATA_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(dir) = std::env::var_os("WOW_HOME") {
        return PathBuf::from(dir);
    }
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".wow-guard")
}

fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.json")
}

fn load_or_default_config(path: &Path) -> Result<Config> {
    if path.exists() {
        Config::from_file(path).with_context(|| format!("loading config from {}", path.display()))
    } else {
        Ok(Config::default())
    }
}

impl Guard {
    /// `wow_init`: idempotent — calling it twice in a row observes the
    /// same on-disk state and produces an equivalent `Guard` (§8
    /// round-trip property).
    pub fn init(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("creating data dir {}", data_dir.display()))?;
        tracing::debug!(data_dir = %data_dir.display(), "utils ready");

        let state = StateManager::new();
        let state_snapshot = data_dir.join("state.json");
        if state_snapshot.exists() {
            state.load(&state_snapshot).context("loading state snapshot")?;
        }
        tracing::debug!("state manager ready");

        let config = load_or_default_config(&config_path(&data_dir))?;
        tracing::debug!(version = %config.version(), "config loaded");

        let session = SessionManager::start(&data_dir).context("starting session")?;
        tracing::debug!(session_id = %session.id(), "session started");

        let events = EventBus::new();
        events.subscribe("decision", "session-log", {
            let session_dir = session.session_dir();
            move |record| {
                let log = wow_session::EventLog::new(&session_dir);
                log.append(&wow_session::EventRecord::new(record.name.clone(), Some(record.payload.clone())))
                    .map_err(|e| e.to_string())
            }
        });
        tracing::debug!("event bus ready");

        let registry = ToolRegistry::new();
        tracing::debug!("tool registry ready");

        let wow_self_root = data_dir.join("guard");
        let hook_entrypoint = data_dir.join("hook.sh");
        let zones = ZoneClassifier::new(wow_self_root, hook_entrypoint, dirs::home_dir());
        tracing::debug!("zone classifier ready");

        let domains = DomainValidator::new();
        let system_safe = data_dir.join("system-safe-domains.conf");
        if system_safe.exists() {
            domains.reload_system_safe(&system_safe).context("loading system safe domains")?;
        }
        let system_blocked = data_dir.join("system-blocked-domains.conf");
        if system_blocked.exists() {
            domains.reload_system_blocked(&system_blocked).context("loading system blocked domains")?;
        }
        let custom_safe = data_dir.join("custom-safe-domains.conf");
        if custom_safe.exists() {
            domains.reload_custom_safe(&custom_safe).context("loading custom safe domains")?;
        }
        let custom_blocked = data_dir.join("custom-blocked-domains.conf");
        if custom_blocked.exists() {
            domains.reload_custom_blocked(&custom_blocked).context("loading custom blocked domains")?;
        }
        tracing::debug!("domain lists ready");

        let policy = PolicyCatalogue::standard();
        tracing::debug!("policy catalogue ready");

        let bypass: Bypass = Bypass::new(&data_dir);
        let superadmin: SuperAdmin = SuperAdmin::new(&data_dir);
        tracing::debug!("bypass/superadmin cores ready");

        let correlator = Correlator::default();
        tracing::debug!("correlator ready");

        let router = HandlerRouter::standard();
        tracing::debug!("handlers + router ready");

        Ok(Self {
            data_dir,
            config,
            session,
            events,
            registry,
            zones,
            domains,
            policy,
            bypass,
            superadmin,
            correlator,
            router,
            state,
        })
    }

    pub fn elevation(&self) -> ElevationState {
        ElevationState::probe(&self.bypass, &self.superadmin)
    }

    /// Build the read-only context threaded through every handler for
    /// one `decide` call.
    pub fn context(&self, cwd: PathBuf, strict_mode: bool) -> GuardContext<'_> {
        GuardContext {
            policy: &self.policy,
            zones: &self.zones,
            domains: &self.domains,
            correlator: &self.correlator,
            state: &self.state,
            elevation: self.elevation(),
            cwd,
            home_dir: dirs::home_dir(),
            strict_mode,
            interactive: false,
        }
    }
}
