//! `wow-guard`: the orchestrator's CLI entry point (§6).
//!
//! `decide` is the hook's steady-state call: read one invocation,
//! dispatch it through the handler router, print the verdict, exit
//! with the matching code. The other subcommands manage the guard's
//! own elevated-auth modes, configuration, and integrity manifest.

mod cli;
mod orchestrator;

use std::io::Read as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Command, ConfigAction, ElevationAction, IntegrityAction};
use orchestrator::Guard;
use wow_auth::{AuthError, AuthProfile, AuthState};
use wow_auth::tty::{check_tty, is_test_mode};
use wow_domain::Invocation;

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Decide { invocation: None });

    let exit_code = match run(command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("wow-guard: {err:#}");
            2
        }
    };
    std::process::exit(exit_code);
}

fn run(command: Command) -> Result<i32> {
    let data_dir = orchestrator::resolve_data_dir();

    match command {
        Command::Decide { invocation } => decide(data_dir, invocation),
        Command::Bypass { action } => {
            let guard = Guard::init(data_dir)?;
            elevation_command("bypass", &guard.bypass, action)
        }
        Command::Superadmin { action } => {
            let guard = Guard::init(data_dir)?;
            elevation_command("superadmin", &guard.superadmin, action)
        }
        Command::Config { action } => {
            let guard = Guard::init(data_dir)?;
            config_command(&guard, action)
        }
        Command::Doctor => {
            let guard = Guard::init(data_dir)?;
            doctor(&guard)
        }
        Command::Integrity { action } => {
            let guard = Guard::init(data_dir)?;
            match action {
                IntegrityAction::Regenerate => regenerate_integrity(&guard),
            }
        }
    }
}

fn read_invocation(path: Option<PathBuf>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("reading invocation from stdin")?;
            Ok(buf)
        }
    }
}

fn decide(data_dir: PathBuf, invocation_path: Option<PathBuf>) -> Result<i32> {
    let raw = read_invocation(invocation_path)?;
    let invocation = match Invocation::from_json(&raw) {
        Ok(inv) => inv,
        Err(err) => {
            eprintln!("malformed invocation JSON: {err}");
            return Ok(2);
        }
    };

    let guard = Guard::init(data_dir)?;

    use wow_auth::integrity::{verify_checksums, IntegrityVerdict};
    match verify_checksums(&manifest_path(&guard)).context("verifying integrity manifest")? {
        IntegrityVerdict::Mismatch(paths) => {
            eprintln!("integrity: MISMATCH for {} file(s); aborting before any decision is issued:", paths.len());
            for path in &paths {
                eprintln!("  {path}");
            }
            return Ok(5);
        }
        IntegrityVerdict::FirstRun | IntegrityVerdict::Ok => {}
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let strict_mode = guard.config.enforcement().strict_mode;
    let ctx = guard.context(cwd, strict_mode);

    let decision = guard.router.dispatch(&ctx, &guard.registry, &invocation);

    guard.events.publish(
        "decision",
        serde_json::json!({
            "tool": invocation.tool,
            "kind": decision.kind,
            "reason": decision.reason,
        }),
    );
    guard.session.increment_metric(&format!("decisions.{}", invocation.tool), 1);
    guard.session.increment_metric(&format!("decisions.kind.{:?}", decision.kind), 1);
    let _ = guard.session.save();

    let code = decision.exit_code();
    if code <= 1 {
        let payload = decision.rewritten.as_ref().unwrap_or(&invocation);
        println!("{}", serde_json::to_string(payload).context("serializing invocation")?);
    } else {
        eprintln!("{}", decision.reason);
    }
    Ok(code)
}

fn prompt_passphrase(label: &str) -> Result<String> {
    if is_test_mode() {
        return Ok(std::env::var("SUPERADMIN_MOCK_AUTH").unwrap_or_default());
    }
    if !check_tty() {
        anyhow::bail!("no interactive terminal attached; cannot prompt for a {label} passphrase");
    }
    rpassword::prompt_password(format!("{label} passphrase: ")).context("reading passphrase")
}

fn elevation_command<P: AuthProfile>(
    label: &str,
    core: &wow_auth::AuthCore<P>,
    action: ElevationAction,
) -> Result<i32> {
    match action {
        ElevationAction::Activate => {
            let passphrase = prompt_passphrase(label)?;
            match core.activate(&passphrase) {
                Ok(()) => {
                    println!("{label} activated");
                    Ok(0)
                }
                Err(AuthError::NotConfigured) => {
                    eprintln!("{label} has no passphrase configured yet; set one before activating");
                    Ok(1)
                }
                Err(err) => {
                    eprintln!("{label} activation failed: {err}");
                    Ok(1)
                }
            }
        }
        ElevationAction::Deactivate => {
            core.deactivate().context("deactivating")?;
            println!("{label} deactivated");
            Ok(0)
        }
        ElevationAction::Status => {
            let state = core.state();
            let label_state = match state {
                AuthState::NotConfigured => "not configured",
                AuthState::Protected => "protected (inactive)",
                AuthState::Active => "active",
                AuthState::LockedOut => "locked out",
            };
            println!("{label}: {label_state}");
            Ok(0)
        }
    }
}

fn config_command(guard: &Guard, action: ConfigAction) -> Result<i32> {
    match action {
        ConfigAction::Show => {
            println!("{}", guard.config.to_json_string_pretty()?);
            Ok(0)
        }
        ConfigAction::Validate => {
            let issues = guard.config.validate();
            if issues.is_empty() {
                println!("config is valid");
                return Ok(0);
            }
            let mut has_error = false;
            for issue in &issues {
                if issue.severity == wow_domain::config::ConfigSeverity::Error {
                    has_error = true;
                }
                println!("{issue}");
            }
            Ok(if has_error { 1 } else { 0 })
        }
    }
}

fn manifest_path(guard: &Guard) -> PathBuf {
    guard.data_dir.join("checksums.sha256")
}

fn integrity_paths(guard: &Guard) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(exe) = std::env::current_exe() {
        paths.push(exe);
    }
    let hook = guard.data_dir.join("hook.sh");
    if hook.exists() {
        paths.push(hook);
    }
    let config = guard.data_dir.join("config.json");
    if config.exists() {
        paths.push(config);
    }
    paths
}

fn doctor(guard: &Guard) -> Result<i32> {
    use wow_auth::integrity::{verify_checksums, IntegrityVerdict};

    let verdict = verify_checksums(&manifest_path(guard)).context("verifying integrity manifest")?;
    match verdict {
        IntegrityVerdict::FirstRun => {
            println!("integrity: no manifest yet (first run) — run `wow-guard integrity regenerate`");
        }
        IntegrityVerdict::Ok => println!("integrity: ok"),
        IntegrityVerdict::Mismatch(ref paths) => {
            println!("integrity: MISMATCH for {} file(s):", paths.len());
            for path in paths {
                println!("  {path}");
            }
        }
    }

    let perms_ok = std::fs::metadata(&guard.data_dir)
        .map(|m| {
            use std::os::unix::fs::PermissionsExt;
            m.permissions().mode() & 0o077 == 0
        })
        .unwrap_or(false);
    println!(
        "data dir permissions: {}",
        if perms_ok { "ok (no group/other access)" } else { "WARN (group/other can read or write)" }
    );

    match verdict {
        IntegrityVerdict::Mismatch(_) => Ok(3),
        _ => Ok(0),
    }
}

fn regenerate_integrity(guard: &Guard) -> Result<i32> {
    let paths = integrity_paths(guard);
    wow_auth::integrity::regenerate(&manifest_path(guard), &paths).context("regenerating integrity manifest")?;
    println!("regenerated integrity manifest for {} file(s)", paths.len());
    Ok(0)
}
