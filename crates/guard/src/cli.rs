//! Command-line surface (§6): `decide` is the default hook entry
//! point; the rest are administrative.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "wow-guard", version, about = "Policy guard interposed between an assistant and its tools")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decide ALLOW/WARN/BLOCK/CRITICAL/SUPERADMIN-REQUIRED for one invocation.
    Decide {
        /// Read the invocation JSON from this file instead of stdin.
        #[arg(long)]
        invocation: Option<std::path::PathBuf>,
    },
    /// Manage the Bypass elevated-auth mode.
    Bypass {
        #[command(subcommand)]
        action: ElevationAction,
    },
    /// Manage the SuperAdmin elevated-auth mode.
    Superadmin {
        #[command(subcommand)]
        action: ElevationAction,
    },
    /// Inspect or validate the running configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Checksum and permission sanity pass over the guard's own files.
    Doctor,
    /// Regenerate the script-integrity manifest.
    Integrity {
        #[command(subcommand)]
        action: IntegrityAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ElevationAction {
    Activate,
    Deactivate,
    Status,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    Show,
    Validate,
}

#[derive(Subcommand, Debug)]
pub enum IntegrityAction {
    Regenerate,
}
