//! Shared, read-only context threaded through every handler (§4.1).
//!
//! One value is built once at orchestrator init and borrowed by every
//! dispatch — handlers never own their dependencies, mirroring the
//! teacher's move away from process-global maps toward an explicit
//! `AppState` passed by reference.

use std::path::PathBuf;

use wow_auth::ElevationState;
use wow_correlator::Correlator;
use wow_policy::{DomainValidator, PolicyCatalogue, ZoneClassifier};
use wow_state::StateManager;

pub struct GuardContext<'a> {
    pub policy: &'a PolicyCatalogue,
    pub zones: &'a ZoneClassifier,
    pub domains: &'a DomainValidator,
    pub correlator: &'a Correlator,
    pub state: &'a StateManager,
    pub elevation: ElevationState,
    /// The process's working directory, used by the correlator's
    /// "project" heuristic and by handlers resolving relative paths.
    pub cwd: PathBuf,
    pub home_dir: Option<PathBuf>,
    /// §4.2 Read handler: TIER 2 hits warn-and-allow unless this is set,
    /// in which case they block.
    pub strict_mode: bool,
    /// §4.2 WebSearch/WebFetch: whether an interactive prompt surface is
    /// available for unknown domains. Always `false` in core scope.
    pub interactive: bool,
}
