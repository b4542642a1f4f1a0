//! Filesystem-zone classifier: a pure mapping from a path to the
//! [`Zone`] whose auth tier gates operations against it.
//!
//! Classification canonicalises the input the same way
//! `file_ops::validate_path` does in the handlers crate — resolve the
//! longest existing ancestor, then re-append the non-existent tail —
//! so a path that doesn't exist yet (e.g. a file about to be created)
//! still classifies correctly.

use std::path::{Path, PathBuf};

use wow_domain::Zone;

/// Suffixes a WOW_SELF path may carry while still referring to the same
/// protected file (a backup, a disabled copy, a dev scratch copy).
const WOW_SELF_VARIANT_SUFFIXES: &[&str] = &[".bak", ".disabled", ".dev"];

const SYSTEM_PREFIXES: &[&str] = &[
    "/etc", "/bin", "/sbin", "/usr/bin", "/usr/sbin", "/boot", "/sys", "/proc", "/lib", "/lib64",
];

const SENSITIVE_SUFFIXES: &[&str] = &[
    ".ssh",
    ".aws",
    ".gnupg",
    ".docker/config.json",
    ".kube",
    ".config/gcloud",
];

const CONFIG_FILENAMES: &[&str] = &[
    ".bashrc",
    ".bash_profile",
    ".zshrc",
    ".zprofile",
    ".profile",
    ".gitconfig",
];

/// Paths that influence what code runs on the next build/CI pass or the
/// next shell login — a tier above ordinary source edits but below the
/// guard's own files.
const DEVELOPMENT_SUFFIXES: &[&str] = &[
    ".git/hooks",
    ".github/workflows",
    ".gitlab-ci.yml",
    ".circleci",
    "Dockerfile",
    "docker-compose.yml",
    "Makefile",
];

/// Resolves paths to zones given the install location of this guard.
///
/// `wow_self_root` is the directory the guard's own code/policy files
/// live in; `hook_entrypoint` is the single file the hook wrapper
/// invokes to reach the guard. Both participate in WOW_SELF matching,
/// including `.bak`/`.disabled`/`.dev` variants.
#[derive(Debug, Clone)]
pub struct ZoneClassifier {
    wow_self_root: PathBuf,
    hook_entrypoint: PathBuf,
    home_dir: Option<PathBuf>,
}

impl ZoneClassifier {
    pub fn new(wow_self_root: PathBuf, hook_entrypoint: PathBuf, home_dir: Option<PathBuf>) -> Self {
        Self {
            wow_self_root,
            hook_entrypoint,
            home_dir,
        }
    }

    /// Canonicalise `path` to an absolute form, resolving `.`/`..` and
    /// the existing prefix, without requiring the path to already exist.
    fn canonicalize_best_effort(&self, path: &Path) -> PathBuf {
        if let Ok(canon) = path.canonicalize() {
            return canon;
        }
        let base = if path.is_absolute() {
            PathBuf::new()
        } else {
            std::env::current_dir().unwrap_or_default()
        };
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        };

        let mut existing = absolute.as_path();
        let mut tail: Vec<std::ffi::OsString> = Vec::new();
        loop {
            if existing.exists() {
                break;
            }
            match existing.parent() {
                Some(parent) => {
                    if let Some(name) = existing.file_name() {
                        tail.push(name.to_owned());
                    }
                    existing = parent;
                }
                None => break,
            }
        }
        let mut resolved = existing
            .canonicalize()
            .unwrap_or_else(|_| existing.to_path_buf());
        for part in tail.into_iter().rev() {
            resolved.push(part);
        }
        resolved
    }

    fn strip_variant(p: &Path) -> PathBuf {
        if let Some(name) = p.file_name().and_then(|n| n.to_str()) {
            for suffix in WOW_SELF_VARIANT_SUFFIXES {
                if let Some(stripped) = name.strip_suffix(suffix) {
                    return p.with_file_name(stripped);
                }
            }
        }
        p.to_path_buf()
    }

    fn is_wow_self(&self, canon: &Path) -> bool {
        let base = Self::strip_variant(canon);
        base.starts_with(&self.wow_self_root) || base == self.hook_entrypoint
    }

    /// Whether `path` is the guard's hook entry point itself (or one of
    /// its `.bak`/`.disabled`/`.dev` variants) — distinct from its other
    /// WOW_SELF files, since only the entrypoint is CRITICAL rather than
    /// SUPERADMIN-REQUIRED (see the policy catalogue).
    pub fn is_hook_entrypoint(&self, path: &Path) -> bool {
        let canon = self.canonicalize_best_effort(path);
        Self::strip_variant(&canon) == self.hook_entrypoint
    }

    fn matches_suffix(&self, canon: &Path, suffixes: &[&str]) -> bool {
        let s = canon.to_string_lossy();
        suffixes.iter().any(|suf| s.ends_with(suf))
    }

    fn matches_filename(&self, canon: &Path, names: &[&str]) -> bool {
        canon
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| names.contains(&n))
            .unwrap_or(false)
    }

    /// Classify a path into its zone. Pure given the classifier's fixed
    /// configuration; the only external input is the filesystem's
    /// current shape (to resolve symlinks/ancestors), not mutable guard
    /// state.
    pub fn classify(&self, path: &Path) -> Zone {
        let canon = self.canonicalize_best_effort(path);

        if self.is_wow_self(&canon) {
            return Zone::WowSelf;
        }

        let s = canon.to_string_lossy();
        if SYSTEM_PREFIXES.iter().any(|p| s.starts_with(p)) {
            return Zone::System;
        }

        if let Some(home) = &self.home_dir {
            if canon.starts_with(home) && self.matches_suffix(&canon, SENSITIVE_SUFFIXES) {
                return Zone::Sensitive;
            }
        } else if self.matches_suffix(&canon, SENSITIVE_SUFFIXES) {
            return Zone::Sensitive;
        }

        if self.matches_filename(&canon, CONFIG_FILENAMES) {
            return Zone::Config;
        }

        if self.matches_suffix(&canon, DEVELOPMENT_SUFFIXES) {
            return Zone::Development;
        }

        Zone::General
    }
}
