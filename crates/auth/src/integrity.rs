//! Script-integrity manifest (§3, §4.6 `verify_checksums`): a list of
//! `(path, sha256)` pairs for the guard's own executables and policy
//! scripts. Absent manifest = first run, treated as pass. Present
//! manifest with any mismatch is fatal to the whole process (§7
//! "Integrity errors ... bypass all handlers and abort").

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::atomic::{ensure_dir_mode, write_atomic};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChecksumEntry {
    pub path: String,
    pub sha256_hex: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Manifest {
    pub entries: Vec<ChecksumEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityVerdict {
    /// No manifest on disk: first run.
    FirstRun,
    Ok,
    Mismatch(Vec<String>),
}

fn hash_file(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    let digest = Sha256::digest(&bytes);
    Ok(hex::encode(digest))
}

/// Verify every file listed in `manifest_path` against its recorded
/// sha256. A missing manifest is `FirstRun` (pass, not fatal).
pub fn verify_checksums(manifest_path: &Path) -> std::io::Result<IntegrityVerdict> {
    if !manifest_path.exists() {
        return Ok(IntegrityVerdict::FirstRun);
    }
    let raw = std::fs::read_to_string(manifest_path)?;
    let manifest: Manifest = serde_json::from_str(&raw).unwrap_or_default();

    let mut mismatches = Vec::new();
    for entry in &manifest.entries {
        let path = PathBuf::from(&entry.path);
        match hash_file(&path) {
            Ok(actual) if actual == entry.sha256_hex => {}
            Ok(_) => mismatches.push(entry.path.clone()),
            Err(_) => mismatches.push(entry.path.clone()),
        }
    }

    if mismatches.is_empty() {
        Ok(IntegrityVerdict::Ok)
    } else {
        Ok(IntegrityVerdict::Mismatch(mismatches))
    }
}

/// Recompute and persist the manifest for `paths` — the only entry
/// point allowed to write the checksums file (§9 "Ownership of files").
pub fn regenerate(manifest_path: &Path, paths: &[PathBuf]) -> std::io::Result<()> {
    let mut entries = Vec::with_capacity(paths.len());
    for path in paths {
        let sha256_hex = hash_file(path)?;
        entries.push(ChecksumEntry {
            path: path.to_string_lossy().into_owned(),
            sha256_hex,
        });
    }
    let manifest = Manifest { entries };
    let json = serde_json::to_vec_pretty(&manifest).expect("Manifest always serializes");
    if let Some(parent) = manifest_path.parent() {
        ensure_dir_mode(parent, 0o700)?;
    }
    write_atomic(manifest_path, &json, 0o600)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_manifest_is_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = dir.path().join("checksums.sha256");
        assert_eq!(verify_checksums(&manifest_path).unwrap(), IntegrityVerdict::FirstRun);
    }

    #[test]
    fn regenerate_then_verify_matches() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("hook.sh");
        std::fs::File::create(&script).unwrap().write_all(b"#!/bin/sh\necho hi\n").unwrap();

        let manifest_path = dir.path().join("checksums.sha256");
        regenerate(&manifest_path, &[script.clone()]).unwrap();

        assert_eq!(verify_checksums(&manifest_path).unwrap(), IntegrityVerdict::Ok);
    }

    #[test]
    fn tampering_with_a_listed_file_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("hook.sh");
        std::fs::File::create(&script).unwrap().write_all(b"original").unwrap();

        let manifest_path = dir.path().join("checksums.sha256");
        regenerate(&manifest_path, &[script.clone()]).unwrap();

        std::fs::write(&script, b"tampered").unwrap();

        let verdict = verify_checksums(&manifest_path).unwrap();
        match verdict {
            IntegrityVerdict::Mismatch(paths) => assert_eq!(paths.len(), 1),
            other => panic!("expected Mismatch, got {other:?}"),
        }
    }
}
