//! Write-tmp-then-rename helpers shared by every file the auth cores
//! own, matching the atomic-write pattern in `wow-handlers`' file
//! operations (§5, §9: "every state file uses a write-tmp-then-rename
//! pattern, and every reader tolerates a missing file as absent").

use std::fs;
use std::io;
use std::path::Path;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

pub fn ensure_dir_mode(path: &Path, mode: u32) -> io::Result<()> {
    fs::create_dir_all(path)?;
    #[cfg(unix)]
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    #[cfg(not(unix))]
    let _ = mode;
    Ok(())
}

/// Write `contents` to `path` atomically and set file mode (unix only).
pub fn write_atomic(path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    #[cfg(unix)]
    fs::set_permissions(&tmp, fs::Permissions::from_mode(mode))?;
    #[cfg(not(unix))]
    let _ = mode;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Read a file, treating "does not exist" as `Ok(None)` rather than an
/// error — the canonical "absent" reading for every auth-state file.
pub fn read_if_present(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Remove a file, treating "already absent" as success (idempotent
/// deactivation).
pub fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
