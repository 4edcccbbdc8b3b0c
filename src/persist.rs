//! Atomic file replacement.

use std::ffi::OsString;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Replace `path` with `contents` atomically: write a temp file in the same
/// directory, fsync it, carry over the original permissions, then rename it
/// over the target. On any error the target is left as it was and the temp
/// file is removed when dropped.
///
/// # Errors
///
/// Returns `Error::Io` if any filesystem operation fails.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), Error> {
    let dir = path
        .parent()
        .filter(|p| return !p.as_os_str().is_empty())
        .unwrap_or_else(|| return Path::new("."));

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;

    if let Ok(metadata) = std::fs::metadata(path) {
        std::fs::set_permissions(tmp.path(), metadata.permissions())?;
    }

    tmp.persist(path).map_err(|e| return Error::Io(e.error))?;
    return Ok(());
}

/// Path of the backup copy for `path`: the suffix appended to the full name.
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    return PathBuf::from(name);
}
