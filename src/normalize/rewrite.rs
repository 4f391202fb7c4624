//! Atomic file replacement.
//!
//! New content goes to a temporary file in the target's directory, which
//! is then renamed over the target. Readers see either the old or the new
//! content, never a truncated file, and a failed write leaves the original
//! in place.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// File name prefix of in-flight temporary files.
///
/// Watch mode ignores events for files carrying this prefix.
pub const TEMP_PREFIX: &str = ".linesweep.";

/// `true` if `path` names one of our temporary files.
#[must_use]
pub fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with(TEMP_PREFIX))
}

/// Replace the content of `path` with `contents`.
///
/// When `path` is a symlink the link is kept and its target is replaced.
/// The original file's permissions are carried over to the replacement.
///
/// # Errors
///
/// Returns any error from resolving the link, or from creating, writing,
/// syncing or renaming the temporary file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let target = resolve_target(path)?;
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(".tmp")
        .tempfile_in(dir)?;

    tmp.as_file_mut().write_all(contents)?;

    if let Ok(metadata) = fs::metadata(&target) {
        tmp.as_file().set_permissions(metadata.permissions())?;
    }
    tmp.as_file().sync_all()?;

    // Close before renaming so the close-write lands on the temp name.
    tmp.into_temp_path().persist(&target).map_err(|e| e.error)?;
    Ok(())
}

/// The file that actually holds the content of `path`.
fn resolve_target(path: &Path) -> io::Result<PathBuf> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => fs::canonicalize(path),
        _ => Ok(path.to_path_buf()),
    }
}
