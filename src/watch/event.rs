//! Classification of raw `notify` events.
//!
//! Only "file written" notifications matter to the watch loop. Creation,
//! removal, renames, metadata changes and plain reads are ignored, as are
//! events for in-flight temporary files written by the normalizer itself.

use std::path::{Path, PathBuf};

use notify::event::{AccessKind, AccessMode, ModifyKind};
use notify::{Event, EventKind};

use crate::normalize::is_temp_file;

/// Progress notifications emitted by a running watch session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// The subscription is active.
    Started { root: PathBuf },
    /// A write notification was accepted into the debounce stage.
    FileChanged { path: PathBuf },
    /// A debounced file was normalized.
    Processed { path: PathBuf, changed: bool },
    /// A debounced file no longer existed and was skipped.
    Skipped { path: PathBuf },
    /// A per-file or transport error, logged and survived.
    Error { message: String },
    /// The session stopped.
    Shutdown,
}

/// `true` if `kind` signals that file content was written.
#[must_use]
pub fn is_write(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Any)
            | EventKind::Access(AccessKind::Close(AccessMode::Write))
    )
}

/// `true` if the watch loop should not react to `path`.
#[must_use]
pub fn is_ignored_path(path: &Path) -> bool {
    is_temp_file(path)
}

/// Paths written according to `event`, in event order.
#[must_use]
pub fn written_paths(event: &Event) -> Vec<PathBuf> {
    if !is_write(&event.kind) {
        return Vec::new();
    }
    event
        .paths
        .iter()
        .filter(|path| !is_ignored_path(path))
        .cloned()
        .collect()
}
