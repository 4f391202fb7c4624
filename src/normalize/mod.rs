//! Line normalization of text files.
//!
//! Normalizing a file removes blank and comment lines, drops repeated
//! lines and writes the survivors back sorted byte-wise, one per line,
//! each ending in `\n`.
//!
//! - [`lines`]: line rules and the [`LineSet`] collection
//! - [`rewrite`]: atomic replacement of the file on disk
//! - [`batch`]: applying normalization to a whole tree
//!
//! # Example
//!
//! ```no_run
//! use linesweep::normalize::normalize_file;
//! use std::path::Path;
//!
//! let outcome = normalize_file(Path::new("hosts.txt")).unwrap();
//! println!("kept {} of {} lines", outcome.lines_kept, outcome.lines_read);
//! ```

pub mod batch;
pub mod lines;
pub mod rewrite;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

pub use batch::{BatchConfig, BatchProcessor, BatchSummary};
pub use lines::{normalize_bytes, LineSet};
pub use rewrite::{is_temp_file, write_atomic, TEMP_PREFIX};

use crate::scanner::ScanError;

/// Errors raised while normalizing files.
#[derive(thiserror::Error, Debug)]
pub enum NormalizeError {
    /// The file could not be opened or read.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The normalized content could not be written back.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The directory walk failed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// The batch was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Normalization interrupted by user")]
    Interrupted,
}

impl NormalizeError {
    /// Path of the file involved, if the error concerns one file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Read { path, .. } | Self::Write { path, .. } => Some(path),
            Self::Scan(_) | Self::Interrupted => None,
        }
    }
}

/// What normalizing one file did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOutcome {
    /// Raw lines in the input.
    pub lines_read: usize,
    /// Lines in the output.
    pub lines_kept: usize,
    /// `false` if the file was already normalized and left untouched.
    pub changed: bool,
}

/// Normalize a single file in place.
///
/// A file whose content is already in normalized form is not rewritten,
/// so its modification time does not change.
///
/// # Errors
///
/// Returns [`NormalizeError::Read`] or [`NormalizeError::Write`].
pub fn normalize_file(path: &Path) -> Result<NormalizeOutcome, NormalizeError> {
    let read_err = |source| NormalizeError::Read {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(read_err)?;
    let scanned = lines::scan_lines(BufReader::new(file)).map_err(read_err)?;

    let outcome = NormalizeOutcome {
        lines_read: scanned.lines_read,
        lines_kept: scanned.lines.len(),
        changed: !scanned.already_normalized,
    };

    if outcome.changed {
        write_atomic(path, &scanned.lines.to_bytes()).map_err(|source| NormalizeError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        log::trace!(
            "Rewrote {} ({} -> {} lines)",
            path.display(),
            outcome.lines_read,
            outcome.lines_kept
        );
    } else {
        log::trace!("Already normalized: {}", path.display());
    }

    Ok(outcome)
}
