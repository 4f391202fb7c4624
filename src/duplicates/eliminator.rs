//! Single-pass duplicate elimination.
//!
//! # Overview
//!
//! [`DuplicateEliminator`] walks a directory tree exactly once. Every regular
//! file is fingerprinted as it is reached; the first file with a given
//! fingerprint is kept, every later one is removed. The kept copy is
//! decided purely by walk order (name-sorted, depth-first), never by
//! timestamps or path length.
//!
//! The pass is fail-fast: the first walk, read or delete error stops it.
//! Files already removed stay removed.
//!
//! # Example
//!
//! ```no_run
//! use linesweep::duplicates::{DedupeConfig, DuplicateEliminator};
//! use std::path::Path;
//!
//! let eliminator = DuplicateEliminator::new(DedupeConfig::default());
//! let summary = eliminator.eliminate(Path::new("/some/dir")).unwrap();
//! println!("Removed {} duplicates", summary.duplicates_removed());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytesize::ByteSize;

use super::index::{FingerprintIndex, IndexOutcome};
use crate::actions::{remove_file, DeleteError, DeletionMode};
use crate::progress::{ProgressCallback, PHASE_DEDUPE};
use crate::scanner::{hash_to_hex, HashError, Hasher, ScanError, Walker, WalkerConfig};

/// Configuration for duplicate elimination.
#[derive(Clone, Default)]
pub struct DedupeConfig {
    /// Directory walk options.
    pub walker_config: WalkerConfig,
    /// How duplicates are removed.
    pub deletion: DeletionMode,
    /// Hasher used for fingerprints.
    pub hasher: Hasher,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for DedupeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DedupeConfig")
            .field("walker_config", &self.walker_config)
            .field("deletion", &self.deletion)
            .field("hasher", &self.hasher)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl DedupeConfig {
    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set how duplicates are removed.
    #[must_use]
    pub fn with_deletion(mut self, mode: DeletionMode) -> Self {
        self.deletion = mode;
        self
    }

    /// Set the hasher.
    #[must_use]
    pub fn with_hasher(mut self, hasher: Hasher) -> Self {
        self.hasher = hasher;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Errors that abort an elimination pass.
#[derive(thiserror::Error, Debug)]
pub enum DedupeError {
    /// The pass was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Duplicate removal interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The directory walk failed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// A file could not be read for fingerprinting.
    #[error(transparent)]
    Hash(#[from] HashError),

    /// A duplicate could not be removed.
    #[error(transparent)]
    Delete(#[from] DeleteError),
}

/// One removed file and the copy that was kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedDuplicate {
    /// The file that was removed.
    pub path: PathBuf,
    /// The earlier file with identical content.
    pub original: PathBuf,
    /// Size of the removed file.
    pub size: u64,
}

/// Statistics from one elimination pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EliminationSummary {
    /// Regular files fingerprinted.
    pub scanned_files: usize,
    /// Distinct contents kept.
    pub unique_files: usize,
    /// Removed files in removal order.
    pub removed: Vec<RemovedDuplicate>,
}

impl EliminationSummary {
    /// Number of files removed.
    #[must_use]
    pub fn duplicates_removed(&self) -> usize {
        self.removed.len()
    }

    /// Bytes freed by the removals.
    #[must_use]
    pub fn reclaimed_bytes(&self) -> u64 {
        self.removed.iter().map(|r| r.size).sum()
    }

    /// Human-readable reclaimed space.
    #[must_use]
    pub fn reclaimed_display(&self) -> String {
        ByteSize::b(self.reclaimed_bytes()).to_string()
    }
}

/// Removes byte-identical files from a directory tree.
#[derive(Debug)]
pub struct DuplicateEliminator {
    config: DedupeConfig,
}

impl DuplicateEliminator {
    /// Create a new eliminator.
    #[must_use]
    pub fn new(config: DedupeConfig) -> Self {
        Self { config }
    }

    /// Create an eliminator with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(DedupeConfig::default())
    }

    /// Remove every file whose content was already seen earlier in the walk.
    ///
    /// # Errors
    ///
    /// Returns `DedupeError` if:
    /// - The path does not exist or is not a directory
    /// - Any entry cannot be walked or read, or a duplicate cannot be removed
    /// - The pass is interrupted by shutdown signal
    pub fn eliminate(&self, root: &Path) -> Result<EliminationSummary, DedupeError> {
        if !root.exists() {
            return Err(DedupeError::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(DedupeError::NotADirectory(root.to_path_buf()));
        }

        log::debug!("Scanning {} for duplicate files", root.display());

        let callback = self.config.progress_callback.as_ref();
        if let Some(cb) = callback {
            cb.on_phase_start(PHASE_DEDUPE, 0);
        }

        let result = self.run(root, callback);

        if let Some(cb) = callback {
            cb.on_phase_end(PHASE_DEDUPE);
        }

        let summary = result?;
        log::debug!(
            "Duplicate scan finished: {} files, {} removed, {} reclaimed",
            summary.scanned_files,
            summary.duplicates_removed(),
            summary.reclaimed_display()
        );
        Ok(summary)
    }

    fn run(
        &self,
        root: &Path,
        callback: Option<&Arc<dyn ProgressCallback>>,
    ) -> Result<EliminationSummary, DedupeError> {
        let walker = Walker::new(root, self.config.walker_config.clone());
        let mut index = FingerprintIndex::new();
        let mut summary = EliminationSummary::default();

        for entry in walker.walk() {
            if self.config.is_shutdown_requested() {
                return Err(DedupeError::Interrupted);
            }

            let file = entry?;
            summary.scanned_files += 1;
            if let Some(cb) = callback {
                cb.on_progress(summary.scanned_files, &file.path.to_string_lossy());
            }

            let hash = self.config.hasher.full_hash(&file.path)?;

            match index.observe(hash, &file.path) {
                IndexOutcome::Canonical => {
                    log::trace!("{} {}", hash_to_hex(&hash), file.path.display());
                }
                IndexOutcome::DuplicateOf(original) => {
                    log::info!(
                        "Removing duplicate: {} (duplicate of {})",
                        file.path.display(),
                        original.display()
                    );
                    log::debug!("Shared fingerprint {}", hash_to_hex(&hash));
                    let removed = remove_file(&file.path, self.config.deletion)?;
                    summary.removed.push(RemovedDuplicate {
                        path: removed.path,
                        original,
                        size: removed.size,
                    });
                }
            }
        }

        summary.unique_files = index.len();
        Ok(summary)
    }
}
