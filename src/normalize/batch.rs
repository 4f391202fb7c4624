//! Tree-wide normalization.
//!
//! [`BatchProcessor`] walks a directory and normalizes every file
//! in walk order. By default the first failure stops the batch. With
//! `continue_on_error` the failure is logged and recorded, and the walk
//! goes on; watch mode uses this for its startup pass.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::{normalize_file, NormalizeError};
use crate::progress::{ProgressCallback, PHASE_NORMALIZE};
use crate::scanner::{Walker, WalkerConfig};

/// Configuration for a batch run.
#[derive(Clone, Default)]
pub struct BatchConfig {
    /// Directory walk options.
    pub walker_config: WalkerConfig,
    /// Keep going after a per-file failure.
    pub continue_on_error: bool,
    /// Lock held around each file's normalization.
    pub lock: Option<Arc<Mutex<()>>>,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchConfig")
            .field("walker_config", &self.walker_config)
            .field("continue_on_error", &self.continue_on_error)
            .field("lock", &self.lock.as_ref().map(|_| "<lock>"))
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl BatchConfig {
    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Enable/disable continue on error.
    #[must_use]
    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    /// Serialize per-file work through `lock`.
    #[must_use]
    pub fn with_lock(mut self, lock: Arc<Mutex<()>>) -> Self {
        self.lock = Some(lock);
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

/// Results of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Files normalized (rewritten or already clean).
    pub files_processed: usize,
    /// Files whose content changed.
    pub files_rewritten: usize,
    /// Failures skipped under `continue_on_error`.
    pub failures: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    /// Files that needed no rewrite.
    #[must_use]
    pub fn files_unchanged(&self) -> usize {
        self.files_processed - self.files_rewritten
    }

    /// Check if every file succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Applies line normalization to every file under a directory.
#[derive(Debug, Default)]
pub struct BatchProcessor {
    config: BatchConfig,
}

impl BatchProcessor {
    /// Create a new batch processor.
    #[must_use]
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    /// Normalize every regular file under `root`.
    ///
    /// # Errors
    ///
    /// Without `continue_on_error`, the first walk or per-file error.
    /// `Interrupted` if the shutdown flag is raised.
    pub fn process_tree(&self, root: &Path) -> Result<BatchSummary, NormalizeError> {
        let callback = self.config.progress_callback.as_ref();
        if let Some(cb) = callback {
            cb.on_phase_start(PHASE_NORMALIZE, 0);
        }

        let result = self.run(root, callback);

        if let Some(cb) = callback {
            cb.on_phase_end(PHASE_NORMALIZE);
        }
        result
    }

    fn run(
        &self,
        root: &Path,
        callback: Option<&Arc<dyn ProgressCallback>>,
    ) -> Result<BatchSummary, NormalizeError> {
        let walker = Walker::new(root, self.config.walker_config.clone());
        let mut summary = BatchSummary::default();
        let mut visited = 0usize;

        for entry in walker.walk() {
            if self.config.is_shutdown_requested() {
                return Err(NormalizeError::Interrupted);
            }

            let file = match entry {
                Ok(file) => file,
                Err(e) if self.config.continue_on_error => {
                    log::error!("Error walking directory: {}", e);
                    summary.failures.push((root.to_path_buf(), e.to_string()));
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            visited += 1;
            if let Some(cb) = callback {
                cb.on_progress(visited, &file.path.to_string_lossy());
            }

            match self.normalize_one(&file.path) {
                Ok(outcome) => {
                    summary.files_processed += 1;
                    if outcome.changed {
                        summary.files_rewritten += 1;
                    }
                }
                Err(e) if self.config.continue_on_error => {
                    log::error!("Error processing file {}: {}", file.path.display(), e);
                    summary.failures.push((file.path, e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(summary)
    }

    fn normalize_one(&self, path: &Path) -> Result<super::NormalizeOutcome, NormalizeError> {
        log::debug!("Normalizing {}", path.display());
        match self.config.lock {
            Some(ref lock) => {
                let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                normalize_file(path)
            }
            None => normalize_file(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_process_tree_normalizes_nested_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.txt"), "b\na\n").unwrap();
        fs::write(dir.path().join("sub").join("c.txt"), "# x\nz\ny\nz\n").unwrap();
        fs::write(dir.path().join("clean.txt"), "1\n2\n").unwrap();

        let summary = BatchProcessor::default().process_tree(dir.path()).unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "a\nb\n");
        assert_eq!(
            fs::read_to_string(dir.path().join("sub").join("c.txt")).unwrap(),
            "y\nz\n"
        );
        assert_eq!(summary.files_processed, 3);
        assert_eq!(summary.files_rewritten, 2);
        assert_eq!(summary.files_unchanged(), 1);
        assert!(summary.all_succeeded());
    }

    #[test]
    fn test_missing_root_fails_fast() {
        let result = BatchProcessor::default().process_tree(Path::new("/no/such/linesweep/dir"));
        assert!(matches!(result, Err(NormalizeError::Scan(_))));
    }

    #[test]
    fn test_missing_root_continue_on_error() {
        let processor =
            BatchProcessor::new(BatchConfig::default().with_continue_on_error(true));
        let summary = processor
            .process_tree(Path::new("/no/such/linesweep/dir"))
            .unwrap();
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.files_processed, 0);
    }

    #[test]
    fn test_interrupted() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "b\na\n").unwrap();

        let processor = BatchProcessor::new(
            BatchConfig::default().with_shutdown_flag(Arc::new(AtomicBool::new(true))),
        );
        assert!(matches!(
            processor.process_tree(dir.path()),
            Err(NormalizeError::Interrupted)
        ));
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "b\na\n");
    }

    #[test]
    fn test_lock_is_released_between_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "b\na\n").unwrap();
        fs::write(dir.path().join("b.txt"), "d\nc\n").unwrap();

        let lock = Arc::new(Mutex::new(()));
        let processor = BatchProcessor::new(BatchConfig::default().with_lock(Arc::clone(&lock)));
        processor.process_tree(dir.path()).unwrap();

        assert!(lock.try_lock().is_ok());
    }
}
