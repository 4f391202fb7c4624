//! linesweep - duplicate removal and line normalization for text directories
//!
//! A run has two one-shot phases over a directory tree, optionally followed
//! by watch mode:
//!
//! 1. [`duplicates`]: files whose content was already seen earlier in the
//!    walk are removed (BLAKE3 fingerprints, first-seen wins).
//! 2. [`normalize`]: every remaining file is rewritten with its lines
//!    trimmed, de-duplicated and sorted, blank and comment lines dropped.
//! 3. [`watch`]: files written afterwards are normalized again once they
//!    have been quiet for the debounce period.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod progress;
pub mod scanner;
pub mod signal;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use cli::Cli;
use config::Config;
use duplicates::{DedupeError, DuplicateEliminator, EliminationSummary};
use error::{ExitCode, UsageError};
use normalize::{BatchConfig, BatchProcessor, BatchSummary, NormalizeError};
use progress::{Progress, ProgressCallback};
use signal::ShutdownHandler;
use watch::{WatchEvent, WatchSession};

/// Outcome of the one-shot phases.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    /// Duplicate elimination results.
    pub elimination: EliminationSummary,
    /// Normalization results.
    pub normalization: BatchSummary,
}

/// Why [`sweep`] stopped early.
#[derive(thiserror::Error, Debug)]
pub enum SweepError {
    /// Ctrl+C during either phase.
    #[error("Interrupted by user")]
    Interrupted,

    /// Duplicate elimination failed.
    #[error("Failed to remove duplicates: {0}")]
    Dedupe(#[source] DedupeError),

    /// Normalization failed.
    #[error("Failed to sort and deduplicate lines: {0}")]
    Normalize(#[source] NormalizeError),
}

impl From<DedupeError> for SweepError {
    fn from(err: DedupeError) -> Self {
        match err {
            DedupeError::Interrupted => Self::Interrupted,
            other => Self::Dedupe(other),
        }
    }
}

impl From<NormalizeError> for SweepError {
    fn from(err: NormalizeError) -> Self {
        match err {
            NormalizeError::Interrupted => Self::Interrupted,
            other => Self::Normalize(other),
        }
    }
}

/// Run both one-shot phases over `root`, stopping at the first error.
///
/// # Errors
///
/// See [`SweepError`].
pub fn sweep(
    root: &Path,
    config: &Config,
    shutdown: &ShutdownHandler,
    progress: Option<Arc<dyn ProgressCallback>>,
) -> Result<SweepReport, SweepError> {
    let mut dedupe_config = config.dedupe_config(shutdown.get_flag());
    let mut batch_config = BatchConfig::default()
        .with_walker_config(config.walker_config())
        .with_shutdown_flag(shutdown.get_flag());
    if let Some(cb) = progress {
        dedupe_config = dedupe_config.with_progress_callback(Arc::clone(&cb));
        batch_config = batch_config.with_progress_callback(cb);
    }

    let elimination = DuplicateEliminator::new(dedupe_config).eliminate(root)?;
    let normalization = BatchProcessor::new(batch_config).process_tree(root)?;

    Ok(SweepReport {
        elimination,
        normalization,
    })
}

/// Check that the requested target is an existing directory.
///
/// # Errors
///
/// See [`UsageError`].
pub fn validate_target(cli: &Cli) -> Result<&Path, UsageError> {
    let root = cli.target_dir()?;
    if !root.exists() {
        return Err(UsageError::NotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(UsageError::NotADirectory(root.to_path_buf()));
    }
    Ok(root)
}

/// Main application logic, called from `main` after argument parsing and
/// logger setup.
///
/// # Errors
///
/// Usage errors, the first failure of a one-shot phase, or a watch mode
/// that could not start.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let root = validate_target(&cli)?.to_path_buf();

    let mut config = Config::load(cli.config.as_deref());
    config.merge_cli(&cli);
    log::debug!("Effective configuration: {:?}", config);

    let shutdown = signal::install_handler()?;
    let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(cli.quiet));

    let report = match sweep(&root, &config, &shutdown, Some(progress)) {
        Ok(report) => report,
        Err(SweepError::Interrupted) => {
            log::warn!("Interrupted, stopping before all files were processed");
            return Ok(ExitCode::Interrupted);
        }
        Err(e) => return Err(e.into()),
    };

    log::info!(
        "Sorting and removing duplicates completed successfully. Removed {} duplicate(s) ({}), normalized {} file(s).",
        report.elimination.duplicates_removed(),
        report.elimination.reclaimed_display(),
        report.normalization.files_processed
    );

    if !cli.watch {
        return Ok(ExitCode::Success);
    }

    let mut session = WatchSession::new(&root, config.watch_config());
    let stats = session
        .run(&shutdown, |event| match event {
            WatchEvent::Processed { path, changed: true } => {
                log::debug!("Rewrote {}", path.display());
            }
            other => log::trace!("{:?}", other),
        })?;

    log::info!(
        "Watch mode stopped: {} file(s) processed, {} error(s)",
        stats.files_processed,
        stats.errors
    );
    if stats.events_dropped > 0 {
        log::warn!("{} change notification(s) dropped", stats.events_dropped);
    }

    Ok(ExitCode::Success)
}
