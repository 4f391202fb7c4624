//! Progress reporting utilities using indicatif.
//!
//! The one-shot phases walk the tree as a stream, so the number of files
//! is not known up front. Each phase therefore gets a spinner with a running
//! file count rather than a bounded bar.
//!
//! Spinners are drawn through one process-wide [`MultiProgress`], which the
//! logger also writes through, so a log line is printed above the spinner
//! instead of into it.

use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Phase name used by duplicate elimination.
pub const PHASE_DEDUPE: &str = "dedupe";
/// Phase name used by batch normalization.
pub const PHASE_NORMALIZE: &str = "normalize";

/// Progress callback for the one-shot phases.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts. `total` is 0 when unknown.
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each file processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Files processed so far in this phase (1-based)
    /// * `path` - Path being processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);
}

/// Draw target shared by every [`Progress`] and the logger.
pub fn shared_bars() -> &'static MultiProgress {
    static BARS: OnceLock<MultiProgress> = OnceLock::new();
    BARS.get_or_init(MultiProgress::new)
}

/// Terminal progress reporter.
pub struct Progress {
    bars: MultiProgress,
    active: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter on the shared draw target.
    /// Nothing is drawn when `quiet`.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self::with_bars(quiet, shared_bars().clone())
    }

    /// Create a progress reporter drawing through `bars`.
    #[must_use]
    pub fn with_bars(quiet: bool, bars: MultiProgress) -> Self {
        Self {
            bars,
            active: Mutex::new(None),
            quiet,
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn with_active(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.active.lock() {
            if let Some(ref pb) = *guard {
                f(pb);
            }
        }
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        let pb = self.bars.add(if total > 0 {
            ProgressBar::new(total as u64)
        } else {
            ProgressBar::new_spinner()
        });
        pb.set_style(Self::spinner_style());
        pb.set_message(match phase {
            PHASE_DEDUPE => "Removing duplicates".to_string(),
            PHASE_NORMALIZE => "Normalizing".to_string(),
            other => other.to_string(),
        });
        pb.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut active) = self.active.lock() {
            if let Some(previous) = active.replace(pb) {
                previous.finish_and_clear();
            }
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }
        let display = truncate_path(path, 40);
        self.with_active(|pb| {
            pb.set_position(current as u64);
            pb.set_message(display);
        });
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }
        if let Ok(mut active) = self.active.lock() {
            if let Some(pb) = active.take() {
                pb.finish_with_message(format!("{phase} complete"));
            }
        }
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len + 4 > max_len {
        let tail: String = file_name
            .chars()
            .skip(name_len.saturating_sub(max_len.saturating_sub(3)))
            .collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
