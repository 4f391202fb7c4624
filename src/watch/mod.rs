//! Watch mode: keep a directory normalized as files are written.
//!
//! # Overview
//!
//! A [`WatchSession`] moves through these states:
//!
//! ```text
//! Idle -> Watching -> Debouncing -> Processing -> Watching ... -> Stopped
//! ```
//!
//! On start it normalizes every file once, then subscribes to recursive
//! change notifications for the root. Two threads are involved from then
//! on: the `notify` backend thread pushes raw events into a bounded
//! channel, and the thread that called [`WatchSession::run`] consumes
//! them. Write notifications enter a per-path [`Debouncer`]; when a path's
//! quiet period expires the session takes the context lock, checks that the
//! file still exists and normalizes it.
//!
//! Per-file failures and transport errors are logged and the loop keeps
//! going. The loop ends only when the [`ShutdownHandler`] is raised.
//!
//! # Example
//!
//! ```no_run
//! use linesweep::signal::install_handler;
//! use linesweep::watch::{WatchConfig, WatchSession};
//! use std::path::Path;
//!
//! let shutdown = install_handler().unwrap();
//! let mut session = WatchSession::new(Path::new("/srv/lists"), WatchConfig::default());
//! let stats = session.run(&shutdown, |_| {}).unwrap();
//! println!("normalized {} files", stats.files_processed);
//! ```

pub mod debounce;
pub mod event;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, TrySendError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use notify::{RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};

pub use debounce::Debouncer;
pub use event::WatchEvent;

use crate::normalize::{normalize_file, BatchConfig, BatchProcessor, NormalizeError};
use crate::scanner::WalkerConfig;
use crate::signal::ShutdownHandler;

/// Default quiet period before a written file is processed.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(1);

/// Default capacity of the notification channel.
pub const DEFAULT_EVENT_BUFFER: usize = 10;

/// Upper bound on how long the loop waits before re-checking shutdown.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What happens when the notification channel is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// The notifier thread waits until the loop drains an event.
    #[default]
    Block,
    /// The new event is discarded and counted.
    Drop,
}

/// Watch session settings.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Quiet period per path.
    pub debounce: Duration,
    /// Notification channel capacity (at least 1).
    pub event_buffer: usize,
    /// Full-channel behaviour.
    pub overflow: OverflowPolicy,
    /// Walk options for the startup pass.
    pub walker_config: WalkerConfig,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            event_buffer: DEFAULT_EVENT_BUFFER,
            overflow: OverflowPolicy::Block,
            walker_config: WalkerConfig::default(),
        }
    }
}

impl WatchConfig {
    /// Set the debounce delay.
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Set the channel capacity.
    #[must_use]
    pub fn with_event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity.max(1);
        self
    }

    /// Set the overflow policy.
    #[must_use]
    pub fn with_overflow(mut self, policy: OverflowPolicy) -> Self {
        self.overflow = policy;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }
}

/// State shared by sessions that must not normalize concurrently.
///
/// Cloning shares the lock.
#[derive(Debug, Clone, Default)]
pub struct WatchContext {
    lock: Arc<Mutex<()>>,
}

impl WatchContext {
    /// Create a context with a fresh lock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The processing lock.
    #[must_use]
    pub fn lock(&self) -> Arc<Mutex<()>> {
        Arc::clone(&self.lock)
    }
}

/// Lifecycle of a watch session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Not started.
    Idle,
    /// Subscribed, nothing pending.
    Watching,
    /// At least one path is waiting out its quiet period.
    Debouncing,
    /// Normalizing a file under the lock.
    Processing,
    /// Shut down.
    Stopped,
}

/// Counters collected over a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchStats {
    /// Raw notifications received.
    pub events_received: usize,
    /// Notifications that were not writes (or were for ignored paths).
    pub events_ignored: usize,
    /// Notifications discarded under [`OverflowPolicy::Drop`].
    pub events_dropped: usize,
    /// Files normalized after debouncing.
    pub files_processed: usize,
    /// Files gone by the time their quiet period ended.
    pub files_skipped: usize,
    /// Errors logged and survived.
    pub errors: usize,
}

/// Errors that prevent watch mode from starting.
#[derive(thiserror::Error, Debug)]
pub enum WatchError {
    /// The change subscription could not be created or attached.
    #[error("Failed to watch {path}: {source}")]
    Setup {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// A watch session over one directory tree.
#[derive(Debug)]
pub struct WatchSession {
    root: PathBuf,
    config: WatchConfig,
    context: WatchContext,
    state: WatchState,
}

impl WatchSession {
    /// Create a session with its own [`WatchContext`].
    #[must_use]
    pub fn new(root: &Path, config: WatchConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
            context: WatchContext::new(),
            state: WatchState::Idle,
        }
    }

    /// Share a context (and so the processing lock) with other sessions.
    #[must_use]
    pub fn with_context(mut self, context: WatchContext) -> Self {
        self.context = context;
        self
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Root directory being watched.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn transition(&mut self, next: WatchState) {
        if self.state != next {
            log::trace!("Watch state: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    /// Run until `shutdown` is raised.
    ///
    /// `observer` is called for every [`WatchEvent`], on the calling thread.
    ///
    /// # Errors
    ///
    /// [`WatchError::Setup`] if the subscription cannot be established.
    /// Nothing that happens after that is returned as an error.
    pub fn run<F>(
        &mut self,
        shutdown: &ShutdownHandler,
        observer: F,
    ) -> Result<WatchStats, WatchError>
    where
        F: Fn(&WatchEvent),
    {
        let mut stats = WatchStats::default();
        self.transition(WatchState::Watching);

        if !self.initial_pass(shutdown, &mut stats) {
            self.transition(WatchState::Stopped);
            observer(&WatchEvent::Shutdown);
            return Ok(stats);
        }

        let capacity = self.config.event_buffer.max(1);
        let (tx, rx) = mpsc::sync_channel::<notify::Result<notify::Event>>(capacity);
        let dropped = Arc::new(AtomicUsize::new(0));
        let handler_dropped = Arc::clone(&dropped);
        let policy = self.config.overflow;

        let handler = move |res: notify::Result<notify::Event>| match policy {
            OverflowPolicy::Block => {
                let _ = tx.send(res);
            }
            OverflowPolicy::Drop => match tx.try_send(res) {
                Ok(()) | Err(TrySendError::Disconnected(_)) => {}
                Err(TrySendError::Full(_)) => {
                    handler_dropped.fetch_add(1, Ordering::Relaxed);
                    log::warn!("Event buffer full ({}), dropping notification", capacity);
                }
            },
        };

        let setup_err = |source| WatchError::Setup {
            path: self.root.clone(),
            source,
        };
        let mut watcher = notify::recommended_watcher(handler).map_err(setup_err)?;
        watcher
            .watch(&self.root, RecursiveMode::Recursive)
            .map_err(setup_err)?;

        log::info!("Watching directory: {}", self.root.display());
        observer(&WatchEvent::Started {
            root: self.root.clone(),
        });

        let mut debouncer = Debouncer::new(self.config.debounce);

        while !shutdown.is_shutdown_requested() {
            let timeout = debouncer
                .time_until_next(Instant::now())
                .map_or(POLL_INTERVAL, |left| left.min(POLL_INTERVAL));

            match rx.recv_timeout(timeout) {
                Ok(Ok(raw)) => {
                    stats.events_received += 1;
                    let paths = event::written_paths(&raw);
                    if paths.is_empty() {
                        stats.events_ignored += 1;
                        log::trace!("Ignoring {:?} for {:?}", raw.kind, raw.paths);
                    }
                    for path in paths {
                        if debouncer.record(path.clone(), Instant::now()) {
                            log::debug!("Change detected: {}", path.display());
                        }
                        observer(&WatchEvent::FileChanged { path });
                    }
                }
                Ok(Err(err)) => {
                    stats.errors += 1;
                    log::error!("Watch error: {}", err);
                    observer(&WatchEvent::Error {
                        message: err.to_string(),
                    });
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    log::warn!("Change notifier disconnected, stopping watch");
                    break;
                }
            }

            if !debouncer.is_empty() {
                self.transition(WatchState::Debouncing);
            }

            for path in debouncer.take_ready(Instant::now()) {
                self.transition(WatchState::Processing);
                self.process_path(&path, &mut stats, &observer);
            }

            if debouncer.is_empty() {
                self.transition(WatchState::Watching);
            }
        }

        // Unblock a notifier stuck on a full channel before tearing it down.
        drop(rx);
        drop(watcher);

        stats.events_dropped = dropped.load(Ordering::Relaxed);
        self.transition(WatchState::Stopped);
        log::info!("Stopped watching {}", self.root.display());
        observer(&WatchEvent::Shutdown);
        Ok(stats)
    }

    /// Normalize everything once before subscribing. Returns `false` if
    /// shutdown was requested meanwhile.
    fn initial_pass(&self, shutdown: &ShutdownHandler, stats: &mut WatchStats) -> bool {
        let batch = BatchProcessor::new(
            BatchConfig::default()
                .with_walker_config(self.config.walker_config.clone())
                .with_continue_on_error(true)
                .with_lock(self.context.lock())
                .with_shutdown_flag(shutdown.get_flag()),
        );

        match batch.process_tree(&self.root) {
            Ok(summary) => {
                stats.errors += summary.failures.len();
                log::debug!(
                    "Startup pass: {} files, {} rewritten",
                    summary.files_processed,
                    summary.files_rewritten
                );
                true
            }
            Err(NormalizeError::Interrupted) => false,
            Err(e) => {
                stats.errors += 1;
                log::error!("Error walking directory: {}", e);
                true
            }
        }
    }

    /// Verify-and-normalize critical section for one debounced path.
    fn process_path<F>(&self, path: &Path, stats: &mut WatchStats, observer: &F)
    where
        F: Fn(&WatchEvent),
    {
        let lock = self.context.lock();
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if !path.exists() {
            log::debug!("File vanished before processing: {}", path.display());
            stats.files_skipped += 1;
            observer(&WatchEvent::Skipped {
                path: path.to_path_buf(),
            });
            return;
        }
        if !path.is_file() {
            log::trace!("Not a regular file, skipping: {}", path.display());
            return;
        }

        log::info!("Processing file: {}", path.display());
        match normalize_file(path) {
            Ok(outcome) => {
                stats.files_processed += 1;
                observer(&WatchEvent::Processed {
                    path: path.to_path_buf(),
                    changed: outcome.changed,
                });
            }
            Err(e) => {
                stats.errors += 1;
                log::error!("Error processing file {}: {}", path.display(), e);
                observer(&WatchEvent::Error {
                    message: e.to_string(),
                });
            }
        }
    }
}
