//! Per-path debouncing.
//!
//! Every write notification (re)starts a timer for its path. A path becomes
//! ready once no new notification for it arrived within the delay, so a
//! burst of writes to one file collapses into a single normalization pass.
//! Timers of different paths are independent.
//!
//! The type holds no clock of its own: callers pass `now`, which keeps it
//! deterministic under test.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Coalescing debounce stage keyed by path.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: HashMap<PathBuf, Instant>,
}

impl Debouncer {
    /// Create a debouncer with the given quiet period.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: HashMap::new(),
        }
    }

    /// Quiet period before a path is released.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record a write to `path` at `now`. Returns `true` if the path was
    /// not already pending.
    pub fn record(&mut self, path: PathBuf, now: Instant) -> bool {
        self.pending.insert(path, now + self.delay).is_none()
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().copied()
    }

    /// Time left until the earliest deadline (zero if already due).
    #[must_use]
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Remove and return every path whose deadline has passed, earliest
    /// deadline first.
    pub fn take_ready(&mut self, now: Instant) -> Vec<PathBuf> {
        let mut ready: Vec<(Instant, PathBuf)> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(path, deadline)| (*deadline, path.clone()))
            .collect();

        for (_, path) in &ready {
            self.pending.remove(path);
        }

        ready.sort();
        ready.into_iter().map(|(_, path)| path).collect()
    }

    /// Number of paths waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// `true` when nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
