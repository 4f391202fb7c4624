//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config FILE`, else `config.toml` in the platform config dir)
//! 3. `LINESWEEP_*` environment variables (e.g. `LINESWEEP_DEBOUNCE_MS=250`)
//! 4. Command-line flags, applied with [`Config::merge_cli`]

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::actions::DeletionMode;
use crate::cli::Cli;
use crate::duplicates::DedupeConfig;
use crate::scanner::{Hasher, WalkerConfig};
use crate::watch::{OverflowPolicy, WatchConfig};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "LINESWEEP_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Watch debounce in milliseconds.
    pub debounce_ms: u64,
    /// Change notification buffer capacity.
    pub event_buffer: usize,
    /// Full-buffer behaviour.
    pub overflow: OverflowPolicy,
    /// Descend into symlinked directories.
    pub follow_symlinks: bool,
    /// Move duplicates to the trash instead of deleting them.
    pub use_trash: bool,
    /// Memory-map files at least this large when hashing. Unset disables mmap.
    pub mmap_threshold: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debounce_ms: 1000,
            event_buffer: 10,
            overflow: OverflowPolicy::Block,
            follow_symlinks: false,
            use_trash: false,
            mmap_threshold: None,
        }
    }
}

impl Config {
    /// Load the layered configuration, falling back to defaults on error.
    ///
    /// `path` overrides the platform config file location.
    #[must_use]
    pub fn load(path: Option<&Path>) -> Self {
        match Self::load_from_path(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Load defaults, the TOML file and environment overrides.
    ///
    /// A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns the figment error for malformed TOML or mistyped values.
    pub fn load_from_path(path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        match path.map(Path::to_path_buf).or_else(Self::config_path) {
            Some(file) => {
                log::debug!("Reading configuration from {}", file.display());
                figment = figment.merge(Toml::file(file));
            }
            None => log::debug!("No configuration directory available"),
        }

        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
    }

    /// Default platform-specific configuration path.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "linesweep", "linesweep")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply command-line overrides.
    pub fn merge_cli(&mut self, cli: &Cli) {
        if let Some(ms) = cli.debounce_ms {
            self.debounce_ms = ms;
        }
        if let Some(buffer) = cli.buffer {
            self.event_buffer = usize::try_from(buffer).unwrap_or(usize::MAX);
        }
        if let Some(policy) = cli.overflow {
            self.overflow = policy;
        }
        if cli.follow_symlinks {
            self.follow_symlinks = true;
        }
        if cli.trash {
            self.use_trash = true;
        }
    }

    /// Walk options shared by every phase.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::new(self.follow_symlinks)
    }

    /// Duplicate-elimination settings.
    #[must_use]
    pub fn dedupe_config(&self, shutdown_flag: Arc<AtomicBool>) -> DedupeConfig {
        let hasher = match self.mmap_threshold {
            Some(threshold) => Hasher::new().with_mmap(true).with_mmap_threshold(threshold),
            None => Hasher::new(),
        };
        let deletion = if self.use_trash {
            DeletionMode::Trash
        } else {
            DeletionMode::Permanent
        };

        DedupeConfig::default()
            .with_walker_config(self.walker_config())
            .with_deletion(deletion)
            .with_hasher(hasher)
            .with_shutdown_flag(shutdown_flag)
    }

    /// Watch-mode settings.
    #[must_use]
    pub fn watch_config(&self) -> WatchConfig {
        WatchConfig::default()
            .with_debounce(Duration::from_millis(self.debounce_ms))
            .with_event_buffer(self.event_buffer)
            .with_overflow(self.overflow)
            .with_walker_config(self.walker_config())
    }
}
