//! Command-line interface definitions for linesweep.
//!
//! Arguments are defined with the clap derive API. The single-dash long
//! flags accepted by earlier releases (`-path`, `-watch`, `-version`) are
//! rewritten to their double-dash forms by [`normalize_legacy_args`] before
//! clap sees them.
//!
//! # Example
//!
//! ```bash
//! # Remove duplicates and normalize every file once
//! linesweep ~/lists
//!
//! # Same, then keep the directory normalized as files change
//! linesweep -path ~/lists -watch
//!
//! # Shorter debounce, drop events instead of blocking when busy
//! linesweep ~/lists --watch --debounce-ms 250 --overflow drop
//! ```

use clap::Parser;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::UsageError;
use crate::watch::OverflowPolicy;

/// Single-dash long flags and their clap spelling.
const LEGACY_FLAGS: [(&str, &str); 3] = [
    ("-path", "--path"),
    ("-watch", "--watch"),
    ("-version", "--version"),
];

/// Remove duplicate files and keep line-oriented text files sorted and unique.
///
/// Every file under the target directory is fingerprinted; later
/// copies of content already seen are removed. Each remaining file is then
/// rewritten with trimmed, de-duplicated, sorted lines, with blank and
/// comment lines dropped.
#[derive(Debug, Parser)]
#[command(name = "linesweep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to process
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Directory to process (the positional PATH wins if both are given)
    #[arg(long = "path", value_name = "DIR")]
    pub path_flag: Option<PathBuf>,

    /// Keep watching the directory after the initial pass
    #[arg(long)]
    pub watch: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Quiet period before a changed file is processed, in milliseconds
    #[arg(long, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Capacity of the change notification buffer
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub buffer: Option<u64>,

    /// What to do with change notifications when the buffer is full
    #[arg(long, value_enum, value_name = "POLICY")]
    pub overflow: Option<OverflowPolicy>,

    /// Move duplicates to the system trash instead of deleting them
    #[arg(long)]
    pub trash: bool,

    /// Descend into symlinked directories while walking
    ///
    /// Symlinks to files are always processed; their targets are rewritten
    /// in place.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, value_name = "FILE", env = "LINESWEEP_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// The directory to operate on.
    ///
    /// # Errors
    ///
    /// [`UsageError::MissingPath`] when neither form was given.
    pub fn target_dir(&self) -> Result<&Path, UsageError> {
        self.path
            .as_deref()
            .or(self.path_flag.as_deref())
            .ok_or(UsageError::MissingPath)
    }
}

/// Rewrite `-path`, `-path=DIR`, `-watch` and `-version` to double-dash form.
///
/// The program name, option values and anything after `--` pass through
/// untouched.
pub fn normalize_legacy_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut out = Vec::new();
    let mut iter = args.into_iter().map(Into::into);

    if let Some(program) = iter.next() {
        out.push(program);
    }

    let mut passthrough = false;
    let mut expects_value = false;

    for arg in iter {
        if passthrough || expects_value {
            expects_value = false;
            out.push(arg);
            continue;
        }

        let Some(text) = arg.to_str() else {
            out.push(arg);
            continue;
        };

        if text == "--" {
            passthrough = true;
            out.push(arg);
            continue;
        }

        if let Some(value) = text.strip_prefix("-path=") {
            out.push(format!("--path={value}").into());
            continue;
        }

        match LEGACY_FLAGS.iter().find(|(legacy, _)| *legacy == text) {
            Some((_, modern)) => {
                expects_value = *modern == "--path";
                out.push((*modern).into());
            }
            None => {
                expects_value = takes_value(text);
                out.push(arg);
            }
        }
    }

    out
}

/// Options whose next argument is a value and must not be rewritten.
fn takes_value(flag: &str) -> bool {
    matches!(
        flag,
        "--path" | "--debounce-ms" | "--buffer" | "--overflow" | "--config"
    )
}
