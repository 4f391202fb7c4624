//! Exit codes and top-level usage errors.

use std::path::PathBuf;

/// Process exit codes.
///
/// - 0: Success (both passes completed, or watch mode stopped cleanly)
/// - 1: General error (bad target, I/O failure, watcher setup failure)
/// - 130: Interrupted by user (Ctrl+C during a one-shot pass)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Completed normally.
    Success = 0,
    /// An error stopped the run.
    GeneralError = 1,
    /// A one-shot pass was interrupted by Ctrl+C.
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "LS000",
            Self::GeneralError => "LS001",
            Self::Interrupted => "LS130",
        }
    }
}

/// Problems with the target directory, detected before any file is touched.
#[derive(thiserror::Error, Debug)]
pub enum UsageError {
    /// Neither a positional path nor `-path` was given.
    #[error("Please specify a directory path")]
    MissingPath,

    /// The target does not exist.
    #[error("Directory not found: {0}")]
    NotFound(PathBuf),

    /// The target exists but is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}
