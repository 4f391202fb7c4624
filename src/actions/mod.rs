//! File actions module.
//!
//! Duplicate files found by [`crate::duplicates`] are removed through
//! [`delete::remove_file`]:
//! - Permanent deletion (default)
//! - Move to system trash (opt-in, recoverable)
//!
//! ```no_run
//! use linesweep::actions::{remove_file, DeletionMode};
//! use std::path::Path;
//!
//! let result = remove_file(Path::new("/path/to/copy.txt"), DeletionMode::Permanent);
//! ```

pub mod delete;

// Re-export commonly used types
pub use delete::{
    delete_to_trash, permanent_delete, remove_file, DeleteError, DeleteResult, DeletionMode,
};
