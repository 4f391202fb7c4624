//! Duplicate elimination module.
//!
//! This module provides functionality for:
//! - Content fingerprint indexing ([`index`])
//! - Single-pass, first-seen-wins removal of duplicate files ([`eliminator`])

pub mod eliminator;
pub mod index;

pub use eliminator::{
    DedupeConfig, DedupeError, DuplicateEliminator, EliminationSummary, RemovedDuplicate,
};
pub use index::{FingerprintIndex, IndexOutcome};
