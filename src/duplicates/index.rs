//! Fingerprint index for a single elimination pass.
//!
//! # Example
//!
//! ```
//! use linesweep::duplicates::{FingerprintIndex, IndexOutcome};
//! use std::path::{Path, PathBuf};
//!
//! let mut index = FingerprintIndex::new();
//! let hash = [7u8; 32];
//!
//! assert_eq!(index.observe(hash, Path::new("a.txt")), IndexOutcome::Canonical);
//! assert_eq!(
//!     index.observe(hash, Path::new("b.txt")),
//!     IndexOutcome::DuplicateOf(PathBuf::from("a.txt"))
//! );
//! ```

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::scanner::Hash;

/// Result of recording a file in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOutcome {
    /// First file with this fingerprint; it is now the canonical copy.
    Canonical,
    /// Fingerprint already seen; holds the canonical path.
    DuplicateOf(PathBuf),
}

/// Map from content fingerprint to the first path seen with it.
#[derive(Debug, Default)]
pub struct FingerprintIndex {
    canonical: HashMap<Hash, PathBuf>,
}

impl FingerprintIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `path` under `hash`. The first path recorded for a hash wins;
    /// later ones are reported as duplicates and never replace it.
    pub fn observe(&mut self, hash: Hash, path: &Path) -> IndexOutcome {
        match self.canonical.entry(hash) {
            Entry::Occupied(existing) => IndexOutcome::DuplicateOf(existing.get().clone()),
            Entry::Vacant(slot) => {
                slot.insert(path.to_path_buf());
                IndexOutcome::Canonical
            }
        }
    }

    /// Canonical path for a fingerprint, if any.
    #[must_use]
    pub fn canonical_for(&self, hash: &Hash) -> Option<&Path> {
        self.canonical.get(hash).map(PathBuf::as_path)
    }

    /// Number of distinct fingerprints seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    /// `true` when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}
