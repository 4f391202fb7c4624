//! BLAKE3 file hasher with streaming support.
//!
//! # Overview
//!
//! [`Hasher`] computes a [`Hash`] fingerprint of a file's full content.
//! Content is pushed through the digest in fixed-size chunks, so memory
//! use stays flat no matter how large the file is. Very large files can
//! optionally be memory-mapped and hashed on the rayon pool instead; both
//! paths produce the same digest.
//!
//! # Example
//!
//! ```no_run
//! use linesweep::scanner::{hash_to_hex, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let hash = hasher.full_hash(Path::new("notes.txt")).unwrap();
//! println!("{}", hash_to_hex(&hash));
//! ```

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use super::HashError;

/// A file content fingerprint (BLAKE3, 32 bytes).
pub type Hash = [u8; 32];

/// Read buffer size for streaming hashing.
const BUFFER_SIZE: usize = 64 * 1024;

/// Streaming BLAKE3 file hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    use_mmap: bool,
    mmap_threshold: u64,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher that always streams.
    #[must_use]
    pub fn new() -> Self {
        Self {
            use_mmap: false,
            mmap_threshold: 64 * 1024 * 1024,
        }
    }

    /// Enable or disable memory-mapped hashing.
    #[must_use]
    pub fn with_mmap(mut self, enabled: bool) -> Self {
        self.use_mmap = enabled;
        self
    }

    /// Minimum file size (bytes) for which mmap hashing is used.
    #[must_use]
    pub fn with_mmap_threshold(mut self, threshold: u64) -> Self {
        self.mmap_threshold = threshold;
        self
    }

    /// Compute the fingerprint of the entire file.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read.
    pub fn full_hash(&self, path: &Path) -> Result<Hash, HashError> {
        if self.use_mmap {
            let size = std::fs::metadata(path)
                .map_err(|e| HashError::from_io(path, e))?
                .len();
            if size >= self.mmap_threshold {
                log::trace!("Hashing {} via mmap ({} bytes)", path.display(), size);
                let mut hasher = blake3::Hasher::new();
                hasher
                    .update_mmap_rayon(path)
                    .map_err(|e| HashError::from_io(path, e))?;
                return Ok(*hasher.finalize().as_bytes());
            }
        }

        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        self.hash_reader(file)
            .map_err(|e| HashError::from_io(path, e))
    }

    /// Stream any reader through the digest.
    fn hash_reader<R: Read>(&self, mut reader: R) -> std::io::Result<Hash> {
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; BUFFER_SIZE];

        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    hasher.update(&buffer[..n]);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(*hasher.finalize().as_bytes())
    }
}

/// Render a fingerprint as lowercase hex.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    blake3::Hash::from(*hash).to_hex().to_string()
}
