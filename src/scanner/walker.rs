//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! [`Walker`] yields every non-directory entry under a root directory:
//! regular files, and symlinks whose target is a file (reported under the
//! link's path). Symlinked directories are only descended into when
//! `follow_symlinks` is set. Entries of each directory are sorted by file
//! name before being visited, so the visit order is depth-first and
//! identical on every platform. Duplicate removal keeps the first file it
//! sees, so this order is what decides which copy survives.
//!
//! Errors are yielded in-line rather than stopping iteration; callers that
//! want fail-fast behaviour simply stop at the first `Err`.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{FileEntry, ScanError, WalkerConfig};

/// Sequential directory walker for file discovery.
#[derive(Debug, Clone)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
        }
    }

    /// Root directory of this walker.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the directory tree, yielding candidate files in visit order.
    ///
    /// Directories are never yielded. A symlink is yielded when its target
    /// is a file; a dangling link is yielded as a `NotFound` error, since
    /// the file it names cannot be read.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    let file_type = entry.file_type();

                    if file_type.is_dir() {
                        return None;
                    }

                    if file_type.is_symlink() {
                        // Only reachable when links are not followed.
                        return self.resolve_link(entry.path());
                    }

                    if !file_type.is_file() {
                        log::trace!("Skipping special file: {}", entry.path().display());
                        return None;
                    }

                    let path = entry.path().to_path_buf();
                    match entry.metadata() {
                        Ok(metadata) => Some(Ok(FileEntry::new(path, metadata.len()))),
                        Err(e) => Some(Err(self.handle_walk_error(e))),
                    }
                }
                Err(e) => Some(Err(self.handle_walk_error(e))),
            })
    }

    /// Candidate entry for a symlink that was not followed.
    fn resolve_link(&self, path: &Path) -> Option<Result<FileEntry, ScanError>> {
        match std::fs::metadata(path) {
            Ok(target) if target.is_file() => {
                Some(Ok(FileEntry::new(path.to_path_buf(), target.len())))
            }
            Ok(_) => {
                log::trace!("Not descending into linked directory: {}", path.display());
                None
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Dangling symlink: {}", path.display());
                Some(Err(ScanError::NotFound(path.to_path_buf())))
            }
            Err(e) => Some(Err(ScanError::Io {
                path: path.to_path_buf(),
                source: e,
            })),
        }
    }

    /// Convert a walkdir error into a [`ScanError`].
    fn handle_walk_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);

        if error.loop_ancestor().is_some() {
            log::warn!("Symlink loop at {}", path.display());
            return ScanError::Loop(path);
        }

        match error.into_io_error() {
            Some(io) => match io.kind() {
                std::io::ErrorKind::PermissionDenied => {
                    log::warn!("Permission denied: {}", path.display());
                    ScanError::PermissionDenied(path)
                }
                std::io::ErrorKind::NotFound => {
                    log::debug!("Path vanished during walk: {}", path.display());
                    ScanError::NotFound(path)
                }
                _ => ScanError::Io { path, source: io },
            },
            None => ScanError::Io {
                path,
                source: std::io::Error::other("directory walk failed"),
            },
        }
    }
}
