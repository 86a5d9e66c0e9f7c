//! Recursive directory walking.
//!
//! A minimal default crawler: every regular file below a directory is added
//! with its on-disk length. Symbolic links are not followed.

use std::io;
use std::path::Path;

use walkdir::WalkDir;

use super::builder::ManifestBuilder;
use crate::constants::MAX_WALK_DEPTH;
use crate::error::{Result, TorrentError};

impl ManifestBuilder {
    /// Adds every regular file below `dir`, returning how many were added.
    ///
    /// `dir` must lie inside the builder's root (or be the root itself).
    /// Directories nested more than [`MAX_WALK_DEPTH`] levels below `dir`
    /// are skipped.
    pub fn add_directory(&mut self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        let before = self.len();

        let walker = WalkDir::new(dir)
            .follow_links(false)
            .max_depth(MAX_WALK_DEPTH + 1);

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(dir).to_path_buf();
                TorrentError::file_read(path, io::Error::from(e))
            })?;
            let path = entry.path();
            let file_type = entry.file_type();

            if file_type.is_dir() {
                if entry.depth() > MAX_WALK_DEPTH {
                    tracing::warn!(
                        path = %path.display(),
                        max_depth = MAX_WALK_DEPTH,
                        "skipping directory, exceeded max depth"
                    );
                }
            } else if file_type.is_file() {
                let len = entry
                    .metadata()
                    .map_err(|e| TorrentError::file_read(path, io::Error::from(e)))?
                    .len();
                let len = i64::try_from(len)
                    .map_err(|_| TorrentError::invalid_path(path, "file too large"))?;
                self.add_file(path, len)?;
            } else {
                tracing::trace!(path = %path.display(), "skipping non-regular file");
            }
        }

        Ok(self.len() - before)
    }
}
