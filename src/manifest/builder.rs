use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use super::entry::{FileManifest, ManifestEntry};
use crate::error::{Result, TorrentError};

/// Collects files below a fixed root into a [`FileManifest`].
///
/// Insertion order is irrelevant; [`finalize`](Self::finalize) sorts.
#[derive(Debug)]
pub struct ManifestBuilder {
    root: PathBuf,
    entries: Vec<ManifestEntry>,
    seen: HashSet<String>,
}

impl ManifestBuilder {
    /// Creates a builder whose relative paths are computed against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of files added so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds a file found at `absolute_path` with the given size.
    ///
    /// # Errors
    ///
    /// Returns [`TorrentError::InvalidPath`] if the path does not lie strictly
    /// inside the root, contains `.`/`..` segments or non-UTF-8 text, was
    /// already added, or if `size_bytes` is negative.
    pub fn add_file(&mut self, absolute_path: impl AsRef<Path>, size_bytes: i64) -> Result<()> {
        let absolute_path = absolute_path.as_ref();

        let size = u64::try_from(size_bytes)
            .map_err(|_| TorrentError::invalid_path(absolute_path, "negative file size"))?;

        let relative_path = self.relative_path(absolute_path)?;
        if !self.seen.insert(relative_path.clone()) {
            return Err(TorrentError::invalid_path(absolute_path, "duplicate path"));
        }

        self.entries.push(ManifestEntry::new(
            relative_path,
            absolute_path.to_path_buf(),
            size,
        ));
        Ok(())
    }

    /// Sorts the collected entries and freezes them.
    ///
    /// # Errors
    ///
    /// Returns [`TorrentError::EmptyManifest`] if no file was added, or
    /// [`TorrentError::InvalidPath`] if the sizes add up to more than
    /// `u64::MAX` bytes.
    pub fn finalize(self) -> Result<FileManifest> {
        if self.entries.is_empty() {
            return Err(TorrentError::EmptyManifest);
        }

        let manifest = FileManifest::from_unsorted(self.root, self.entries)?;
        tracing::debug!(
            files = manifest.len(),
            total_size = manifest.total_size(),
            "manifest finalized"
        );
        Ok(manifest)
    }

    fn relative_path(&self, absolute_path: &Path) -> Result<String> {
        let relative = absolute_path
            .strip_prefix(&self.root)
            .map_err(|_| TorrentError::invalid_path(absolute_path, "outside of torrent root"))?;

        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(segment) => {
                    let segment = segment.to_str().ok_or_else(|| {
                        TorrentError::invalid_path(absolute_path, "path is not valid UTF-8")
                    })?;
                    segments.push(segment);
                }
                Component::CurDir | Component::ParentDir => {
                    return Err(TorrentError::invalid_path(
                        absolute_path,
                        "relative segments are not allowed",
                    ));
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(TorrentError::invalid_path(
                        absolute_path,
                        "outside of torrent root",
                    ));
                }
            }
        }

        if segments.is_empty() {
            return Err(TorrentError::invalid_path(absolute_path, "path is the torrent root"));
        }

        Ok(segments.join("/"))
    }
}
