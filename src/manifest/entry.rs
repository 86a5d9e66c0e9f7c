use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Result, TorrentError};

/// A single file in a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    relative_path: String,
    absolute_path: PathBuf,
    size: u64,
    offset: u64,
}

impl ManifestEntry {
    pub(super) fn new(relative_path: String, absolute_path: PathBuf, size: u64) -> Self {
        Self {
            relative_path,
            absolute_path,
            size,
            offset: 0,
        }
    }

    /// Path below the manifest root, `/`-separated on every platform.
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// Path segments as written to the `path` list of the `files` entry.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.relative_path.split('/')
    }

    pub fn absolute_path(&self) -> &Path {
        &self.absolute_path
    }

    /// Declared size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Byte offset of the first byte of this file in the concatenated stream.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// One past the last byte of this file in the concatenated stream.
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }
}

/// A finalized, sorted list of files.
///
/// Cloning is cheap; the entries are shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileManifest {
    root: PathBuf,
    entries: Arc<[ManifestEntry]>,
    total_size: u64,
}

impl FileManifest {
    /// Sorts entries, assigns their stream offsets and freezes them.
    ///
    /// Fails with [`TorrentError::InvalidPath`] on the first entry whose end
    /// offset does not fit in a `u64`.
    pub(super) fn from_unsorted(root: PathBuf, mut entries: Vec<ManifestEntry>) -> Result<Self> {
        entries.sort_unstable_by(|a, b| a.relative_path.as_bytes().cmp(b.relative_path.as_bytes()));

        let mut offset = 0u64;
        for entry in &mut entries {
            entry.offset = offset;
            offset = offset.checked_add(entry.size).ok_or_else(|| {
                TorrentError::invalid_path(&entry.absolute_path, "total size overflows")
            })?;
        }

        Ok(Self {
            root,
            entries: entries.into(),
            total_size: offset,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&ManifestEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a finalized manifest; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all entry sizes.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }
}
