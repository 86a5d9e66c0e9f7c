use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use super::builder::ManifestBuilder;
use super::entry::FileManifest;
use crate::error::Result;

/// A cloneable handle for feeding one manifest from several producers.
///
/// Each clone shares the same [`ManifestBuilder`]; `add_file` calls are
/// serialized by a lock, and the final order is fixed by sorting in
/// [`finish`](Self::finish), so producer scheduling never shows in the output.
#[derive(Debug, Clone)]
pub struct ManifestCollector {
    inner: Arc<Mutex<ManifestBuilder>>,
}

impl ManifestCollector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ManifestBuilder::new(root))),
        }
    }

    /// See [`ManifestBuilder::add_file`].
    pub fn add_file(&self, absolute_path: impl AsRef<Path>, size_bytes: i64) -> Result<()> {
        self.inner.lock().add_file(absolute_path, size_bytes)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Finalizes the shared builder.
    ///
    /// Entries added through other clones are included. Clones still alive
    /// afterwards keep a fresh, empty builder for the same root.
    pub fn finish(self) -> Result<FileManifest> {
        let builder = {
            let mut guard = self.inner.lock();
            let root = guard.root().to_path_buf();
            std::mem::replace(&mut *guard, ManifestBuilder::new(root))
        };
        builder.finalize()
    }
}
