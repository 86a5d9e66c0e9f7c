use std::future::Future;
use std::io;

use tokio::io::AsyncRead;

use crate::manifest::ManifestEntry;

/// Opens manifest entries for reading.
///
/// The hashing pipeline only ever reads through this trait. Each reader
/// handed out is owned by one worker task and dropped, closing the
/// underlying handle, when the task finishes or is aborted.
pub trait ContentSource: Send + Sync + 'static {
    type Reader: AsyncRead + Unpin + Send + 'static;

    /// Opens `entry` positioned at its first byte.
    fn open(&self, entry: &ManifestEntry) -> impl Future<Output = io::Result<Self::Reader>> + Send;
}

/// Reads entries from the local filesystem by absolute path.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskSource;

impl ContentSource for DiskSource {
    type Reader = tokio::fs::File;

    fn open(&self, entry: &ManifestEntry) -> impl Future<Output = io::Result<Self::Reader>> + Send {
        tokio::fs::File::open(entry.absolute_path().to_path_buf())
    }
}
