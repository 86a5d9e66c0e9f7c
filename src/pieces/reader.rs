use std::ops::ControlFlow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tokio::io::AsyncReadExt;
use tokio::sync::{mpsc, watch, OwnedSemaphorePermit, Semaphore};

use super::source::ContentSource;
use crate::error::{Result, TorrentError};
use crate::manifest::{FileManifest, ManifestEntry};

/// A slice of one file tagged with its offset in the concatenated stream.
///
/// A chunk read ahead of the stream position holds a window permit until the
/// sequencer releases it.
#[derive(Debug)]
pub(super) struct Chunk {
    pub(super) offset: u64,
    pub(super) data: Bytes,
    pub(super) permit: Option<OwnedSemaphorePermit>,
}

/// One member of the reader pool.
///
/// Readers claim whole files in manifest order from a shared cursor, so the
/// file holding the sequencer's next offset is always claimed before any
/// later one. Reading any chunk other than the one the sequencer waits for
/// takes a permit from `permits`, so at most `window` chunks are ever read
/// ahead. The awaited chunk needs no permit, so the pool cannot stall on its
/// own backpressure.
pub(super) struct Reader<S> {
    pub(super) id: usize,
    pub(super) manifest: FileManifest,
    pub(super) source: Arc<S>,
    pub(super) cursor: Arc<AtomicUsize>,
    pub(super) chunk_size: usize,
    pub(super) permits: Arc<Semaphore>,
    pub(super) chunks: mpsc::Sender<Result<Chunk>>,
    pub(super) released: watch::Receiver<u64>,
}

impl<S: ContentSource> Reader<S> {
    pub(super) async fn run(mut self) {
        loop {
            let index = self.cursor.fetch_add(1, Ordering::Relaxed);
            let Some(entry) = self.manifest.get(index).cloned() else {
                break;
            };

            match self.read_file(&entry).await {
                Ok(ControlFlow::Continue(())) => {}
                Ok(ControlFlow::Break(())) => break,
                Err(err) => {
                    tracing::debug!(reader = self.id, error = %err, "reader failed");
                    // The sequencer may already be gone; nothing else to report to.
                    let _ = self.chunks.send(Err(err)).await;
                    break;
                }
            }
        }
        tracing::trace!(reader = self.id, "reader finished");
    }

    /// Streams one file as chunks; `Break` means the pipeline shut down.
    async fn read_file(&mut self, entry: &ManifestEntry) -> Result<ControlFlow<()>> {
        let path = entry.absolute_path();
        let mut file = self
            .source
            .open(entry)
            .await
            .map_err(|e| TorrentError::file_read(path, e))?;

        let mut offset = entry.offset();
        let end = entry.end();
        while offset < end {
            let ControlFlow::Continue(permit) =
                admit(&mut self.released, &self.permits, offset).await
            else {
                return Ok(ControlFlow::Break(()));
            };

            let len = (end - offset).min(self.chunk_size as u64) as usize;
            let mut buf = BytesMut::zeroed(len);
            file.read_exact(&mut buf)
                .await
                .map_err(|e| TorrentError::file_read(path, e))?;

            let chunk = Chunk {
                offset,
                data: buf.freeze(),
                permit,
            };
            if self.chunks.send(Ok(chunk)).await.is_err() {
                return Ok(ControlFlow::Break(()));
            }
            offset += len as u64;
        }

        tracing::trace!(reader = self.id, path = %path.display(), "file read");
        Ok(ControlFlow::Continue(()))
    }
}

/// Waits until the chunk at `offset` may be read.
///
/// Continues without a permit once `offset` is the released position, or
/// with one if a window permit frees up first. `Break` means the sequencer
/// is gone.
async fn admit(
    released: &mut watch::Receiver<u64>,
    permits: &Arc<Semaphore>,
    offset: u64,
) -> ControlFlow<(), Option<OwnedSemaphorePermit>> {
    let head = async { released.wait_for(|&released| released == offset).await.is_ok() };

    tokio::select! {
        biased;
        is_head = head => {
            if is_head {
                ControlFlow::Continue(None)
            } else {
                ControlFlow::Break(())
            }
        }
        permit = Arc::clone(permits).acquire_owned() => match permit {
            Ok(permit) => ControlFlow::Continue(Some(permit)),
            Err(_) => ControlFlow::Break(()),
        },
    }
}
