use std::collections::BTreeMap;

use bytes::Bytes;
use tokio::sync::{mpsc, watch};

use super::reader::Chunk;
use crate::error::{Result, TorrentError};

/// Restores stream order between the reader pool and the digest stage.
///
/// Chunks are parked in a reorder buffer keyed by stream offset and released
/// only when they are the next bytes of the stream. After every release the
/// new stream position is published on `released` so the reader holding the
/// next chunk can proceed without a window permit. Parked chunks keep their
/// permits until released, which bounds the buffer to the window size.
pub(super) struct Sequencer {
    total_size: u64,
    next: u64,
    pending: BTreeMap<u64, Chunk>,
    released: watch::Sender<u64>,
    digest: mpsc::Sender<Bytes>,
}

impl Sequencer {
    pub(super) fn new(
        total_size: u64,
        released: watch::Sender<u64>,
        digest: mpsc::Sender<Bytes>,
    ) -> Self {
        Self {
            total_size,
            next: 0,
            pending: BTreeMap::new(),
            released,
            digest,
        }
    }

    /// Drives the stream to completion, then waits for every reader to hang up.
    ///
    /// Returns the first reader failure unchanged. On any error the digest
    /// channel is dropped with the sequencer, which ends the digest stage.
    pub(super) async fn run(mut self, mut chunks: mpsc::Receiver<Result<Chunk>>) -> Result<()> {
        while self.next < self.total_size {
            let chunk = match chunks.recv().await {
                Some(chunk) => chunk?,
                None => {
                    return Err(TorrentError::Worker(format!(
                        "readers stopped at offset {} of {}",
                        self.next, self.total_size
                    )))
                }
            };

            if chunk.offset < self.next || self.pending.contains_key(&chunk.offset) {
                return Err(TorrentError::Worker(format!(
                    "chunk at offset {} delivered twice",
                    chunk.offset
                )));
            }
            self.pending.insert(chunk.offset, chunk);
            self.release().await?;
        }

        tracing::trace!(released = self.next, "stream complete");

        // Readers may still be opening trailing zero-length files; their
        // failures count as much as any other.
        drop(self.digest);
        match chunks.recv().await {
            None => Ok(()),
            Some(Err(err)) => Err(err),
            Some(Ok(chunk)) => Err(TorrentError::Worker(format!(
                "chunk at offset {} past end of stream",
                chunk.offset
            ))),
        }
    }

    /// Number of chunks parked out of order.
    pub(super) fn buffered(&self) -> usize {
        self.pending.len()
    }

    async fn release(&mut self) -> Result<()> {
        let start = self.next;

        while let Some(entry) = self.pending.first_entry() {
            if *entry.key() != self.next {
                break;
            }
            let Chunk { data, permit, .. } = entry.remove();
            drop(permit);
            self.next += data.len() as u64;
            self.digest
                .send(data)
                .await
                .map_err(|_| TorrentError::Worker("digest stage stopped".into()))?;
        }

        if self.next != start {
            tracing::trace!(
                released = self.next,
                buffered = self.buffered(),
                "released chunks"
            );
            self.released.send_replace(self.next);
        }
        Ok(())
    }
}
