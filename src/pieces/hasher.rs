use std::num::NonZeroUsize;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, watch, Semaphore};
use tokio::task::JoinSet;

use super::digest::{digest_stream, PieceHashList};
use super::length::PieceLength;
use super::reader::Reader;
use super::sequencer::Sequencer;
use super::source::{ContentSource, DiskSource};
use crate::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_REORDER_WINDOW, DIGEST_QUEUE_DEPTH};
use crate::error::{Result, TorrentError};
use crate::manifest::FileManifest;

/// Tuning for [`PieceHasher`]. None of these affect the resulting hashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HasherOptions {
    /// Number of concurrent reader tasks.
    pub workers: usize,
    /// Bytes per read.
    pub chunk_size: usize,
    /// Chunks readers may hold ahead of the hashed position.
    pub window: usize,
}

impl Default for HasherOptions {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(4),
            chunk_size: DEFAULT_CHUNK_SIZE,
            window: DEFAULT_REORDER_WINDOW,
        }
    }
}

impl HasherOptions {
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }
}

/// Computes the ordered piece hashes of a manifest.
///
/// Files are read concurrently by a pool of reader tasks, put back into
/// manifest order by a sequencer, and hashed by a single digest stage, so
/// the output depends only on file contents and never on scheduling.
///
/// # Examples
///
/// ```no_run
/// use torrent_forge::manifest::ManifestBuilder;
/// use torrent_forge::pieces::{select_piece_length, HasherOptions, PieceHasher};
///
/// # async fn example() -> Result<(), torrent_forge::TorrentError> {
/// let mut builder = ManifestBuilder::new("/music");
/// builder.add_directory("/music")?;
/// let manifest = builder.finalize()?;
///
/// let piece_length = select_piece_length(manifest.total_size());
/// let hasher = PieceHasher::new(HasherOptions::default().workers(8));
/// let pieces = hasher.hash(&manifest, piece_length).await?;
/// println!("{} pieces", pieces.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PieceHasher<S = DiskSource> {
    source: Arc<S>,
    options: HasherOptions,
}

impl PieceHasher<DiskSource> {
    /// Creates a hasher reading from the local filesystem.
    pub fn new(options: HasherOptions) -> Self {
        Self::with_source(DiskSource, options)
    }
}

impl Default for PieceHasher<DiskSource> {
    fn default() -> Self {
        Self::new(HasherOptions::default())
    }
}

impl<S: ContentSource> PieceHasher<S> {
    /// Creates a hasher that opens files through `source`.
    pub fn with_source(source: S, options: HasherOptions) -> Self {
        Self {
            source: Arc::new(source),
            options,
        }
    }

    pub fn options(&self) -> &HasherOptions {
        &self.options
    }

    /// Hashes the concatenated content of `manifest` in `piece_length` pieces.
    ///
    /// All or nothing: the first read failure stops every reader, closes
    /// their files and is returned; no partial hash list is ever produced.
    /// Dropping the returned future (for example on a timeout) aborts the
    /// reader tasks as well.
    ///
    /// # Errors
    ///
    /// - [`TorrentError::FileRead`] if a file cannot be opened or is shorter
    ///   than its manifest size.
    /// - [`TorrentError::Worker`] if a pipeline task dies.
    /// - [`TorrentError::InconsistentPieceCount`] if the digest count does not
    ///   match the content size.
    pub async fn hash(
        &self,
        manifest: &FileManifest,
        piece_length: PieceLength,
    ) -> Result<PieceHashList> {
        let started = Instant::now();
        let total_size = manifest.total_size();
        let chunk_size = self.options.chunk_size.max(1);
        let window = self.options.window.clamp(1, Semaphore::MAX_PERMITS);
        let workers = self.options.workers.clamp(1, manifest.len().max(1));

        tracing::debug!(
            files = manifest.len(),
            total_size,
            piece_length = piece_length.get(),
            workers,
            "hashing pieces"
        );

        let (chunk_tx, chunk_rx) = mpsc::channel(window);
        let (released_tx, released_rx) = watch::channel(0u64);
        let (digest_tx, digest_rx) = mpsc::channel(DIGEST_QUEUE_DEPTH);

        let cursor = Arc::new(AtomicUsize::new(0));
        let permits = Arc::new(Semaphore::new(window));
        let mut readers = JoinSet::new();
        for id in 0..workers {
            let reader = Reader {
                id,
                manifest: manifest.clone(),
                source: Arc::clone(&self.source),
                cursor: Arc::clone(&cursor),
                chunk_size,
                permits: Arc::clone(&permits),
                chunks: chunk_tx.clone(),
                released: released_rx.clone(),
            };
            readers.spawn(reader.run());
        }
        drop(chunk_tx);
        drop(released_rx);

        let digest = tokio::task::spawn_blocking(move || digest_stream(digest_rx, piece_length));

        let sequenced = Sequencer::new(total_size, released_tx, digest_tx)
            .run(chunk_rx)
            .await;
        if let Err(err) = sequenced {
            // Abort and join so every open file is closed before returning.
            readers.shutdown().await;
            tracing::debug!(error = %err, "piece hashing aborted");
            return Err(err);
        }

        while let Some(joined) = readers.join_next().await {
            joined.map_err(|e| TorrentError::Worker(e.to_string()))?;
        }
        let pieces = digest
            .await
            .map_err(|e| TorrentError::Worker(e.to_string()))?;

        let expected = piece_length.piece_count(total_size);
        if pieces.len() != expected {
            return Err(TorrentError::InconsistentPieceCount {
                expected,
                actual: pieces.len(),
            });
        }

        tracing::debug!(
            pieces = pieces.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pieces hashed"
        );
        Ok(pieces)
    }
}
