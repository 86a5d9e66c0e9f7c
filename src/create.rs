//! End-to-end torrent creation.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::TorrentConfig;
use crate::error::Result;
use crate::manifest::FileManifest;
use crate::metainfo::{MagnetLink, Metainfo};
use crate::pieces::{select_piece_length, ContentSource, DiskSource, PieceHasher, PieceLength};

/// Result of [`TorrentCreator::create_file`].
#[derive(Debug, Clone)]
pub struct CreatedTorrent {
    pub metainfo: Metainfo,
    pub magnet: MagnetLink,
    /// Where the `.torrent` file was written.
    pub path: PathBuf,
}

/// Selects a piece length, hashes a manifest and assembles the torrent.
///
/// # Examples
///
/// ```no_run
/// use torrent_forge::{ManifestBuilder, TorrentConfig, TorrentCreator};
///
/// # async fn example() -> Result<(), torrent_forge::TorrentError> {
/// let mut builder = ManifestBuilder::new("/data/music");
/// builder.add_directory("/data/music")?;
/// let manifest = builder.finalize()?;
///
/// let creator = TorrentCreator::new(TorrentConfig::default().comment("lossless"));
/// let created = creator.create_file(&manifest, "music.torrent").await?;
/// println!("{}", created.magnet);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TorrentCreator<S = DiskSource> {
    config: TorrentConfig,
    hasher: PieceHasher<S>,
}

impl TorrentCreator<DiskSource> {
    pub fn new(config: TorrentConfig) -> Self {
        Self::with_source(DiskSource, config)
    }
}

impl<S: ContentSource> TorrentCreator<S> {
    /// Creates a creator that reads content through `source`.
    pub fn with_source(source: S, config: TorrentConfig) -> Self {
        let hasher = PieceHasher::with_source(source, config.hasher.clone());
        Self { config, hasher }
    }

    pub fn config(&self) -> &TorrentConfig {
        &self.config
    }

    /// Builds the torrent for `manifest` without writing anything.
    ///
    /// Metadata is validated before any content is read.
    ///
    /// # Errors
    ///
    /// - [`TorrentError::InvalidField`](crate::TorrentError::InvalidField) for
    ///   bad metadata.
    /// - [`TorrentError::PieceLength`](crate::TorrentError::PieceLength) for an
    ///   invalid piece length override.
    /// - Any error from [`PieceHasher::hash`].
    pub async fn create(&self, manifest: &FileManifest) -> Result<Metainfo> {
        let started = Instant::now();
        let assembler = self.config.assembler(manifest)?;
        let piece_length = match self.config.piece_length {
            Some(length) => PieceLength::new(length)?,
            None => select_piece_length(manifest.total_size()),
        };

        let pieces = self.hasher.hash(manifest, piece_length).await?;
        let metainfo = assembler.assemble(manifest, piece_length, pieces)?;

        tracing::info!(
            name = metainfo.name(),
            files = manifest.len(),
            total_size = manifest.total_size(),
            piece_length = piece_length.get(),
            pieces = metainfo.piece_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "torrent created"
        );
        Ok(metainfo)
    }

    /// Builds the torrent and writes it to `out`.
    ///
    /// On failure nothing is left at `out`.
    ///
    /// # Errors
    ///
    /// As [`create`](Self::create), plus
    /// [`TorrentError::Write`](crate::TorrentError::Write).
    pub async fn create_file(
        &self,
        manifest: &FileManifest,
        out: impl AsRef<Path>,
    ) -> Result<CreatedTorrent> {
        let out = out.as_ref();
        let metainfo = self.create(manifest).await?;
        metainfo.write_to(out).await?;

        Ok(CreatedTorrent {
            magnet: metainfo.magnet(),
            metainfo,
            path: out.to_path_buf(),
        })
    }
}
