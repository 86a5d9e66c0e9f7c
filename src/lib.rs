//! torrent-forge - Deterministic BitTorrent v1 torrent creation
//!
//! Builds private, multi-file `.torrent` files and magnet links from a set of
//! files on disk. File contents are read concurrently, but piece hashes and
//! the info hash depend only on the files themselves: the same content always
//! produces the same torrent.
//!
//! # Modules
//!
//! - [`manifest`] - Canonical, offset-annotated file lists
//! - [`pieces`] - Piece length selection and ordered concurrent SHA1 hashing
//! - [`metainfo`] - BEP-3/12 metainfo assembly, `.torrent` output, magnet links
//! - [`bencode`] - BEP-3 canonical bencode encoding
//! - [`create`] - End-to-end creation from a [`TorrentConfig`]
//!
//! # Examples
//!
//! ```no_run
//! use torrent_forge::{ManifestBuilder, TorrentConfig, TorrentCreator};
//!
//! # async fn example() -> torrent_forge::Result<()> {
//! let mut builder = ManifestBuilder::new("/data/music");
//! builder.add_directory("/data/music")?;
//! let manifest = builder.finalize()?;
//!
//! let config = TorrentConfig::default().comment("lossless rips");
//! let created = TorrentCreator::new(config)
//!     .create_file(&manifest, "music.torrent")
//!     .await?;
//! println!("{}", created.magnet);
//! # Ok(())
//! # }
//! ```

pub mod bencode;
pub mod config;
pub mod constants;
pub mod create;
pub mod error;
pub mod manifest;
pub mod metainfo;
pub mod pieces;

pub use config::TorrentConfig;
pub use create::{CreatedTorrent, TorrentCreator};
pub use error::{Result, TorrentError};
pub use manifest::{FileManifest, ManifestBuilder, ManifestCollector, ManifestEntry};
pub use metainfo::{InfoHash, MagnetLink, Metainfo, MetainfoAssembler};
pub use pieces::{
    select_piece_length, ContentSource, DiskSource, HasherOptions, PieceHashList, PieceHasher,
    PieceLength,
};
