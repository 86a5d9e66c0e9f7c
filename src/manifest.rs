//! Canonical, order-stable file manifests.
//!
//! A crawler may discover files in any order and from several threads. The
//! manifest removes that nondeterminism: entries are kept in an explicit
//! sequence and sorted once, byte-wise by relative path, when the builder is
//! finalized. Every later stage (piece hashing, the `files` list, the info
//! hash) follows that order.
//!
//! # Examples
//!
//! ```
//! use torrent_forge::manifest::ManifestBuilder;
//!
//! # fn main() -> Result<(), torrent_forge::TorrentError> {
//! let mut builder = ManifestBuilder::new("/music");
//! builder.add_file("/music/b/02.flac", 20)?;
//! builder.add_file("/music/a/01.flac", 10)?;
//!
//! let manifest = builder.finalize()?;
//! assert_eq!(manifest.total_size(), 30);
//! assert_eq!(manifest.entries()[0].relative_path(), "a/01.flac");
//! assert_eq!(manifest.entries()[1].offset(), 10);
//! # Ok(())
//! # }
//! ```

mod builder;
mod collector;
mod entry;
mod walk;

pub use builder::ManifestBuilder;
pub use collector::ManifestCollector;
pub use entry::{FileManifest, ManifestEntry};
