//! Torrent metainfo assembly and magnet links ([BEP-3], [BEP-9], [BEP-12]).
//!
//! [`MetainfoAssembler`] turns a finalized manifest and its piece hashes into
//! an immutable [`Metainfo`], which can be encoded to `.torrent` bytes,
//! written to disk, or reduced to a [`MagnetLink`].
//!
//! # Torrent Structure
//!
//! - **info** - Core torrent metadata (hashed to create the info hash)
//!   - `files` - One `{length, path}` dictionary per file, in manifest order
//!   - `name` - Root directory name
//!   - `piece length` - Size of each piece in bytes
//!   - `pieces` - Concatenated SHA1 hashes of each piece
//!   - `private` - Always `1`
//! - **announce** - First tracker URL
//! - **announce-list** - Tracker tiers
//! - **comment** - Optional comment
//! - **created by** - Program that created the torrent
//! - **creation date** - Unix timestamp
//!
//! All dictionaries are encoded with sorted keys, so equal metainfo always
//! produces equal bytes and the same info hash.
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html
//! [BEP-9]: http://bittorrent.org/beps/bep_0009.html
//! [BEP-12]: http://bittorrent.org/beps/bep_0012.html

mod assembler;
mod info_hash;
mod magnet;
mod torrent;

pub use assembler::MetainfoAssembler;
pub use info_hash::InfoHash;
pub use magnet::MagnetLink;
pub use torrent::{File, Metainfo};
