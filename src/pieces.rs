//! Piece length selection and ordered piece hashing ([BEP-3]).
//!
//! A v1 torrent treats all of its files as one virtual stream: the bytes of
//! every file in manifest order, with no padding in between. That stream is
//! cut into pieces of a fixed length and each piece is identified by its
//! SHA1 digest. Any reordering of bytes changes the digests, and with them
//! the info hash, so byte order is the one property this module never trades
//! for speed.
//!
//! # Pipeline
//!
//! ```text
//!  reader 0 ─┐                        ┌──────────┐
//!  reader 1 ─┼─ (offset, bytes) ──▶   │sequencer │── ordered bytes ──▶ digest (SHA1)
//!  reader N ─┘   any order            └────┬─────┘
//!       ▲                                  │ released offset (watch)
//!       └──────────── backpressure ────────┘
//! ```
//!
//! - Readers ([`ContentSource`]) read disjoint files, whole files at a time,
//!   claimed in manifest order.
//! - The sequencer parks out-of-order chunks and releases them strictly by
//!   stream offset. Every chunk read ahead of the released offset holds one
//!   of a fixed number of permits, which bounds memory.
//! - The digest stage runs on a blocking thread and hashes piece by piece.
//!
//! Any failure cancels the whole pipeline; see [`PieceHasher::hash`].
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html

mod digest;
mod hasher;
mod length;
mod reader;
mod sequencer;
mod source;

pub use digest::{PieceDigester, PieceHashList};
pub use hasher::{HasherOptions, PieceHasher};
pub use length::{select_piece_length, PieceLength};
pub use source::{ContentSource, DiskSource};

#[cfg(test)]
mod tests;
