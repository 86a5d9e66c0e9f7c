use std::ops::Index;

use bytes::Bytes;
use sha1::{Digest, Sha1};
use tokio::sync::mpsc;

use super::length::PieceLength;
use crate::constants::PIECE_HASH_LEN;

/// Ordered SHA1 digests, one per piece.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PieceHashList(Vec<[u8; PIECE_HASH_LEN]>);

impl PieceHashList {
    pub fn new(hashes: Vec<[u8; PIECE_HASH_LEN]>) -> Self {
        Self(hashes)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&[u8; PIECE_HASH_LEN]> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, [u8; PIECE_HASH_LEN]> {
        self.0.iter()
    }

    /// All digests back to back, as stored under the `pieces` key.
    pub fn concatenated(&self) -> Bytes {
        Bytes::from(self.0.concat())
    }
}

impl Index<usize> for PieceHashList {
    type Output = [u8; PIECE_HASH_LEN];

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a PieceHashList {
    type Item = &'a [u8; PIECE_HASH_LEN];
    type IntoIter = std::slice::Iter<'a, [u8; PIECE_HASH_LEN]>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Cuts an ordered byte stream into pieces and hashes each one.
///
/// Input may arrive in arbitrarily sized slices; piece boundaries depend only
/// on the cumulative byte count.
#[derive(Debug)]
pub struct PieceDigester {
    piece_length: usize,
    hasher: Sha1,
    filled: usize,
    hashes: Vec<[u8; PIECE_HASH_LEN]>,
}

impl PieceDigester {
    pub fn new(piece_length: PieceLength) -> Self {
        Self {
            piece_length: piece_length.get() as usize,
            hasher: Sha1::new(),
            filled: 0,
            hashes: Vec::new(),
        }
    }

    /// Feeds the next bytes of the stream.
    pub fn update(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let take = (self.piece_length - self.filled).min(data.len());
            self.hasher.update(&data[..take]);
            self.filled += take;
            data = &data[take..];

            if self.filled == self.piece_length {
                self.hashes.push(self.hasher.finalize_reset().into());
                self.filled = 0;
            }
        }
    }

    /// Number of complete pieces hashed so far.
    pub fn completed(&self) -> usize {
        self.hashes.len()
    }

    /// Hashes the trailing partial piece, if any, and returns all digests.
    pub fn finish(mut self) -> PieceHashList {
        if self.filled > 0 {
            self.hashes.push(self.hasher.finalize().into());
        }
        PieceHashList(self.hashes)
    }
}

/// Digest stage of the pipeline; runs on a blocking thread.
///
/// Consumes chunks already in stream order until the sender is dropped. The
/// caller decides whether the result is complete; on failure it is discarded.
pub(super) fn digest_stream(
    mut chunks: mpsc::Receiver<Bytes>,
    piece_length: PieceLength,
) -> PieceHashList {
    let mut digester = PieceDigester::new(piece_length);
    while let Some(chunk) = chunks.blocking_recv() {
        digester.update(&chunk);
    }
    digester.finish()
}
