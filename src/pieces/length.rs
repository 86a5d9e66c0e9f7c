use std::fmt;

use crate::constants::{MAX_PIECE_LENGTH, MIN_PIECE_LENGTH, TARGET_PIECE_COUNT};
use crate::error::{Result, TorrentError};

/// Number of bytes per piece: a power of two between 16 KiB and 16 MiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PieceLength(u64);

impl PieceLength {
    /// The smallest allowed piece length (16 KiB).
    pub const MIN: PieceLength = PieceLength(MIN_PIECE_LENGTH);
    /// The largest allowed piece length (16 MiB).
    pub const MAX: PieceLength = PieceLength(MAX_PIECE_LENGTH);

    /// Validates an explicitly chosen piece length.
    ///
    /// # Errors
    ///
    /// Returns [`TorrentError::PieceLength`] if `length` is not a power of two
    /// or lies outside `[MIN, MAX]`.
    pub fn new(length: u64) -> Result<Self> {
        if !length.is_power_of_two() || !(MIN_PIECE_LENGTH..=MAX_PIECE_LENGTH).contains(&length) {
            return Err(TorrentError::PieceLength(length));
        }
        Ok(PieceLength(length))
    }

    /// Picks a piece length for `total_size` bytes of content.
    ///
    /// Doubles from 16 KiB until the piece count drops to 1000 or the
    /// 16 MiB ceiling is reached. Zero bytes yields the minimum.
    pub fn for_total_size(total_size: u64) -> Self {
        if total_size == 0 {
            return Self::MIN;
        }

        let mut length = MIN_PIECE_LENGTH;
        while total_size / length > TARGET_PIECE_COUNT && length < MAX_PIECE_LENGTH {
            length *= 2;
        }
        PieceLength(length)
    }

    /// Bypasses the bounds so tests can use tiny pieces.
    #[cfg(test)]
    pub(crate) fn new_unchecked(length: u64) -> Self {
        PieceLength(length)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Number of pieces covering `total_size` bytes, i.e. `ceil(total / length)`.
    pub fn piece_count(self, total_size: u64) -> usize {
        total_size.div_ceil(self.0) as usize
    }

    /// Length of piece `index` when the content is `total_size` bytes long.
    ///
    /// Every piece is full except possibly the last one.
    pub fn piece_size(self, index: usize, total_size: u64) -> u64 {
        let start = index as u64 * self.0;
        total_size.saturating_sub(start).min(self.0)
    }
}

impl fmt::Display for PieceLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Selects the piece length for `total_size` bytes of content.
///
/// ```
/// use torrent_forge::pieces::select_piece_length;
///
/// assert_eq!(select_piece_length(0).get(), 16 * 1024);
/// assert_eq!(select_piece_length(1 << 30).get(), 2 * 1024 * 1024);
/// ```
pub fn select_piece_length(total_size: u64) -> PieceLength {
    PieceLength::for_total_size(total_size)
}
