use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building a torrent.
///
/// Every variant aborts the whole build; nothing is retried internally and no
/// partial artifact is left behind.
#[derive(Debug, Error)]
pub enum TorrentError {
    /// A file is outside the torrent root or its path cannot be represented.
    #[error("invalid path {}: {reason}", path.display())]
    InvalidPath {
        path: PathBuf,
        reason: &'static str,
    },

    /// No files were added before the manifest was finalized.
    #[error("manifest contains no files")]
    EmptyManifest,

    /// Reading file content failed while hashing pieces.
    #[error("failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The number of piece hashes does not match the content size.
    ///
    /// This indicates a bug in the pipeline, never a transient condition.
    #[error("inconsistent piece count: expected {expected}, got {actual}")]
    InconsistentPieceCount { expected: usize, actual: usize },

    /// The piece length is zero, not a power of two, or out of bounds.
    #[error("invalid piece length: {0}")]
    PieceLength(u64),

    /// A metadata field has an invalid value.
    #[error("invalid field: {0}")]
    InvalidField(&'static str),

    /// Writing the torrent file failed.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A pipeline task panicked or was cancelled unexpectedly.
    #[error("hashing worker failed: {0}")]
    Worker(String),
}

impl TorrentError {
    pub(crate) fn invalid_path(path: impl Into<PathBuf>, reason: &'static str) -> Self {
        TorrentError::InvalidPath {
            path: path.into(),
            reason,
        }
    }

    pub(crate) fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TorrentError::FileRead {
            path: path.into(),
            source,
        }
    }
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, TorrentError>;
