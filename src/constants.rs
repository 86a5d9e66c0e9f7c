//! Tuning parameters and protocol constants.
//!
//! Piece length bounds follow common client practice: pieces below 16 KiB
//! inflate the metainfo for no gain, pieces above 16 MiB are rejected by a
//! number of clients.

// ============================================================================
// Client identification
// ============================================================================

/// Value written to the `created by` key unless the caller overrides it.
pub const DEFAULT_CREATED_BY: &str = concat!("torrent-forge/", env!("CARGO_PKG_VERSION"));

/// Public trackers announced to when no tiers are configured, one per tier.
pub const DEFAULT_TRACKERS: [&str; 3] = [
    "udp://open.stealth.si:80/announce",
    "udp://tracker.opentrackr.org:1337/announce",
    "udp://tracker.openbittorrent.com:6969/announce",
];

// ============================================================================
// Piece sizing
// ============================================================================

/// Smallest piece length the selector will produce (16 KiB).
pub const MIN_PIECE_LENGTH: u64 = 16 * 1024;

/// Largest piece length the selector will produce (16 MiB).
pub const MAX_PIECE_LENGTH: u64 = 16 * 1024 * 1024;

/// Piece count above which the selector doubles the piece length.
pub const TARGET_PIECE_COUNT: u64 = 1000;

/// Length of a SHA1 piece digest.
pub const PIECE_HASH_LEN: usize = 20;

// ============================================================================
// Hashing pipeline
// ============================================================================

/// Bytes read from disk per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Chunks that may sit ahead of the released offset before readers pause.
pub const DEFAULT_REORDER_WINDOW: usize = 64;

/// Ordered chunks queued for the digest stage.
pub const DIGEST_QUEUE_DEPTH: usize = 16;

// ============================================================================
// Directory walking
// ============================================================================

/// Directories nested deeper than this below the walk root are skipped.
pub const MAX_WALK_DEPTH: usize = 32;
