use std::time::{SystemTime, UNIX_EPOCH};

use super::torrent::{Extras, File, Metainfo};
use crate::constants::DEFAULT_CREATED_BY;
use crate::error::{Result, TorrentError};
use crate::manifest::FileManifest;
use crate::pieces::{PieceHashList, PieceLength};

/// Combines a manifest, its piece hashes and metadata into a [`Metainfo`].
///
/// Torrents built here are always private: clients may only find peers
/// through the listed trackers.
///
/// # Examples
///
/// ```no_run
/// use torrent_forge::manifest::ManifestBuilder;
/// use torrent_forge::metainfo::MetainfoAssembler;
/// use torrent_forge::pieces::{select_piece_length, PieceHasher};
///
/// # async fn example() -> Result<(), torrent_forge::TorrentError> {
/// let mut builder = ManifestBuilder::new("/music");
/// builder.add_directory("/music")?;
/// let manifest = builder.finalize()?;
///
/// let piece_length = select_piece_length(manifest.total_size());
/// let pieces = PieceHasher::default().hash(&manifest, piece_length).await?;
///
/// let metainfo = MetainfoAssembler::new("music")
///     .comment("lossless rips")
///     .add_tracker_tier(vec!["udp://tracker.example.com:1337/announce".into()])
///     .assemble(&manifest, piece_length, pieces)?;
///
/// metainfo.write_to("music.torrent").await?;
/// println!("{}", metainfo.magnet_uri());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MetainfoAssembler {
    name: String,
    comment: Option<String>,
    created_by: Option<String>,
    creation_date: Option<i64>,
    announce_list: Vec<Vec<String>>,
}

impl MetainfoAssembler {
    /// Creates an assembler for a torrent called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: None,
            created_by: Some(DEFAULT_CREATED_BY.to_string()),
            creation_date: None,
            announce_list: Vec::new(),
        }
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }

    /// Sets the creation date (Unix timestamp). Defaults to the time of assembly.
    pub fn creation_date(mut self, timestamp: i64) -> Self {
        self.creation_date = Some(timestamp);
        self
    }

    /// Appends one tier of trackers.
    pub fn add_tracker_tier(mut self, urls: Vec<String>) -> Self {
        self.announce_list.push(urls);
        self
    }

    /// Replaces all tracker tiers.
    pub fn announce_list(mut self, tiers: Vec<Vec<String>>) -> Self {
        self.announce_list = tiers;
        self
    }

    /// Checks the metadata without touching any content.
    ///
    /// # Errors
    ///
    /// Returns [`TorrentError::InvalidField`] for an empty name, a name that
    /// is a path or relative segment, or an empty tracker URL.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(TorrentError::InvalidField("name"));
        }
        if self.name == "." || self.name == ".." || self.name.contains(['/', '\\']) {
            return Err(TorrentError::InvalidField("name"));
        }
        if self.announce_list.iter().flatten().any(|url| url.trim().is_empty()) {
            return Err(TorrentError::InvalidField("announce url"));
        }
        Ok(())
    }

    /// Builds the immutable [`Metainfo`].
    ///
    /// # Errors
    ///
    /// - [`TorrentError::InvalidField`] as for [`validate`](Self::validate).
    /// - [`TorrentError::InconsistentPieceCount`] if `pieces` does not hold
    ///   exactly `ceil(total_size / piece_length)` hashes. This only happens
    ///   when the hash list was computed for different content and should be
    ///   treated as a bug.
    pub fn assemble(
        self,
        manifest: &FileManifest,
        piece_length: PieceLength,
        pieces: PieceHashList,
    ) -> Result<Metainfo> {
        self.validate()?;

        let expected = piece_length.piece_count(manifest.total_size());
        if pieces.len() != expected {
            return Err(TorrentError::InconsistentPieceCount {
                expected,
                actual: pieces.len(),
            });
        }

        let files = manifest
            .entries()
            .iter()
            .map(|entry| File {
                path: entry.segments().map(String::from).collect(),
                length: entry.size(),
            })
            .collect();

        let announce_list = self
            .announce_list
            .into_iter()
            .filter(|tier| !tier.is_empty())
            .collect();

        let extras = Extras {
            comment: self.comment,
            created_by: self.created_by,
            creation_date: self.creation_date.unwrap_or_else(unix_now),
            announce_list,
        };

        let metainfo = Metainfo::new(self.name, piece_length, pieces, files, true, extras);
        tracing::debug!(
            name = metainfo.name(),
            info_hash = %metainfo.info_hash(),
            pieces = metainfo.piece_count(),
            "metainfo assembled"
        );
        Ok(metainfo)
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
