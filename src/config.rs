//! Torrent creation settings.

use crate::constants::{DEFAULT_CREATED_BY, DEFAULT_TRACKERS};
use crate::error::{Result, TorrentError};
use crate::manifest::FileManifest;
use crate::metainfo::MetainfoAssembler;
use crate::pieces::HasherOptions;

/// Settings for [`TorrentCreator`](crate::TorrentCreator).
///
/// The defaults produce a private torrent announced to a few public UDP
/// trackers, one tracker per tier, with the piece length chosen from the
/// content size.
///
/// # Examples
///
/// ```
/// use torrent_forge::{HasherOptions, TorrentConfig};
///
/// let config = TorrentConfig::default()
///     .name("music")
///     .comment("lossless rips")
///     .announce_list(vec![vec!["udp://tracker.example.com:1337/announce".into()]])
///     .hasher(HasherOptions::default().workers(4));
///
/// assert_eq!(config.announce_list.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct TorrentConfig {
    /// Torrent name. Defaults to the manifest root's final component.
    pub name: Option<String>,
    /// Tracker tiers.
    pub announce_list: Vec<Vec<String>>,
    pub comment: Option<String>,
    pub created_by: Option<String>,
    /// Unix timestamp. Defaults to the time of creation; fix it for
    /// byte-reproducible output.
    pub creation_date: Option<i64>,
    /// Piece length override in bytes; must be a power of two in range.
    pub piece_length: Option<u64>,
    pub hasher: HasherOptions,
}

impl Default for TorrentConfig {
    fn default() -> Self {
        Self {
            name: None,
            announce_list: DEFAULT_TRACKERS
                .iter()
                .map(|url| vec![url.to_string()])
                .collect(),
            comment: None,
            created_by: Some(DEFAULT_CREATED_BY.to_string()),
            creation_date: None,
            piece_length: None,
            hasher: HasherOptions::default(),
        }
    }
}

impl TorrentConfig {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn announce_list(mut self, tiers: Vec<Vec<String>>) -> Self {
        self.announce_list = tiers;
        self
    }

    /// Removes every tracker.
    pub fn no_trackers(mut self) -> Self {
        self.announce_list.clear();
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }

    pub fn creation_date(mut self, timestamp: i64) -> Self {
        self.creation_date = Some(timestamp);
        self
    }

    pub fn piece_length(mut self, length: u64) -> Self {
        self.piece_length = Some(length);
        self
    }

    pub fn hasher(mut self, options: HasherOptions) -> Self {
        self.hasher = options;
        self
    }

    /// Builds an assembler carrying this configuration for `manifest`.
    ///
    /// # Errors
    ///
    /// Returns [`TorrentError::InvalidField`] if no name is configured and the
    /// manifest root has no usable final component.
    pub(crate) fn assembler(&self, manifest: &FileManifest) -> Result<MetainfoAssembler> {
        let name = match &self.name {
            Some(name) => name.clone(),
            None => manifest
                .root()
                .file_name()
                .and_then(|name| name.to_str())
                .map(String::from)
                .ok_or(TorrentError::InvalidField("name"))?,
        };

        let mut assembler =
            MetainfoAssembler::new(name).announce_list(self.announce_list.clone());
        if let Some(comment) = &self.comment {
            assembler = assembler.comment(comment.as_str());
        }
        if let Some(created_by) = &self.created_by {
            assembler = assembler.created_by(created_by.as_str());
        }
        if let Some(date) = self.creation_date {
            assembler = assembler.creation_date(date);
        }
        assembler.validate()?;
        Ok(assembler)
    }
}
