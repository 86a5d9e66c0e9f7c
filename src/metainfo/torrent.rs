use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::io::AsyncWriteExt;

use super::info_hash::InfoHash;
use super::magnet::MagnetLink;
use crate::bencode::{encode, DictBuilder, Value};
use crate::error::{Result, TorrentError};
use crate::pieces::{PieceHashList, PieceLength};

/// A file within a torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    /// Path segments relative to the torrent root.
    pub path: Vec<String>,
    /// Size of the file in bytes.
    pub length: u64,
}

/// An assembled torrent.
///
/// Produced by [`MetainfoAssembler`](super::MetainfoAssembler) and never
/// modified afterwards. The info hash is computed once at assembly from the
/// canonical encoding of the info dictionary (`files`, `name`,
/// `piece length`, `pieces`, `private`); the remaining metadata does not
/// contribute to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metainfo {
    name: String,
    piece_length: PieceLength,
    pieces: PieceHashList,
    files: Vec<File>,
    total_size: u64,
    private: bool,
    comment: Option<String>,
    created_by: Option<String>,
    creation_date: i64,
    announce_list: Vec<Vec<String>>,
    info_hash: InfoHash,
}

/// Caller-supplied metadata outside the info dictionary.
pub(super) struct Extras {
    pub(super) comment: Option<String>,
    pub(super) created_by: Option<String>,
    pub(super) creation_date: i64,
    pub(super) announce_list: Vec<Vec<String>>,
}

impl Metainfo {
    pub(super) fn new(
        name: String,
        piece_length: PieceLength,
        pieces: PieceHashList,
        files: Vec<File>,
        private: bool,
        extras: Extras,
    ) -> Self {
        let total_size = files.iter().map(|f| f.length).sum();
        let mut metainfo = Self {
            name,
            piece_length,
            pieces,
            files,
            total_size,
            private,
            comment: extras.comment,
            created_by: extras.created_by,
            creation_date: extras.creation_date,
            announce_list: extras.announce_list,
            info_hash: InfoHash::from_bytes([0; 20]),
        };
        metainfo.info_hash = InfoHash::from_info_bytes(&metainfo.info_bytes());
        metainfo
    }

    /// Torrent name; the root directory name clients download into.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn piece_length(&self) -> PieceLength {
        self.piece_length
    }

    pub fn pieces(&self) -> &PieceHashList {
        &self.pieces
    }

    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    /// Files in manifest order.
    pub fn files(&self) -> &[File] {
        &self.files
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    /// Unix timestamp of creation.
    pub fn creation_date(&self) -> i64 {
        self.creation_date
    }

    /// Tracker tiers ([BEP-12](http://bittorrent.org/beps/bep_0012.html)).
    pub fn announce_list(&self) -> &[Vec<String>] {
        &self.announce_list
    }

    /// Every tracker URL, tier by tier.
    pub fn trackers(&self) -> impl Iterator<Item = &str> {
        self.announce_list.iter().flatten().map(String::as_str)
    }

    pub fn info_hash(&self) -> InfoHash {
        self.info_hash
    }

    /// The info dictionary.
    pub fn info_value(&self) -> Value {
        let files = self
            .files
            .iter()
            .map(|file| {
                DictBuilder::new()
                    .with("length", Value::size(file.length))
                    .with(
                        "path",
                        Value::List(file.path.iter().map(Value::string).collect()),
                    )
                    .build()
            })
            .collect::<Vec<_>>();

        DictBuilder::new()
            .with("files", Value::List(files))
            .with("name", self.name.as_str())
            .with("piece length", Value::size(self.piece_length.get()))
            .with("pieces", self.pieces.concatenated())
            .with_opt("private", self.private.then_some(1i64))
            .build()
    }

    /// Canonical encoding of the info dictionary; the info hash input.
    pub fn info_bytes(&self) -> Bytes {
        encode(&self.info_value())
    }

    /// The complete metainfo dictionary.
    ///
    /// `announce` carries the first tracker for clients that predate
    /// `announce-list`.
    pub fn to_value(&self) -> Value {
        let announce_list = (!self.announce_list.is_empty()).then(|| {
            Value::List(
                self.announce_list
                    .iter()
                    .map(|tier| Value::List(tier.iter().map(Value::string).collect()))
                    .collect(),
            )
        });

        DictBuilder::new()
            .with_opt("announce", self.trackers().next())
            .with_opt("announce-list", announce_list)
            .with_opt("comment", self.comment.as_deref())
            .with_opt("created by", self.created_by.as_deref())
            .with("creation date", self.creation_date)
            .with("info", self.info_value())
            .build()
    }

    /// The `.torrent` file contents. Equal metainfo always encodes to equal bytes.
    pub fn to_bytes(&self) -> Bytes {
        encode(&self.to_value())
    }

    pub fn magnet(&self) -> MagnetLink {
        MagnetLink::from_metainfo(self)
    }

    /// Shorthand for `self.magnet().to_uri()`.
    pub fn magnet_uri(&self) -> String {
        self.magnet().to_uri()
    }

    /// Writes the `.torrent` file to `path`.
    ///
    /// The bytes go to a sibling `.part` file first, which is renamed over
    /// `path` once complete and removed on failure, so `path` never holds a
    /// partial torrent. On Unix the file is created with mode `0600`.
    pub async fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let partial = partial_path(path);
        let bytes = self.to_bytes();

        let result = match write_private(&partial, &bytes).await {
            Ok(()) => tokio::fs::rename(&partial, path).await,
            Err(err) => Err(err),
        };

        if let Err(source) = result {
            if let Err(err) = tokio::fs::remove_file(&partial).await {
                tracing::trace!(path = %partial.display(), error = %err, "no partial file to remove");
            }
            return Err(TorrentError::Write {
                path: path.to_path_buf(),
                source,
            });
        }

        tracing::debug!(
            path = %path.display(),
            bytes = bytes.len(),
            info_hash = %self.info_hash,
            "torrent written"
        );
        Ok(())
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("torrent"));
    name.push(".part");
    path.with_file_name(name)
}

async fn write_private(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}
