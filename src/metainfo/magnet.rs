use std::fmt::{self, Write};

use super::info_hash::InfoHash;
use super::torrent::Metainfo;

/// A magnet link for an assembled torrent.
///
/// Only the info hash identifies the content; the display name and trackers
/// are hints. Since the info hash ignores comment, creation date and tracker
/// list, torrents differing only in those share the same `xt` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagnetLink {
    pub info_hash: InfoHash,
    pub display_name: Option<String>,
    pub trackers: Vec<String>,
}

impl MagnetLink {
    /// Derives the link from `metainfo`: its info hash, its name, and every
    /// tracker of every tier in order.
    pub fn from_metainfo(metainfo: &Metainfo) -> Self {
        Self {
            info_hash: metainfo.info_hash(),
            display_name: Some(metainfo.name().to_string()),
            trackers: metainfo.trackers().map(String::from).collect(),
        }
    }

    /// Formats `magnet:?xt=urn:btih:<hex>&dn=<name>&tr=<url>...`.
    pub fn to_uri(&self) -> String {
        let mut uri = format!("magnet:?xt=urn:btih:{}", self.info_hash.to_hex());

        if let Some(ref name) = self.display_name {
            uri.push_str("&dn=");
            uri.push_str(&url_encode(name));
        }

        for tracker in &self.trackers {
            uri.push_str("&tr=");
            uri.push_str(&url_encode(tracker));
        }

        uri
    }
}

impl fmt::Display for MagnetLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}

/// Percent-encodes everything outside the RFC 3986 unreserved set.
fn url_encode(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for &byte in s.as_bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    encoded
}
