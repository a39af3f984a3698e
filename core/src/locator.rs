//! Source locator classification and the widget mount contract.
//!
//! A locator names playable content: either a magnet identifier or an
//! HTTP(S) URL pointing at a `.torrent` resource. Everything else is
//! unrecognized — callers skip mounting but may still reserve geometry.

use serde::{Deserialize, Serialize};

const MAGNET_PREFIX: &str = "magnet:?";
const TORRENT_SUFFIX: &str = ".torrent";

/// A recognized playable-content locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocator {
    Magnet(String),
    TorrentUrl(String),
}

impl SourceLocator {
    /// Classify a raw string. Leading/trailing whitespace is ignored.
    pub fn classify(raw: &str) -> Option<Self> {
        let s = raw.trim();
        if s.starts_with(MAGNET_PREFIX) {
            return Some(Self::Magnet(s.to_string()));
        }
        if has_http_scheme(s) && has_torrent_segment(s) {
            return Some(Self::TorrentUrl(s.to_string()));
        }
        None
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Magnet(s) | Self::TorrentUrl(s) => s,
        }
    }
}

fn has_http_scheme(s: &str) -> bool {
    let lower = s.get(..8).map(str::to_ascii_lowercase).unwrap_or_default();
    lower.starts_with("https://") || lower.starts_with("http://")
}

/// `.torrent` followed by `?`, `#`, or end of string, case-insensitive.
fn has_torrent_segment(s: &str) -> bool {
    let lower = s.to_ascii_lowercase();
    let mut from = 0;
    while let Some(i) = lower[from..].find(TORRENT_SUFFIX) {
        let end = from + i + TORRENT_SUFFIX.len();
        match lower.as_bytes().get(end) {
            None | Some(b'?') | Some(b'#') => return true,
            _ => from = from + i + 1,
        }
    }
    false
}

/// Registration entry handed to the playback widget's process-wide queue.
///
/// Exactly one of `magnet` / `torrent_url` is set, chosen by locator
/// syntax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountRequest {
    pub id: String,
    pub width: String,
    pub height: String,
    pub controls: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magnet: Option<String>,
    #[serde(rename = "torrentUrl", skip_serializing_if = "Option::is_none")]
    pub torrent_url: Option<String>,
}

impl MountRequest {
    pub fn new(mount_id: &str, source: &SourceLocator) -> Self {
        let mut request = Self {
            id: mount_id.to_string(),
            width: "100%".to_string(),
            height: "100%".to_string(),
            controls: true,
            magnet: None,
            torrent_url: None,
        };
        match source {
            SourceLocator::Magnet(s) => request.magnet = Some(s.clone()),
            SourceLocator::TorrentUrl(s) => request.torrent_url = Some(s.clone()),
        }
        request
    }
}
