//! Persisted list of playable items
//!
//! One ordered list of `{name, url}` records under a single storage key.
//! Entries whose url is not a recognized locator are dropped on load, so a
//! corrupted or hand-edited store degrades to the valid subset instead of
//! failing.

use serde::{Deserialize, Serialize};

use crate::config::APP_NAME;
use crate::error::ConfigError;
use crate::locator::SourceLocator;

const STORE_NAME: &str = "playlist";
const DEFAULT_ENTRY_NAME: &str = "Torrent";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Playlist {
    pub entries: Vec<PlaylistEntry>,
}

impl Playlist {
    /// Load the persisted list, keeping only recognized locators.
    pub fn load() -> Self {
        let stored: Self = confy::load(APP_NAME, STORE_NAME).unwrap_or_default();
        stored.sanitized()
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, STORE_NAME, self).map_err(ConfigError::Save)
    }

    /// Drop unrecognized urls; blank names get the default label.
    pub fn sanitized(self) -> Self {
        let before = self.entries.len();
        let entries: Vec<PlaylistEntry> = self
            .entries
            .into_iter()
            .filter(|e| SourceLocator::classify(&e.url).is_some())
            .map(|e| PlaylistEntry {
                name: if e.name.trim().is_empty() {
                    DEFAULT_ENTRY_NAME.to_string()
                } else {
                    e.name
                },
                url: e.url,
            })
            .collect();
        if entries.len() < before {
            tracing::debug!(
                dropped = before - entries.len(),
                "ignored playlist entries with unrecognized urls"
            );
        }
        Self { entries }
    }

    /// Prepend an entry. Returns false (and leaves the list untouched) when
    /// the url is not a recognized locator.
    pub fn add(&mut self, name: &str, url: &str) -> bool {
        if SourceLocator::classify(url).is_none() {
            return false;
        }
        let name = name.trim();
        self.entries.insert(
            0,
            PlaylistEntry {
                name: if name.is_empty() {
                    DEFAULT_ENTRY_NAME.to_string()
                } else {
                    name.to_string()
                },
                url: url.trim().to_string(),
            },
        );
        true
    }

    /// Remove every entry with the given url. Returns how many were dropped.
    pub fn remove(&mut self, url: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.url != url);
        before - self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
