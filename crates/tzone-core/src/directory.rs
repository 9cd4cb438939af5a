//! Zone directory
//!
//! Static mapping from upstream zone identifiers to display metadata. Loaded
//! once at startup and read-only afterwards.
//!
//! Two file shapes are accepted:
//!
//! ```json
//! { "5": { "location": "Oasis", "image": "https://..." } }
//! ```
//!
//! ```json
//! [ { "id": 5, "location": "Oasis", "image": "https://..." } ]
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::ZoneId;

/// Display metadata for one zone
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ZoneEntry {
    pub location: String,
    #[serde(default)]
    pub image: String,
}

impl ZoneEntry {
    pub fn new(location: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            image: image.into(),
        }
    }
}

#[derive(Deserialize)]
struct ListedEntry {
    id: ZoneId,
    #[serde(flatten)]
    entry: ZoneEntry,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DirectoryFile {
    Keyed(HashMap<ZoneId, ZoneEntry>),
    Listed(Vec<ListedEntry>),
}

/// Immutable zone id → metadata mapping
#[derive(Debug, Clone, Default)]
pub struct ZoneDirectory {
    entries: HashMap<ZoneId, ZoneEntry>,
}

impl ZoneDirectory {
    pub fn new(entries: HashMap<ZoneId, ZoneEntry>) -> Self {
        Self { entries }
    }

    /// Parse a directory from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: DirectoryFile = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Invalid zone directory: {}", e)))?;

        let entries = match file {
            DirectoryFile::Keyed(map) => map,
            DirectoryFile::Listed(list) => list.into_iter().map(|l| (l.id, l.entry)).collect(),
        };

        Ok(Self { entries })
    }

    /// Load a directory file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read zone directory {}: {}",
                path.display(),
                e
            ))
        })?;

        let directory = Self::from_json_str(&content)?;
        tracing::debug!(
            "Loaded zone directory from {}: {} zones",
            path.display(),
            directory.len()
        );
        Ok(directory)
    }

    pub fn get(&self, id: &ZoneId) -> Option<&ZoneEntry> {
        self.entries.get(id)
    }

    /// First identifier in `ids` that has a mapping
    pub fn resolve(&self, ids: &[ZoneId]) -> Option<&ZoneEntry> {
        ids.iter().find_map(|id| self.entries.get(id))
    }

    /// Resolve `ids`, synthesizing `"Zone <first id>"` when nothing maps
    ///
    /// Returns `None` only for an empty list.
    pub fn resolve_or_fallback(&self, ids: &[ZoneId]) -> Option<ZoneEntry> {
        let first = ids.first()?;
        Some(
            self.resolve(ids)
                .cloned()
                .unwrap_or_else(|| ZoneEntry::new(format!("Zone {}", first), "")),
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
