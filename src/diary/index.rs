//! # Entry Index
//!
//! The index is a small JSON document kept next to the entries directory:
//!
//! ```json
//! {
//!   "version": 1,
//!   "entries": ["entry_2024_01_05_08_00_00.txt", "entry_2024_01_05_08_00_01.txt"],
//!   "entry_count": 2,
//!   "last_backup": "2024-01-05 09:00:00"
//! }
//! ```
//!
//! It is derived state. The entries directory is the source of truth, and the
//! store can rebuild the identifier list from a scan at any time. Because of
//! that, loading is forgiving: a missing, unreadable or newer-versioned file
//! yields an empty index instead of an error.
//!
//! `entry_count` is written for the benefit of readers but never trusted on
//! load; it is always the length of `entries`.

use serde::{Deserialize, Serialize};

pub const INDEX_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiaryIndex {
    entries: Vec<String>,
    last_backup: Option<String>,
}

/// On-disk shape of the index.
#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    version: u32,
    #[serde(default)]
    entries: Vec<String>,
    #[serde(default)]
    entry_count: usize,
    #[serde(default)]
    last_backup: Option<String>,
}

impl Default for DiaryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl DiaryIndex {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            last_backup: None,
        }
    }

    /// Appends an identifier. Returns false if it was already present.
    pub fn add(&mut self, identifier: &str) -> bool {
        if self.contains(identifier) {
            return false;
        }
        self.entries.push(identifier.to_string());
        true
    }

    /// Removes an identifier. Returns false if it was not present.
    pub fn remove(&mut self, identifier: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e != identifier);
        self.entries.len() != before
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.iter().any(|e| e == identifier)
    }

    /// Forgets every identifier and the last-backup marker.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.last_backup = None;
    }

    /// Replaces the identifier list, keeping the last-backup marker.
    /// Duplicates in `identifiers` are collapsed, first occurrence wins.
    pub fn replace_entries<I: IntoIterator<Item = String>>(&mut self, identifiers: I) {
        self.entries.clear();
        for id in identifiers {
            self.add(&id);
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn last_backup(&self) -> Option<&str> {
        self.last_backup.as_deref()
    }

    pub fn set_last_backup(&mut self, stamp: impl Into<String>) {
        self.last_backup = Some(stamp.into());
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let file = IndexFile {
            version: INDEX_VERSION,
            entries: self.entries.clone(),
            entry_count: self.entries.len(),
            last_backup: self.last_backup.clone(),
        };
        serde_json::to_string_pretty(&file)
    }

    /// Decodes an index, or returns `None` if the document is unusable.
    pub fn from_json(raw: &str) -> Option<Self> {
        let file: IndexFile = match serde_json::from_str(raw) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!("Index is corrupt, starting fresh: {}", e);
                return None;
            }
        };

        if file.version > INDEX_VERSION {
            tracing::warn!(
                "Index version {} is newer than supported version {}, starting fresh",
                file.version,
                INDEX_VERSION
            );
            return None;
        }

        let mut index = Self::new();
        index.replace_entries(file.entries);
        if index.entry_count() != file.entry_count {
            tracing::debug!(
                "Index count {} disagreed with {} listed entries",
                file.entry_count,
                index.entry_count()
            );
        }
        index.last_backup = file.last_backup;
        Some(index)
    }
}
