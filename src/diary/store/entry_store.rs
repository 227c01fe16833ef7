use super::backend::StorageBackend;
use crate::config::{CollisionPolicy, DiaryConfig};
use crate::error::{DiaryError, Result};
use crate::index::DiaryIndex;
use crate::model::{Entry, EntrySummary, RebuildReport, SearchHit, SweepReport};
use crate::naming;
use chrono::{NaiveDateTime, Timelike};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Entry CRUD on top of a storage backend, plus upkeep of the index.
///
/// The index is owned here: it is loaded when the store is opened and only
/// written back by [`EntryStore::save_index`]. Listing and searching always
/// scan the backend, so a stale index never hides or invents entries.
pub struct EntryStore<B: StorageBackend> {
    pub(crate) backend: B,
    index: DiaryIndex,
    file_ext: String,
    collision_policy: CollisionPolicy,
}

impl<B: StorageBackend> EntryStore<B> {
    pub fn open(backend: B, config: &DiaryConfig) -> Result<Self> {
        let mut store = Self {
            backend,
            index: DiaryIndex::new(),
            file_ext: naming::normalize_ext(config.file_ext()),
            collision_policy: config.collision_policy,
        };
        store.load_index()?;
        Ok(store)
    }

    /// Opens with the default configuration.
    pub fn with_backend(backend: B) -> Result<Self> {
        Self::open(backend, &DiaryConfig::default())
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn index(&self) -> &DiaryIndex {
        &self.index
    }

    pub fn file_ext(&self) -> &str {
        &self.file_ext
    }

    /// Replaces the in-memory index with the persisted one.
    /// A missing or corrupt document gives an empty index.
    pub fn load_index(&mut self) -> Result<()> {
        self.index = match self.backend.load_index()? {
            Some(raw) => DiaryIndex::from_json(&raw).unwrap_or_default(),
            None => DiaryIndex::new(),
        };
        debug!("Loaded index with {} entries", self.index.entry_count());
        Ok(())
    }

    pub fn save_index(&self) -> Result<()> {
        let raw = self.index.to_json().map_err(DiaryError::Serialization)?;
        self.backend.save_index(&raw)?;
        debug!("Saved index with {} entries", self.index.entry_count());
        Ok(())
    }

    pub fn create_entry(&mut self, content: &str, now: NaiveDateTime) -> Result<Entry> {
        if content.trim().is_empty() {
            return Err(DiaryError::Validation("entry content is empty".to_string()));
        }

        let now = now.with_nanosecond(0).unwrap_or(now);
        let entry = Entry::new(now, content, &self.file_ext);

        if self.backend.content_exists(&entry.identifier) {
            match self.collision_policy {
                CollisionPolicy::Reject => {
                    return Err(DiaryError::Conflict(entry.identifier));
                }
                CollisionPolicy::Overwrite => {
                    warn!("Overwriting existing entry {}", entry.identifier);
                }
            }
        }

        self.backend.write_content(&entry.identifier, &entry.content)?;
        self.index.add(&entry.identifier);
        info!("Created entry {}", entry.identifier);
        Ok(entry)
    }

    pub fn read_entry(&self, identifier: &str) -> Result<String> {
        self.validate_identifier(identifier)?;
        self.backend
            .read_content(identifier)?
            .ok_or_else(|| DiaryError::EntryNotFound(identifier.to_string()))
    }

    /// Overwrites an existing entry's content in place.
    pub fn update_entry(&mut self, identifier: &str, content: &str) -> Result<()> {
        self.validate_identifier(identifier)?;
        if content.trim().is_empty() {
            return Err(DiaryError::Validation("entry content is empty".to_string()));
        }
        if !self.backend.content_exists(identifier) {
            return Err(DiaryError::EntryNotFound(identifier.to_string()));
        }

        self.backend.write_content(identifier, content.trim())?;
        if self.index.add(identifier) {
            debug!("Re-indexed {} while updating it", identifier);
        }
        info!("Updated entry {}", identifier);
        Ok(())
    }

    /// Identifiers of every entry file present, newest first.
    pub fn list_entries(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self
            .backend
            .list_names()?
            .into_iter()
            .filter(|name| naming::is_entry_name(name, &self.file_ext))
            .collect();
        ids.sort_by(|a, b| b.cmp(a));
        Ok(ids)
    }

    pub fn list_summaries(&self) -> Result<SweepReport<EntrySummary>> {
        let mut report = SweepReport::default();

        for identifier in self.list_entries()? {
            let Some(timestamp) = naming::parse_entry_identifier(&identifier, &self.file_ext)
            else {
                continue;
            };
            match self.backend.read_content(&identifier) {
                Ok(Some(content)) => report.push(EntrySummary {
                    first_line: naming::summary_line(&content),
                    identifier,
                    timestamp,
                }),
                Ok(None) => {
                    let err = DiaryError::EntryNotFound(identifier.clone());
                    report.fail(identifier, err);
                }
                Err(e) => report.fail(identifier, e),
            }
        }

        Ok(report)
    }

    /// Case-insensitive substring search over entry contents, newest first.
    pub fn search_entries(&self, keyword: &str) -> Result<SweepReport<SearchHit>> {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return Err(DiaryError::Validation(
                "search keyword is empty".to_string(),
            ));
        }

        let mut report = SweepReport::default();
        for identifier in self.list_entries()? {
            match self.backend.read_content(&identifier) {
                Ok(Some(content)) => {
                    if content.to_lowercase().contains(&needle) {
                        report.push(SearchHit {
                            preview: naming::search_preview(&content),
                            identifier,
                        });
                    }
                }
                Ok(None) => debug!("{} vanished during search", identifier),
                Err(e) => report.fail(identifier, e),
            }
        }

        debug!(
            "Search for {:?} matched {} entries",
            needle,
            report.processed.len()
        );
        Ok(report)
    }

    pub fn delete_entry(&mut self, identifier: &str) -> Result<()> {
        self.validate_identifier(identifier)?;
        if !self.backend.delete_content(identifier)? {
            return Err(DiaryError::EntryNotFound(identifier.to_string()));
        }
        self.index.remove(identifier);
        info!("Deleted entry {}", identifier);
        Ok(())
    }

    /// Deletes every entry file, continuing past files that cannot be removed.
    ///
    /// Afterwards the index lists exactly the entries that survived, and the
    /// last-backup marker is cleared.
    pub fn clear_all(&mut self) -> Result<SweepReport<String>> {
        let mut report = SweepReport::default();

        for identifier in self.list_entries()? {
            match self.backend.delete_content(&identifier) {
                Ok(_) => report.push(identifier),
                Err(e) => report.fail(identifier, e),
            }
        }

        self.index.clear();
        self.index
            .replace_entries(report.failures.iter().map(|f| f.item.clone()));

        info!(
            "Cleared {} entries ({} failed)",
            report.processed.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Rebuilds the identifier list from what is actually stored.
    ///
    /// Entries are indexed oldest first so insertion order stays chronological.
    /// The last-backup marker is kept.
    pub fn rebuild_index(&mut self) -> Result<RebuildReport> {
        let mut on_disk = self.list_entries()?;
        on_disk.reverse();

        let present: HashSet<&String> = on_disk.iter().collect();
        let report = RebuildReport {
            recovered: on_disk
                .iter()
                .filter(|id| !self.index.contains(id))
                .cloned()
                .collect(),
            dropped: self
                .index
                .entries()
                .iter()
                .filter(|id| !present.contains(id))
                .cloned()
                .collect(),
        };

        self.index.replace_entries(on_disk);
        info!(
            "Rebuilt index: {} entries, {} recovered, {} dropped",
            self.index.entry_count(),
            report.recovered.len(),
            report.dropped.len()
        );
        Ok(report)
    }

    pub fn record_backup(&mut self, now: NaiveDateTime) {
        self.index.set_last_backup(naming::display_timestamp(&now));
    }

    pub fn entry_path(&self, identifier: &str) -> Result<PathBuf> {
        self.validate_identifier(identifier)?;
        Ok(self.backend.content_path(identifier))
    }

    fn validate_identifier(&self, identifier: &str) -> Result<()> {
        if naming::is_entry_name(identifier, &self.file_ext) {
            Ok(())
        } else {
            Err(DiaryError::Validation(format!(
                "not an entry identifier: {}",
                identifier
            )))
        }
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use chrono::{NaiveDate, NaiveDateTime};

    /// Shorthand for a second-resolution timestamp.
    pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .and_then(|date| date.and_hms_opt(h, mi, s))
            .expect("valid fixture timestamp")
    }
}
