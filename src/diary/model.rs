use crate::error::DiaryError;
use crate::naming;
use chrono::NaiveDateTime;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub identifier: String,
    pub timestamp: NaiveDateTime,
    pub content: String,
}

impl Entry {
    pub fn new(timestamp: NaiveDateTime, content: &str, file_ext: &str) -> Self {
        Self {
            identifier: naming::entry_identifier(&timestamp, file_ext),
            timestamp,
            content: content.trim().to_string(),
        }
    }
}

/// One row of the entry list: identifier, creation time and the first line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySummary {
    pub identifier: String,
    pub timestamp: NaiveDateTime,
    pub first_line: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub identifier: String,
    pub preview: String,
}

/// An item a sweep could not process, and why.
#[derive(Debug)]
pub struct SweepFailure {
    pub item: String,
    pub error: DiaryError,
}

/// Outcome of a bulk operation that keeps going past per-item failures.
#[derive(Debug)]
pub struct SweepReport<T> {
    pub processed: Vec<T>,
    pub failures: Vec<SweepFailure>,
}

impl<T> Default for SweepReport<T> {
    fn default() -> Self {
        Self {
            processed: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<T> SweepReport<T> {
    pub fn push(&mut self, item: T) {
        self.processed.push(item);
    }

    pub fn fail(&mut self, item: impl Into<String>, error: DiaryError) {
        let item = item.into();
        tracing::warn!("Skipping {}: {}", item, error);
        self.failures.push(SweepFailure { item, error });
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug)]
pub struct ArchiveOutcome {
    pub path: PathBuf,
    /// Archive member names, relative to the source directory.
    pub added: Vec<String>,
    pub failures: Vec<SweepFailure>,
}

#[derive(Debug, Default)]
pub struct RestoreOutcome {
    /// Files written, relative to the destination directory.
    pub restored: Vec<PathBuf>,
}

/// What an index rebuild changed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RebuildReport {
    /// On disk but missing from the index.
    pub recovered: Vec<String>,
    /// In the index but missing on disk.
    pub dropped: Vec<String>,
}

impl RebuildReport {
    pub fn is_clean(&self) -> bool {
        self.recovered.is_empty() && self.dropped.is_empty()
    }
}
