//! # API Facade
//!
//! The API layer is a **thin facade** over the entry store, the archive engine
//! and the commands. It is the single entry point for a shell (menu, GUI or
//! anything else) that drives a diary on disk.
//!
//! The facade:
//! - **Dispatches** entry CRUD straight to [`EntryStore`]
//! - **Sequences** the multi-step workflows (backup, restore, doctor) through
//!   `commands/*.rs`
//! - **Returns structured types**, never prints
//!
//! Confirmation prompts stay with the shell. In particular, calling
//! [`DiaryApi::clear_all`] or restoring with [`RestoreMode::Replace`] deletes
//! entries without asking.
//!
//! The index is saved by backup, restore and doctor. After plain entry edits
//! the shell decides when to persist it with [`DiaryApi::save_index`]
//! (typically at shutdown).

use crate::archive;
use crate::commands;
use crate::config::{DiaryConfig, DiaryPaths};
use crate::error::Result;
use crate::index::DiaryIndex;
use crate::model::{Entry, EntrySummary, SearchHit, SweepReport};
use crate::store::{EntryStore, FsBackend};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

pub struct DiaryApi {
    store: EntryStore<FsBackend>,
    paths: DiaryPaths,
}

impl DiaryApi {
    pub fn new(store: EntryStore<FsBackend>, paths: DiaryPaths) -> Self {
        Self { store, paths }
    }

    /// Opens the diary under `paths`, loading its index.
    pub fn open(paths: DiaryPaths, config: &DiaryConfig) -> Result<Self> {
        let store = EntryStore::open(FsBackend::from_paths(&paths), config)?;
        Ok(Self::new(store, paths))
    }

    pub fn create_entry(&mut self, content: &str, now: NaiveDateTime) -> Result<Entry> {
        self.store.create_entry(content, now)
    }

    pub fn read_entry(&self, identifier: &str) -> Result<String> {
        self.store.read_entry(identifier)
    }

    pub fn update_entry(&mut self, identifier: &str, content: &str) -> Result<()> {
        self.store.update_entry(identifier, content)
    }

    pub fn list_entries(&self) -> Result<Vec<String>> {
        self.store.list_entries()
    }

    pub fn list_summaries(&self) -> Result<SweepReport<EntrySummary>> {
        self.store.list_summaries()
    }

    pub fn search_entries(&self, keyword: &str) -> Result<SweepReport<SearchHit>> {
        self.store.search_entries(keyword)
    }

    pub fn delete_entry(&mut self, identifier: &str) -> Result<()> {
        self.store.delete_entry(identifier)
    }

    pub fn clear_all(&mut self) -> Result<SweepReport<String>> {
        self.store.clear_all()
    }

    pub fn entry_path(&self, identifier: &str) -> Result<PathBuf> {
        self.store.entry_path(identifier)
    }

    pub fn backup(&mut self, now: NaiveDateTime) -> Result<commands::CmdResult> {
        commands::backup::run(
            &mut self.store,
            &self.paths.entries,
            &self.paths.backups,
            now,
        )
    }

    pub fn restore(&mut self, archive_path: &Path, mode: RestoreMode) -> Result<commands::CmdResult> {
        commands::restore::run(&mut self.store, archive_path, &self.paths.entries, mode)
    }

    pub fn doctor(&mut self) -> Result<commands::CmdResult> {
        commands::doctor::run(&mut self.store)
    }

    /// Available backups, oldest first.
    pub fn list_backups(&self) -> Result<Vec<PathBuf>> {
        archive::list_archives(&self.paths.backups)
    }

    pub fn load_index(&mut self) -> Result<()> {
        self.store.load_index()
    }

    pub fn save_index(&self) -> Result<()> {
        self.store.save_index()
    }

    pub fn index(&self) -> &DiaryIndex {
        self.store.index()
    }

    pub fn paths(&self) -> &DiaryPaths {
        &self.paths
    }
}

pub use crate::commands::restore::RestoreMode;
pub use crate::commands::{CmdMessage, CmdResult, MessageLevel};
