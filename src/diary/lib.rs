//! # Diary Architecture
//!
//! A **plain-text diary storage core**. Every entry is one text file named
//! after the second it was written; a small JSON index tracks which entries
//! exist and when the last backup ran; the whole entries directory can be
//! snapshotted into a `.tar.gz` archive and restored from one.
//!
//! There is no user interface here. A shell (terminal menu, GUI, ...) owns
//! prompting, confirmation and display, and talks to this crate through
//! [`api::DiaryApi`] or the lower layers directly.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade, single entry point for shells               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Backup, restore, doctor: store + archive sequencing      │
//! │  - Returns CmdResult with leveled messages                  │
//! └─────────────────────────────────────────────────────────────┘
//!                │                                │
//!                ▼                                ▼
//! ┌──────────────────────────────┐  ┌──────────────────────────┐
//! │  Storage Layer (store/)      │  │  Archive Engine          │
//! │  - EntryStore + index        │  │  (archive.rs)            │
//! │  - FsBackend / MemBackend    │  │  - tar.gz of a directory │
//! └──────────────────────────────┘  └──────────────────────────┘
//! ```
//!
//! ## The Index Is Derived State
//!
//! The entries directory is the source of truth. Listing and searching always
//! scan it, and after a restore the index is rebuilt from a scan instead of
//! being taken from the archive. See [`index`].
//!
//! ## Best-Effort Sweeps
//!
//! Whole-directory operations (`clear_all`, search, summaries, archive
//! creation) keep going when a single file fails. The failure is logged and
//! returned in a [`model::SweepReport`] next to what succeeded.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade
//! - [`commands`]: Backup, restore and doctor workflows
//! - [`store`]: Storage abstraction, backends and the entry store
//! - [`archive`]: Archive creation, restore and listing
//! - [`index`]: The persisted entry index
//! - [`model`]: Entries and operation reports
//! - [`naming`]: Identifier and archive naming, previews
//! - [`config`]: Configuration and on-disk layout
//! - [`init`]: Resolving and preparing a diary root
//! - [`logging`]: Optional tracing subscriber setup
//! - [`error`]: Error types

pub mod api;
pub mod archive;
pub mod commands;
pub mod config;
pub mod error;
pub mod index;
pub mod init;
pub mod logging;
pub mod model;
pub mod naming;
pub mod store;
