//! # Storage Layer
//!
//! Entry storage is split in two:
//!
//! - [`backend::StorageBackend`]: raw I/O. Read, write, delete and list entry
//!   files by name, and load/save the raw index document.
//! - [`entry_store::EntryStore`]: everything with rules attached. Identifier
//!   validation, trimming, the index, newest-first ordering and the
//!   best-effort sweeps.
//!
//! ## Implementations
//!
//! - [`fs_backend::FsBackend`]: production storage
//!   - Entry content in individual files: `entries/entry_{stamp}{ext}`
//!   - Index in `diary_index.json`
//!   - Every write goes through a temp file and a rename
//!
//! - [`mem_backend::MemBackend`]: in-memory storage for testing
//!   - No persistence
//!   - Can lock individual entries to exercise partial-failure paths
//!
//! ## Storage Format
//!
//! For `FsBackend`:
//! ```text
//! <root>/
//! ├── diary_index.json                    # Identifier list, count, last backup
//! ├── config.json                         # Optional settings
//! ├── entries/
//! │   └── entry_2024_01_05_08_00_00.txt   # One file per entry
//! └── backups/
//!     └── diary_backup_20240105_090000.tar.gz
//! ```

pub mod backend;
pub mod entry_store;
pub mod fs_backend;
pub mod mem_backend;

pub use backend::StorageBackend;
pub use entry_store::EntryStore;
pub use fs_backend::FsBackend;
pub use mem_backend::MemBackend;
