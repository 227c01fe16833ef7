//! # Initialization
//!
//! Resolves where a diary lives and gets it ready to use.
//!
//! The root is either given explicitly by the shell or falls back to the
//! OS-appropriate data directory (via the `directories` crate), e.g.
//! `~/.local/share/diary` on Linux. Under the root:
//!
//! - `entries/` and `backups/` are created if missing
//! - `config.json` is read if present, otherwise defaults apply
//! - `diary_index.json` is loaded into the store (or an empty index is used)

use crate::api::DiaryApi;
use crate::config::{DiaryConfig, DiaryPaths};
use crate::error::{DiaryError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct DiaryContext {
    pub api: DiaryApi,
    pub config: DiaryConfig,
}

/// The platform data directory for diaries.
pub fn default_root() -> Result<PathBuf> {
    ProjectDirs::from("com", "diary", "diary")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| DiaryError::Store("Could not determine a data directory".to_string()))
}

pub fn initialize(root: Option<&Path>) -> Result<DiaryContext> {
    let root = match root {
        Some(root) => root.to_path_buf(),
        None => default_root()?,
    };
    let paths = DiaryPaths::from_root(root);

    fs::create_dir_all(&paths.entries).map_err(DiaryError::Io)?;
    fs::create_dir_all(&paths.backups).map_err(DiaryError::Io)?;

    let config = DiaryConfig::load(&paths.root)?;
    let api = DiaryApi::open(paths, &config)?;

    info!(
        "Diary opened at {} ({} entries indexed)",
        api.paths().root.display(),
        api.index().entry_count()
    );
    Ok(DiaryContext { api, config })
}
