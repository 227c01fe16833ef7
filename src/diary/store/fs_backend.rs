use super::backend::StorageBackend;
use crate::config::DiaryPaths;
use crate::error::{DiaryError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

/// Filesystem backend: one file per entry in `entries_dir`, index JSON at `index_file`.
pub struct FsBackend {
    entries_dir: PathBuf,
    index_file: PathBuf,
}

impl FsBackend {
    pub fn new(entries_dir: PathBuf, index_file: PathBuf) -> Self {
        Self {
            entries_dir,
            index_file,
        }
    }

    pub fn from_paths(paths: &DiaryPaths) -> Self {
        Self::new(paths.entries.clone(), paths.index_file.clone())
    }

    pub fn entries_dir(&self) -> &Path {
        &self.entries_dir
    }

    pub fn index_file(&self) -> &Path {
        &self.index_file
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).map_err(DiaryError::Io)?;
        }
        Ok(())
    }
}

/// Writes through a uniquely named sibling temp file, then renames into place.
fn write_atomic(target: &Path, content: &str) -> Result<()> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let stem = target
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let tmp_path = dir.join(format!(".{}-{}.tmp", stem, Uuid::new_v4()));

    fs::write(&tmp_path, content).map_err(DiaryError::Io)?;
    if let Err(e) = fs::rename(&tmp_path, target) {
        let _ = fs::remove_file(&tmp_path);
        return Err(DiaryError::Io(e));
    }
    Ok(())
}

impl StorageBackend for FsBackend {
    fn load_index(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.index_file) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DiaryError::Io(e)),
        }
    }

    fn save_index(&self, raw: &str) -> Result<()> {
        if let Some(parent) = self.index_file.parent() {
            self.ensure_dir(parent)?;
        }
        write_atomic(&self.index_file, raw)
    }

    fn read_content(&self, name: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.content_path(name)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DiaryError::Io(e)),
        }
    }

    fn write_content(&self, name: &str, content: &str) -> Result<()> {
        self.ensure_dir(&self.entries_dir)?;
        write_atomic(&self.content_path(name), content)
    }

    fn delete_content(&self, name: &str) -> Result<bool> {
        match fs::remove_file(self.content_path(name)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(DiaryError::Io(e)),
        }
    }

    fn content_exists(&self, name: &str) -> bool {
        self.content_path(name).is_file()
    }

    fn list_names(&self) -> Result<Vec<String>> {
        if !self.entries_dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        let entries = fs::read_dir(&self.entries_dir).map_err(DiaryError::Io)?;

        // One unreadable directory entry must not hide the rest.
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", self.entries_dir.display(), e);
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            match path.file_name().and_then(|s| s.to_str()) {
                Some(name) => names.push(name.to_string()),
                None => warn!("Skipping non UTF-8 file name {}", path.display()),
            }
        }
        Ok(names)
    }

    fn content_path(&self, name: &str) -> PathBuf {
        self.entries_dir.join(name)
    }
}
