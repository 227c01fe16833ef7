use crate::error::{DiaryError, Result};
use crate::naming::normalize_ext;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.json";
const DEFAULT_FILE_EXT: &str = ".txt";

pub const ENTRIES_DIRNAME: &str = "entries";
pub const BACKUPS_DIRNAME: &str = "backups";
pub const INDEX_FILENAME: &str = "diary_index.json";

/// What to do when a new entry lands on an identifier that already exists
/// (two entries within the same second).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Replace the earlier entry's content.
    #[default]
    Overwrite,
    /// Refuse with a conflict error and leave the earlier entry alone.
    Reject,
}

/// Configuration for a diary, stored in `<root>/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiaryConfig {
    /// File extension for entry files (e.g., ".txt", ".md")
    #[serde(default = "default_file_ext")]
    pub file_ext: String,

    #[serde(default)]
    pub collision_policy: CollisionPolicy,
}

fn default_file_ext() -> String {
    DEFAULT_FILE_EXT.to_string()
}

impl Default for DiaryConfig {
    fn default() -> Self {
        Self {
            file_ext: default_file_ext(),
            collision_policy: CollisionPolicy::default(),
        }
    }
}

impl DiaryConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(DiaryError::Io)?;
        let mut config: DiaryConfig =
            serde_json::from_str(&content).map_err(DiaryError::Serialization)?;
        config.file_ext = normalize_ext(&config.file_ext);
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(DiaryError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(DiaryError::Serialization)?;
        fs::write(config_path, content).map_err(DiaryError::Io)?;
        Ok(())
    }

    pub fn file_ext(&self) -> &str {
        &self.file_ext
    }

    /// Set the file extension (normalizes to start with a dot)
    pub fn set_file_ext(&mut self, ext: &str) {
        self.file_ext = normalize_ext(ext);
    }
}

/// Locations of everything a diary keeps on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiaryPaths {
    pub root: PathBuf,
    pub entries: PathBuf,
    pub backups: PathBuf,
    pub index_file: PathBuf,
}

impl DiaryPaths {
    pub fn from_root<P: Into<PathBuf>>(root: P) -> Self {
        let root = root.into();
        Self {
            entries: root.join(ENTRIES_DIRNAME),
            backups: root.join(BACKUPS_DIRNAME),
            index_file: root.join(INDEX_FILENAME),
            root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = DiaryConfig::default();
        assert_eq!(config.file_ext, ".txt");
        assert_eq!(config.collision_policy, CollisionPolicy::Overwrite);
    }

    #[test]
    fn test_set_file_ext_without_dot() {
        let mut config = DiaryConfig::default();
        config.set_file_ext("md");
        assert_eq!(config.file_ext(), ".md");
    }

    #[test]
    fn test_load_missing_config() {
        let dir = TempDir::new().unwrap();
        let config = DiaryConfig::load(dir.path().join("nowhere")).unwrap();
        assert_eq!(config, DiaryConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();

        let mut config = DiaryConfig::default();
        config.set_file_ext(".md");
        config.collision_policy = CollisionPolicy::Reject;
        config.save(dir.path()).unwrap();

        let loaded = DiaryConfig::load(dir.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults_and_normalizes() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), r#"{"file_ext":"md"}"#).unwrap();

        let loaded = DiaryConfig::load(dir.path()).unwrap();
        assert_eq!(loaded.file_ext, ".md");
        assert_eq!(loaded.collision_policy, CollisionPolicy::Overwrite);
    }

    #[test]
    fn test_policy_serializes_lowercase() {
        let json = serde_json::to_string(&CollisionPolicy::Reject).unwrap();
        assert_eq!(json, "\"reject\"");
    }

    #[test]
    fn test_paths_layout() {
        let paths = DiaryPaths::from_root("/tmp/diary");
        assert_eq!(paths.entries, PathBuf::from("/tmp/diary/entries"));
        assert_eq!(paths.backups, PathBuf::from("/tmp/diary/backups"));
        assert_eq!(paths.index_file, PathBuf::from("/tmp/diary/diary_index.json"));
    }
}
