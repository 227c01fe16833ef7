use crate::error::Result;
use std::path::PathBuf;

/// Abstract interface for raw storage I/O.
/// This trait handles the "how" of storage (filesystem vs memory),
/// while `EntryStore` handles the "what" (validation, index upkeep, sweeps).
///
/// Entries are addressed by file name; callers validate names before they
/// reach the backend.
pub trait StorageBackend {
    // --- Index Operations ---

    /// Load the raw index document. Ok(None) if there is none yet.
    fn load_index(&self) -> Result<Option<String>>;

    /// Persist the raw index document.
    /// MUST be atomic (write to tmp then rename).
    fn save_index(&self, raw: &str) -> Result<()>;

    // --- Content Operations ---

    /// Read an entry's content.
    /// Returns Ok(None) if the file does not exist.
    /// Returns Err only on actual I/O errors (permissions, invalid UTF-8, disk failure).
    fn read_content(&self, name: &str) -> Result<Option<String>>;

    /// Write content, replacing any previous content.
    /// MUST be atomic (e.g. write to tmp then rename) to avoid partial writes.
    fn write_content(&self, name: &str, content: &str) -> Result<()>;

    /// Delete an entry file. Returns Ok(false) if it did not exist.
    fn delete_content(&self, name: &str) -> Result<bool>;

    fn content_exists(&self, name: &str) -> bool;

    // --- Discovery ---

    /// Names of all regular files in the entries location, unfiltered and unsorted.
    /// A missing location yields an empty list.
    fn list_names(&self) -> Result<Vec<String>>;

    /// Where the content lives. For FsBackend, the real path.
    fn content_path(&self, name: &str) -> PathBuf;
}
