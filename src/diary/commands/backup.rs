use crate::archive;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::store::{EntryStore, StorageBackend};
use chrono::NaiveDateTime;
use std::path::Path;

/// Archives the entries directory, then stamps and saves the index.
///
/// The last-backup marker only moves once the archive exists on disk.
pub fn run<B: StorageBackend>(
    store: &mut EntryStore<B>,
    entries_dir: &Path,
    backups_dir: &Path,
    now: NaiveDateTime,
) -> Result<CmdResult> {
    let outcome = archive::create_archive(entries_dir, backups_dir, now)?;

    store.record_backup(now);
    store.save_index()?;

    let mut result = CmdResult::default().with_archive_path(outcome.path.clone());
    result.add_message(CmdMessage::success(format!(
        "Backup created: {}",
        outcome.path.display()
    )));
    result.add_message(CmdMessage::info(format!(
        "Entries backed up: {}",
        store.index().entry_count()
    )));
    result.add_failures("back up", &outcome.failures);
    Ok(result)
}
