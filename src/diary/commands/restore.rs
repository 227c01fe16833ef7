use crate::archive;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::store::{EntryStore, StorageBackend};
use std::path::Path;
use tracing::debug;

/// How a restore treats entries that are already present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RestoreMode {
    /// Delete every current entry first, so the archive becomes the entry set.
    #[default]
    Replace,
    /// Unpack over the current entries; same-named files are overwritten.
    Merge,
}

/// Restores an archive into the entries directory and rebuilds the index
/// from what is on disk afterwards.
///
/// The archive is read in full before anything is deleted, so a missing,
/// damaged or malformed archive leaves the entries and the index as they were.
pub fn run<B: StorageBackend>(
    store: &mut EntryStore<B>,
    archive_path: &Path,
    entries_dir: &Path,
    mode: RestoreMode,
) -> Result<CmdResult> {
    let members = archive::verify_archive(archive_path)?;
    debug!("{} holds {} files", archive_path.display(), members);

    let mut result = CmdResult::default().with_archive_path(archive_path.to_path_buf());

    if mode == RestoreMode::Replace {
        let cleared = store.clear_all()?;
        if !cleared.is_complete() {
            result.add_message(CmdMessage::warning(format!(
                "{} entries could not be removed before restoring",
                cleared.failures.len()
            )));
            result.add_failures("remove", &cleared.failures);
        }
    }

    let outcome = archive::restore_archive(archive_path, entries_dir)?;
    store.rebuild_index()?;
    store.save_index()?;

    result.add_message(CmdMessage::success(format!(
        "Backup restored: {} files",
        outcome.restored.len()
    )));
    result.add_message(CmdMessage::info(format!(
        "Entries restored: {}",
        store.index().entry_count()
    )));
    Ok(result.with_entries(store.index().entries().to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::backup;
    use crate::store::entry_store::fixtures::at;
    use crate::error::DiaryError;
    use crate::store::FsBackend;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _root: TempDir,
        entries: std::path::PathBuf,
        backups: std::path::PathBuf,
        store: EntryStore<FsBackend>,
    }

    fn fixture() -> Fixture {
        let root = TempDir::new().unwrap();
        let entries = root.path().join("entries");
        let backups = root.path().join("backups");
        let store =
            EntryStore::with_backend(FsBackend::new(entries.clone(), root.path().join("i.json")))
                .unwrap();
        Fixture {
            _root: root,
            entries,
            backups,
            store,
        }
    }

    #[test]
    fn replace_drops_entries_newer_than_backup() {
        let mut fx = fixture();
        let old = fx.store.create_entry("old", at(2024, 1, 1, 0, 0, 0)).unwrap();
        let archive = backup::run(&mut fx.store, &fx.entries, &fx.backups, at(2024, 1, 1, 1, 0, 0))
            .unwrap()
            .archive_path
            .unwrap();
        fx.store.create_entry("new", at(2024, 1, 2, 0, 0, 0)).unwrap();

        let result = run(&mut fx.store, &archive, &fx.entries, RestoreMode::Replace).unwrap();

        assert_eq!(result.entries, vec![old.identifier.clone()]);
        assert_eq!(fx.store.list_entries().unwrap(), vec![old.identifier]);
        assert_eq!(fx.store.index().entry_count(), 1);
    }

    #[test]
    fn merge_keeps_current_entries() {
        let mut fx = fixture();
        fx.store.create_entry("old", at(2024, 1, 1, 0, 0, 0)).unwrap();
        let archive = backup::run(&mut fx.store, &fx.entries, &fx.backups, at(2024, 1, 1, 1, 0, 0))
            .unwrap()
            .archive_path
            .unwrap();
        fx.store.create_entry("new", at(2024, 1, 2, 0, 0, 0)).unwrap();

        run(&mut fx.store, &archive, &fx.entries, RestoreMode::Merge).unwrap();

        assert_eq!(fx.store.list_entries().unwrap().len(), 2);
        assert_eq!(fx.store.index().entry_count(), 2);
    }

    #[test]
    fn missing_archive_deletes_nothing() {
        let mut fx = fixture();
        fx.store.create_entry("precious", at(2024, 1, 1, 0, 0, 0)).unwrap();

        let err = run(
            &mut fx.store,
            &fx.backups.join("diary_backup_20990101_000000.tar.gz"),
            &fx.entries,
            RestoreMode::Replace,
        )
        .unwrap_err();

        assert!(matches!(err, DiaryError::NotFound(_)));
        assert_eq!(fx.store.list_entries().unwrap().len(), 1);
    }

    #[test]
    fn damaged_archive_deletes_nothing() {
        let mut fx = fixture();
        let kept = fx.store.create_entry("precious", at(2024, 1, 5, 8, 0, 0)).unwrap();
        fx.store.save_index().unwrap();
        let saved_before = fs::read_to_string(fx._root.path().join("i.json")).unwrap();

        fs::create_dir_all(&fx.backups).unwrap();
        let bad = fx.backups.join("diary_backup_20240105_090000.tar.gz");
        fs::write(&bad, b"this is not a gzip stream").unwrap();

        for mode in [RestoreMode::Replace, RestoreMode::Merge] {
            assert!(run(&mut fx.store, &bad, &fx.entries, mode).is_err());
            assert_eq!(fx.store.list_entries().unwrap(), vec![kept.identifier.clone()]);
            assert_eq!(fx.store.index().entries(), &[kept.identifier.clone()]);
            assert_eq!(
                fs::read_to_string(fx._root.path().join("i.json")).unwrap(),
                saved_before
            );
        }
    }

    #[test]
    fn truncated_archive_deletes_nothing() {
        let mut fx = fixture();
        let text: String = (0..4000).map(|i| format!("line {}\n", i)).collect();
        fx.store.create_entry(&text, at(2024, 1, 5, 8, 0, 0)).unwrap();
        let archive = backup::run(&mut fx.store, &fx.entries, &fx.backups, at(2024, 1, 5, 9, 0, 0))
            .unwrap()
            .archive_path
            .unwrap();
        let bytes = fs::read(&archive).unwrap();
        let cut = fx.backups.join("diary_backup_20240105_100000.tar.gz");
        fs::write(&cut, &bytes[..bytes.len() / 2]).unwrap();

        assert!(run(&mut fx.store, &cut, &fx.entries, RestoreMode::Replace).is_err());
        assert_eq!(fx.store.list_entries().unwrap().len(), 1);
        assert_eq!(fx.store.index().last_backup(), Some("2024-01-05 09:00:00"));
    }
}
