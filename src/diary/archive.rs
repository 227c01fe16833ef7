//! # Archive Engine
//!
//! Snapshots a directory into a single `.tar.gz` file and unpacks one back.
//! The engine knows nothing about entries or the index; it works purely on
//! directory trees, so restoring never trusts any index that might be inside
//! an archive.
//!
//! Creation is best-effort: a file that cannot be read is logged, reported in
//! [`ArchiveOutcome::failures`] and left out, and the archive is still
//! completed. An archive is never overwritten, and an archive whose writing
//! failed is removed again. Restore is strict: the first I/O error aborts it,
//! and an archive member that would land outside the destination marks the
//! whole archive as malformed. [`verify_archive`] runs the same checks
//! without writing anything, so callers can refuse a bad archive before
//! touching live data.

use crate::error::{DiaryError, Result};
use crate::model::{ArchiveOutcome, RestoreOutcome, SweepFailure};
use crate::naming;
use chrono::NaiveDateTime;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, info, warn};

/// Archives every regular file under `source_dir` into
/// `dest_dir/diary_backup_<YYYYMMDD>_<HHMMSS>.tar.gz`.
///
/// Fails with `Conflict` if that archive already exists.
pub fn create_archive(
    source_dir: &Path,
    dest_dir: &Path,
    now: NaiveDateTime,
) -> Result<ArchiveOutcome> {
    if !source_dir.is_dir() {
        return Err(DiaryError::NotFound(source_dir.to_path_buf()));
    }
    fs::create_dir_all(dest_dir).map_err(DiaryError::Io)?;

    let path = dest_dir.join(naming::backup_file_name(&now));
    let mut failures = Vec::new();
    let mut files = Vec::new();
    collect_files(source_dir, &mut files, &mut failures);
    files.sort();

    let file = File::create_new(&path).map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => DiaryError::Conflict(path.display().to_string()),
        _ => DiaryError::Io(e),
    })?;
    let partial = PartialArchive::new(&path);
    let mut tar = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    let mut added = Vec::new();

    for abs in files {
        if abs == path || (dest_dir != source_dir && abs.starts_with(dest_dir)) {
            continue;
        }
        let outcome = member_name(source_dir, &abs)
            .and_then(|name| append_file(&mut tar, &abs, &name).map(|_| name));
        match outcome {
            Ok(name) => added.push(name),
            Err(error) => {
                warn!("Error adding file to backup {}: {}", abs.display(), error);
                failures.push(SweepFailure {
                    item: abs.display().to_string(),
                    error,
                });
            }
        }
    }

    let encoder = tar.into_inner().map_err(DiaryError::Io)?;
    let mut file = encoder.finish().map_err(DiaryError::Io)?;
    file.flush().map_err(DiaryError::Io)?;
    file.sync_all().map_err(DiaryError::Io)?;
    partial.keep();

    info!(
        "Created backup {} ({} files, {} skipped)",
        path.display(),
        added.len(),
        failures.len()
    );
    Ok(ArchiveOutcome {
        path,
        added,
        failures,
    })
}

/// Unpacks `archive_path` into `dest_dir`, overwriting files with the same
/// relative path. Files already in `dest_dir` that are not in the archive are
/// left alone.
pub fn restore_archive(archive_path: &Path, dest_dir: &Path) -> Result<RestoreOutcome> {
    if !archive_path.is_file() {
        return Err(DiaryError::NotFound(archive_path.to_path_buf()));
    }
    fs::create_dir_all(dest_dir).map_err(DiaryError::Io)?;

    let file = File::open(archive_path).map_err(DiaryError::Io)?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    let mut outcome = RestoreOutcome::default();

    for entry in archive.entries().map_err(DiaryError::Io)? {
        let mut entry = entry.map_err(DiaryError::Io)?;
        let rel = entry.path().map_err(DiaryError::Io)?.into_owned();
        let Some(rel) = sanitize_member(&rel)? else {
            continue;
        };
        let target = dest_dir.join(&rel);
        let kind = entry.header().entry_type();

        if kind.is_dir() {
            fs::create_dir_all(&target).map_err(DiaryError::Io)?;
        } else if kind.is_file() {
            // Members may arrive before (or without) their directory entry.
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(DiaryError::Io)?;
            }
            let mut out = File::create(&target).map_err(DiaryError::Io)?;
            io::copy(&mut entry, &mut out).map_err(DiaryError::Io)?;
            out.flush().map_err(DiaryError::Io)?;
            outcome.restored.push(rel);
        } else {
            debug!("Skipping archive member {} ({:?})", rel.display(), kind);
        }
    }

    info!(
        "Restored {} files from {} into {}",
        outcome.restored.len(),
        archive_path.display(),
        dest_dir.display()
    );
    Ok(outcome)
}

/// Reads `archive_path` end to end without writing anything.
///
/// Checks the gzip stream including its trailing checksum, the tar framing
/// and every member path. Returns the number of file members.
pub fn verify_archive(archive_path: &Path) -> Result<usize> {
    if !archive_path.is_file() {
        return Err(DiaryError::NotFound(archive_path.to_path_buf()));
    }

    let file = File::open(archive_path).map_err(DiaryError::Io)?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    let mut files = 0;

    for entry in archive.entries().map_err(DiaryError::Io)? {
        let mut entry = entry.map_err(DiaryError::Io)?;
        let rel = entry.path().map_err(DiaryError::Io)?.into_owned();
        sanitize_member(&rel)?;
        io::copy(&mut entry, &mut io::sink()).map_err(DiaryError::Io)?;
        if entry.header().entry_type().is_file() {
            files += 1;
        }
    }

    // tar stops at its end marker; the gzip trailer is only checked at EOF.
    let mut decoder = archive.into_inner();
    io::copy(&mut decoder, &mut io::sink()).map_err(DiaryError::Io)?;
    if decoder.header().is_none() {
        return Err(DiaryError::Validation(format!(
            "{} is not a gzip archive",
            archive_path.display()
        )));
    }

    debug!("Verified {} ({} files)", archive_path.display(), files);
    Ok(files)
}

/// Backup archives in `backups_dir`, oldest first.
pub fn list_archives(backups_dir: &Path) -> Result<Vec<PathBuf>> {
    if !backups_dir.exists() {
        return Ok(Vec::new());
    }

    let mut archives = Vec::new();
    for entry in fs::read_dir(backups_dir).map_err(DiaryError::Io)? {
        let path = entry.map_err(DiaryError::Io)?.path();
        let is_backup = path
            .file_name()
            .and_then(|s| s.to_str())
            .is_some_and(naming::is_backup_name);
        if is_backup && path.is_file() {
            archives.push(path);
        }
    }
    archives.sort();
    Ok(archives)
}

/// Removes an archive that was created but never finished.
struct PartialArchive<'a> {
    path: &'a Path,
    done: bool,
}

impl<'a> PartialArchive<'a> {
    fn new(path: &'a Path) -> Self {
        Self { path, done: false }
    }

    fn keep(mut self) {
        self.done = true;
    }
}

impl Drop for PartialArchive<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        match fs::remove_file(self.path) {
            Ok(()) => debug!("Removed unfinished archive {}", self.path.display()),
            Err(e) => warn!(
                "Could not remove unfinished archive {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>, failures: &mut Vec<SweepFailure>) {
    let read_dir = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) => {
            warn!("Error reading directory {}: {}", dir.display(), e);
            failures.push(SweepFailure {
                item: dir.display().to_string(),
                error: DiaryError::Io(e),
            });
            return;
        }
    };

    for entry in read_dir {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                failures.push(SweepFailure {
                    item: dir.display().to_string(),
                    error: DiaryError::Io(e),
                });
                continue;
            }
        };
        // file_type does not follow symlinks; only real files and dirs are archived
        match entry.file_type() {
            Ok(ft) if ft.is_dir() => collect_files(&entry.path(), files, failures),
            Ok(ft) if ft.is_file() => files.push(entry.path()),
            Ok(_) => debug!("Not archiving {}", entry.path().display()),
            Err(e) => failures.push(SweepFailure {
                item: entry.path().display().to_string(),
                error: DiaryError::Io(e),
            }),
        }
    }
}

/// Forward-slash path of `abs` relative to `root`.
fn member_name(root: &Path, abs: &Path) -> Result<String> {
    let rel = abs
        .strip_prefix(root)
        .map_err(|_| DiaryError::Validation(format!("{} is outside the source", abs.display())))?;

    let mut parts = Vec::new();
    for component in rel.components() {
        let part = component.as_os_str().to_str().ok_or_else(|| {
            DiaryError::Validation(format!("{} is not valid UTF-8", abs.display()))
        })?;
        parts.push(part);
    }
    Ok(parts.join("/"))
}

/// Reads the whole file before touching the archive, so a read failure can
/// never leave a half-written member behind.
fn append_file<W: Write>(tar: &mut tar::Builder<W>, abs: &Path, name: &str) -> Result<()> {
    let data = fs::read(abs).map_err(DiaryError::Io)?;
    let mtime = fs::metadata(abs)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(mtime);
    header.set_entry_type(tar::EntryType::Regular);

    tar.append_data(&mut header, name, data.as_slice())
        .map_err(DiaryError::Io)?;
    Ok(())
}

/// Keeps only plain path components. `None` for members that name the
/// destination itself (e.g. `./`).
fn sanitize_member(path: &Path) -> Result<Option<PathBuf>> {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(DiaryError::Validation(format!(
                    "archive member escapes destination: {}",
                    path.display()
                )));
            }
        }
    }
    Ok(if clean.as_os_str().is_empty() {
        None
    } else {
        Some(clean)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::entry_store::fixtures::at;
    use tempfile::TempDir;

    fn gz_tar(path: &Path) -> tar::Builder<GzEncoder<File>> {
        tar::Builder::new(GzEncoder::new(
            File::create(path).unwrap(),
            Compression::default(),
        ))
    }

    fn finish(tar: tar::Builder<GzEncoder<File>>) {
        tar.into_inner().unwrap().finish().unwrap();
    }

    fn raw_member(tar: &mut tar::Builder<GzEncoder<File>>, name: &str, data: &[u8]) {
        let mut header = tar::Header::new_gnu();
        let bytes = name.as_bytes();
        header.as_gnu_mut().unwrap().name[..bytes.len()].copy_from_slice(bytes);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        tar.append(&header, data).unwrap();
    }

    #[test]
    fn names_archive_after_timestamp() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::write(src.path().join("a.txt"), "a").unwrap();

        let outcome = create_archive(src.path(), dest.path(), at(2024, 1, 5, 9, 3, 7)).unwrap();

        assert_eq!(
            outcome.path,
            dest.path().join("diary_backup_20240105_090307.tar.gz")
        );
        assert_eq!(outcome.added, vec!["a.txt".to_string()]);
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn creates_missing_destination() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let nested = dest.path().join("deep").join("backups");

        let outcome = create_archive(src.path(), &nested, at(2024, 1, 5, 9, 0, 0)).unwrap();
        assert!(outcome.path.is_file());
        assert!(outcome.added.is_empty());
    }

    #[test]
    fn missing_source_is_not_found() {
        let dest = TempDir::new().unwrap();
        let missing = dest.path().join("nope");
        assert!(matches!(
            create_archive(&missing, dest.path(), at(2024, 1, 5, 9, 0, 0)).unwrap_err(),
            DiaryError::NotFound(_)
        ));

        let file = dest.path().join("plain.txt");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            create_archive(&file, dest.path(), at(2024, 1, 5, 9, 0, 0)).unwrap_err(),
            DiaryError::NotFound(_)
        ));
    }

    #[test]
    fn missing_archive_is_not_found() {
        let dest = TempDir::new().unwrap();
        assert!(matches!(
            restore_archive(&dest.path().join("gone.tar.gz"), dest.path()).unwrap_err(),
            DiaryError::NotFound(_)
        ));
    }

    #[test]
    fn restore_overwrites_and_keeps_unrelated_files() {
        let src = TempDir::new().unwrap();
        let backups = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::write(src.path().join("shared.txt"), "from archive").unwrap();

        let outcome = create_archive(src.path(), backups.path(), at(2024, 1, 5, 9, 0, 0)).unwrap();

        fs::write(dest.path().join("shared.txt"), "stale local copy that is longer").unwrap();
        fs::write(dest.path().join("local.txt"), "untouched").unwrap();

        let restored = restore_archive(&outcome.path, dest.path()).unwrap();

        assert_eq!(restored.restored, vec![PathBuf::from("shared.txt")]);
        assert_eq!(
            fs::read_to_string(dest.path().join("shared.txt")).unwrap(),
            "from archive"
        );
        assert_eq!(
            fs::read_to_string(dest.path().join("local.txt")).unwrap(),
            "untouched"
        );
    }

    #[test]
    fn restore_handles_files_before_directories() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("out-of-order.tar.gz");
        let mut tar = gz_tar(&archive);
        raw_member(&mut tar, "sub/inner/a.txt", b"nested first");
        let mut dir = tar::Header::new_gnu();
        dir.set_entry_type(tar::EntryType::Directory);
        dir.set_mode(0o755);
        dir.set_size(0);
        tar.append_data(&mut dir, "sub/", io::empty()).unwrap();
        tar.append_data(&mut dir, "empty/", io::empty()).unwrap();
        finish(tar);

        let dest = tmp.path().join("restore-here");
        let outcome = restore_archive(&archive, &dest).unwrap();

        assert_eq!(outcome.restored, vec![PathBuf::from("sub/inner/a.txt")]);
        assert_eq!(
            fs::read_to_string(dest.join("sub/inner/a.txt")).unwrap(),
            "nested first"
        );
        assert!(dest.join("empty").is_dir());
    }

    #[test]
    fn restore_rejects_escaping_members() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("evil.tar.gz");
        let mut tar = gz_tar(&archive);
        raw_member(&mut tar, "../evil.txt", b"nope");
        finish(tar);

        let dest = tmp.path().join("dest");
        assert!(matches!(
            restore_archive(&archive, &dest).unwrap_err(),
            DiaryError::Validation(_)
        ));
        assert!(!tmp.path().join("evil.txt").exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn create_skips_unnameable_files() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let src = TempDir::new().unwrap();
        let backups = TempDir::new().unwrap();
        fs::write(src.path().join("good.txt"), "good").unwrap();
        let bad = src.path().join(OsStr::from_bytes(b"bad-\xff.txt"));
        fs::write(&bad, "bad").unwrap();

        let outcome = create_archive(src.path(), backups.path(), at(2024, 1, 5, 9, 0, 0)).unwrap();

        assert_eq!(outcome.added, vec!["good.txt".to_string()]);
        assert_eq!(outcome.failures.len(), 1);

        let dest = TempDir::new().unwrap();
        let restored = restore_archive(&outcome.path, dest.path()).unwrap();
        assert_eq!(restored.restored, vec![PathBuf::from("good.txt")]);
    }

    #[test]
    fn lists_only_backup_archives_oldest_first() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("diary_backup_20240201_000000.tar.gz"), "").unwrap();
        fs::write(dir.path().join("diary_backup_20240101_000000.tar.gz"), "").unwrap();
        fs::write(dir.path().join("notes.tar.gz"), "").unwrap();
        fs::create_dir(dir.path().join("diary_backup_20240301_000000.tar.gz")).unwrap();

        let listed = list_archives(dir.path()).unwrap();
        assert_eq!(
            listed,
            vec![
                dir.path().join("diary_backup_20240101_000000.tar.gz"),
                dir.path().join("diary_backup_20240201_000000.tar.gz"),
            ]
        );
        assert!(list_archives(&dir.path().join("missing")).unwrap().is_empty());
    }

    #[test]
    fn sanitize_member_paths() {
        assert_eq!(
            sanitize_member(Path::new("./a/b.txt")).unwrap(),
            Some(PathBuf::from("a/b.txt"))
        );
        assert_eq!(sanitize_member(Path::new("./")).unwrap(), None);
        assert!(sanitize_member(Path::new("/etc/passwd")).is_err());
        assert!(sanitize_member(Path::new("a/../../b")).is_err());
    }

    #[test]
    fn existing_archive_is_never_overwritten() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::write(src.path().join("a.txt"), "a").unwrap();
        let first = create_archive(src.path(), dest.path(), at(2024, 1, 5, 9, 0, 0)).unwrap();
        let before = fs::read(&first.path).unwrap();

        fs::remove_file(src.path().join("a.txt")).unwrap();
        let err = create_archive(src.path(), dest.path(), at(2024, 1, 5, 9, 0, 0)).unwrap_err();

        assert!(matches!(err, DiaryError::Conflict(_)));
        assert_eq!(fs::read(&first.path).unwrap(), before);
        assert_eq!(verify_archive(&first.path).unwrap(), 1);
    }

    #[test]
    fn unfinished_archive_is_removed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("diary_backup_20240105_090000.tar.gz");

        fs::write(&path, b"half written").unwrap();
        drop(PartialArchive::new(&path));
        assert!(!path.exists());
        assert!(list_archives(dir.path()).unwrap().is_empty());

        fs::write(&path, b"complete").unwrap();
        PartialArchive::new(&path).keep();
        assert!(path.is_file());
    }

    #[test]
    fn verify_accepts_good_archives() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::write(src.path().join("a.txt"), "a").unwrap();
        fs::create_dir(src.path().join("sub")).unwrap();
        fs::write(src.path().join("sub/b.txt"), "b").unwrap();

        let outcome = create_archive(src.path(), dest.path(), at(2024, 1, 5, 9, 0, 0)).unwrap();
        assert_eq!(verify_archive(&outcome.path).unwrap(), 2);

        let empty = TempDir::new().unwrap();
        let outcome = create_archive(empty.path(), dest.path(), at(2024, 1, 5, 9, 0, 1)).unwrap();
        assert_eq!(verify_archive(&outcome.path).unwrap(), 0);
    }

    #[test]
    fn verify_rejects_damaged_archives() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let text: String = (0..4000).map(|i| format!("line {}\n", i)).collect();
        fs::write(src.path().join("long.txt"), text).unwrap();
        let good = create_archive(src.path(), dest.path(), at(2024, 1, 5, 9, 0, 0)).unwrap();
        let bytes = fs::read(&good.path).unwrap();

        let truncated = dest.path().join("truncated.tar.gz");
        fs::write(&truncated, &bytes[..bytes.len() / 2]).unwrap();
        assert!(verify_archive(&truncated).is_err());

        let garbage = dest.path().join("garbage.tar.gz");
        fs::write(&garbage, b"this is not a gzip stream").unwrap();
        assert!(verify_archive(&garbage).is_err());

        let empty = dest.path().join("empty.tar.gz");
        fs::write(&empty, b"").unwrap();
        assert!(verify_archive(&empty).is_err());

        let escaping = dest.path().join("evil.tar.gz");
        let mut tar = gz_tar(&escaping);
        raw_member(&mut tar, "../evil.txt", b"nope");
        finish(tar);
        assert!(matches!(
            verify_archive(&escaping).unwrap_err(),
            DiaryError::Validation(_)
        ));

        assert!(matches!(
            verify_archive(&dest.path().join("gone.tar.gz")).unwrap_err(),
            DiaryError::NotFound(_)
        ));
    }
}
