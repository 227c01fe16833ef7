//! File naming and text formatting shared by the store and the archive engine.
//!
//! Entry identifiers double as file names and sort keys:
//!
//! ```text
//! entry_2024_01_05_08_00_01.txt
//! ```
//!
//! Every numeric field is zero-padded to a fixed width, so comparing two
//! identifiers as strings gives the same answer as comparing their timestamps.
//! Listing relies on this: newest first is a plain reverse lexical sort.
//!
//! Backup archives follow the same idea with a compact stamp:
//! `diary_backup_20240105_080001.tar.gz`.

use chrono::NaiveDateTime;

pub const ENTRY_PREFIX: &str = "entry_";
pub const BACKUP_PREFIX: &str = "diary_backup_";
pub const BACKUP_EXT: &str = ".tar.gz";

const ENTRY_STAMP_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";
const BACKUP_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const PREVIEW_LINES: usize = 3;
const PREVIEW_CHARS: usize = 100;
const SUMMARY_CHARS: usize = 50;

/// Normalizes an extension so it always starts with a dot.
pub fn normalize_ext(ext: &str) -> String {
    if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{}", ext)
    }
}

/// Builds the identifier (and file name) of an entry created at `timestamp`.
pub fn entry_identifier(timestamp: &NaiveDateTime, ext: &str) -> String {
    format!(
        "{}{}{}",
        ENTRY_PREFIX,
        timestamp.format(ENTRY_STAMP_FORMAT),
        normalize_ext(ext)
    )
}

/// Recovers the creation timestamp from an identifier.
///
/// Returns `None` unless the name has the entry prefix, the given extension and
/// a well-formed stamp in between.
pub fn parse_entry_identifier(name: &str, ext: &str) -> Option<NaiveDateTime> {
    let ext = normalize_ext(ext);
    let stamp = name.strip_prefix(ENTRY_PREFIX)?.strip_suffix(ext.as_str())?;
    // chrono accepts unpadded fields when parsing; the length check keeps the
    // lexical ordering guarantee honest for names we did not write ourselves.
    if stamp.len() != "0000_00_00_00_00_00".len() {
        return None;
    }
    NaiveDateTime::parse_from_str(stamp, ENTRY_STAMP_FORMAT).ok()
}

pub fn is_entry_name(name: &str, ext: &str) -> bool {
    parse_entry_identifier(name, ext).is_some()
}

pub fn backup_file_name(timestamp: &NaiveDateTime) -> String {
    format!(
        "{}{}{}",
        BACKUP_PREFIX,
        timestamp.format(BACKUP_STAMP_FORMAT),
        BACKUP_EXT
    )
}

pub fn is_backup_name(name: &str) -> bool {
    name.strip_prefix(BACKUP_PREFIX)
        .and_then(|rest| rest.strip_suffix(BACKUP_EXT))
        .is_some_and(|stamp| {
            stamp.len() == "00000000_000000".len()
                && NaiveDateTime::parse_from_str(stamp, BACKUP_STAMP_FORMAT).is_ok()
        })
}

/// Human readable timestamp, used for the last-backup marker.
pub fn display_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(DISPLAY_FORMAT).to_string()
}

/// Search preview: the first three lines, cut to 100 characters.
pub fn search_preview(content: &str) -> String {
    let head = content
        .lines()
        .take(PREVIEW_LINES)
        .collect::<Vec<_>>()
        .join("\n");
    truncate_chars(&head, PREVIEW_CHARS)
}

/// List summary: the first line, cut to 50 characters.
pub fn summary_line(content: &str) -> String {
    truncate_chars(content.lines().next().unwrap_or(""), SUMMARY_CHARS)
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
