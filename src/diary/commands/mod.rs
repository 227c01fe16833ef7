//! Workflows that span the entry store and the archive engine.
//!
//! Each command takes the pieces it needs as arguments and returns a
//! [`CmdResult`]: structured data plus leveled messages for the shell to show.
//! Nothing here prints.

use crate::model::SweepFailure;
use std::path::PathBuf;

pub mod backup;
pub mod doctor;
pub mod restore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    /// Archive written by a backup or read by a restore.
    pub archive_path: Option<PathBuf>,
    /// Entry identifiers the command touched.
    pub entries: Vec<String>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_archive_path(mut self, path: PathBuf) -> Self {
        self.archive_path = Some(path);
        self
    }

    pub fn with_entries(mut self, entries: Vec<String>) -> Self {
        self.entries = entries;
        self
    }

    pub fn has_warnings(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.level == MessageLevel::Warning)
    }

    pub(crate) fn add_failures(&mut self, action: &str, failures: &[SweepFailure]) {
        for failure in failures {
            self.add_message(CmdMessage::warning(format!(
                "Could not {} {}: {}",
                action, failure.item, failure.error
            )));
        }
    }
}
