use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::store::{EntryStore, StorageBackend};

pub fn run<B: StorageBackend>(store: &mut EntryStore<B>) -> Result<CmdResult> {
    let report = store.rebuild_index()?;
    store.save_index()?;
    let mut result = CmdResult::default().with_entries(report.recovered.clone());

    if report.is_clean() {
        result.add_message(CmdMessage::success("No inconsistencies found."));
    } else {
        result.add_message(CmdMessage::warning("Inconsistencies found and fixed:"));
        if !report.dropped.is_empty() {
            result.add_message(CmdMessage::info(format!(
                "  - Removed {} entry(s) listed in the index but missing from disk.",
                report.dropped.len()
            )));
        }
        if !report.recovered.is_empty() {
            result.add_message(CmdMessage::success(format!(
                "  - Recovered {} entry(s) found on disk but missing from the index.",
                report.recovered.len()
            )));
        }
    }

    Ok(result)
}
