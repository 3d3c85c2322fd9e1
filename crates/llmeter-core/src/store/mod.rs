pub mod json;
pub mod memory;

use std::fs;
use std::path::Path;

use crate::error::LlmeterError;
use crate::results::PersistedSummary;

pub use json::JsonFileStore;
pub use memory::MemoryStore;

/// Persistence for finalized session summaries and their log files.
pub trait RecordStore {
    /// All stored records in insertion order.
    fn list_records(&self) -> Result<Vec<PersistedSummary>, LlmeterError>;

    /// Store a record, replacing any existing record with the same
    /// `test_task_id`. Records with non-finite metrics are rejected.
    fn save_record(&mut self, record: &PersistedSummary) -> Result<(), LlmeterError>;

    /// Delete every record named `session_name`.
    ///
    /// Returns `Ok(false)` when no record matched.
    fn delete_record(&mut self, session_name: &str) -> Result<bool, LlmeterError>;

    /// Remove all session log files, keeping the records. Returns the number
    /// of files removed.
    fn clear_log_files(&mut self) -> Result<usize, LlmeterError>;
}

/// Reject records whose float metrics cannot be represented in JSON.
pub(crate) fn ensure_finite(record: &PersistedSummary) -> Result<(), LlmeterError> {
    let fields = [
        ("avg_response_time", record.avg_response_time),
        ("avg_generation_speed", record.avg_generation_speed),
        ("avg_tps", record.avg_tps),
        ("total_time", record.total_time),
        ("current_speed", record.current_speed),
    ];
    match fields.iter().find(|(_, value)| !value.is_finite()) {
        Some((name, value)) => Err(LlmeterError::Storage(format!(
            "record {} has non-finite {name} ({value})",
            record.test_task_id
        ))),
        None => Ok(()),
    }
}

/// Insert or replace `record` keyed by `test_task_id`.
pub(crate) fn upsert(records: &mut Vec<PersistedSummary>, record: &PersistedSummary) {
    match records
        .iter_mut()
        .find(|r| r.test_task_id == record.test_task_id)
    {
        Some(existing) => *existing = record.clone(),
        None => records.push(record.clone()),
    }
}

/// Delete `*.log` files directly inside `log_dir`. A missing directory holds
/// no logs.
pub(crate) fn remove_log_files(log_dir: &Path) -> Result<usize, LlmeterError> {
    let entries = match fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut removed = 0;
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "log") {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    tracing::info!(dir = %log_dir.display(), removed, "cleared session log files");
    Ok(removed)
}
