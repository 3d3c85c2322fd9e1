use std::path::PathBuf;

use super::{ensure_finite, remove_log_files, upsert, RecordStore};
use crate::error::LlmeterError;
use crate::results::PersistedSummary;

/// Record store kept entirely in memory. Log files still live on disk in
/// `log_dir`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<PersistedSummary>,
    log_dir: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose `clear_log_files` cleans `log_dir`.
    pub fn with_log_dir(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            records: Vec::new(),
            log_dir: Some(log_dir.into()),
        }
    }
}

impl RecordStore for MemoryStore {
    fn list_records(&self) -> Result<Vec<PersistedSummary>, LlmeterError> {
        Ok(self.records.clone())
    }

    fn save_record(&mut self, record: &PersistedSummary) -> Result<(), LlmeterError> {
        ensure_finite(record)?;
        upsert(&mut self.records, record);
        Ok(())
    }

    fn delete_record(&mut self, session_name: &str) -> Result<bool, LlmeterError> {
        let before = self.records.len();
        self.records.retain(|r| r.session_name != session_name);
        Ok(self.records.len() != before)
    }

    fn clear_log_files(&mut self) -> Result<usize, LlmeterError> {
        match &self.log_dir {
            Some(dir) => remove_log_files(dir),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::test_support::make_summary;

    #[test]
    fn save_then_list() {
        let mut store = MemoryStore::new();
        store.save_record(&make_summary("a", 3, 1)).expect("save");
        let records = store.list_records().expect("list");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].test_task_id, "task-a");
    }

    #[test]
    fn delete_missing_session_reports_false() {
        let mut store = MemoryStore::new();
        store.save_record(&make_summary("a", 3, 1)).expect("save");
        assert!(!store.delete_record("ghost").expect("delete should not error"));
        assert_eq!(store.list_records().expect("list").len(), 1);
    }

    #[test]
    fn delete_existing_session() {
        let mut store = MemoryStore::new();
        store.save_record(&make_summary("a", 3, 1)).expect("save");
        store.save_record(&make_summary("b", 3, 1)).expect("save");
        assert!(store.delete_record("a").expect("delete"));
        let names: Vec<String> = store
            .list_records()
            .expect("list")
            .into_iter()
            .map(|r| r.session_name)
            .collect();
        assert_eq!(names, ["b"]);
    }

    #[test]
    fn clear_logs_without_dir_is_noop() {
        let mut store = MemoryStore::new();
        assert_eq!(store.clear_log_files().expect("clear"), 0);
    }
}
