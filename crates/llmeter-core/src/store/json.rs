use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{ensure_finite, remove_log_files, upsert, RecordStore};
use crate::config::StoreConfig;
use crate::error::LlmeterError;
use crate::results::PersistedSummary;

/// Record store backed by a pretty-printed JSON array on disk.
///
/// Every operation reads the file afresh, so a reader sees records saved by
/// other processes sharing the data directory. Writes are not locked:
/// concurrent writers race and the last one to replace the file wins.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    records_file: PathBuf,
    log_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(records_file: impl Into<PathBuf>, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            records_file: records_file.into(),
            log_dir: log_dir.into(),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.records_file(), config.log_dir())
    }

    pub fn records_file(&self) -> &Path {
        &self.records_file
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    fn load(&self) -> Result<Vec<PersistedSummary>, LlmeterError> {
        let content = match fs::read_to_string(&self.records_file) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(LlmeterError::Storage(format!(
                    "failed to read {}: {e}",
                    self.records_file.display()
                )))
            }
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            LlmeterError::Storage(format!(
                "corrupt record file {}: {e}",
                self.records_file.display()
            ))
        })
    }

    /// Replace the record file via a temporary sibling and a rename.
    fn store(&self, records: &[PersistedSummary]) -> Result<(), LlmeterError> {
        let content = serde_json::to_string_pretty(records)?;
        let tmp = self.records_file.with_extension("json.tmp");

        let write = || -> std::io::Result<()> {
            if let Some(parent) = self.records_file.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&tmp, content.as_bytes())?;
            fs::rename(&tmp, &self.records_file)
        };
        write().map_err(|e| {
            tracing::error!(path = %self.records_file.display(), "failed to write records: {e}");
            LlmeterError::Storage(format!(
                "failed to write {}: {e}",
                self.records_file.display()
            ))
        })
    }
}

impl RecordStore for JsonFileStore {
    fn list_records(&self) -> Result<Vec<PersistedSummary>, LlmeterError> {
        let records = self.load()?;
        tracing::debug!(count = records.len(), "loaded test records");
        Ok(records)
    }

    fn save_record(&mut self, record: &PersistedSummary) -> Result<(), LlmeterError> {
        ensure_finite(record)?;
        let mut records = self.load()?;
        upsert(&mut records, record);
        self.store(&records)?;
        tracing::info!(
            task_id = %record.test_task_id,
            session = %record.session_name,
            "saved test record"
        );
        Ok(())
    }

    fn delete_record(&mut self, session_name: &str) -> Result<bool, LlmeterError> {
        let mut records = self.load()?;
        let before = records.len();
        records.retain(|r| r.session_name != session_name);
        if records.len() == before {
            tracing::warn!(session = session_name, "no test record to delete");
            return Ok(false);
        }
        self.store(&records)?;
        tracing::info!(session = session_name, "deleted test record");
        Ok(true)
    }

    fn clear_log_files(&mut self) -> Result<usize, LlmeterError> {
        remove_log_files(&self.log_dir)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::test_support::make_summary;

    fn make_store(dir: &Path) -> JsonFileStore {
        JsonFileStore::from_config(&StoreConfig::new(dir))
    }

    #[test]
    fn missing_file_lists_nothing() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let store = make_store(dir.path());
        assert!(store.list_records().expect("list").is_empty());
    }

    #[test]
    fn save_then_list_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let mut store = make_store(dir.path());
        let record = make_summary("test_20240309_140509", 3, 1);
        store.save_record(&record).expect("save should succeed");

        let records = store.list_records().expect("list should succeed");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].test_task_id, record.test_task_id);
        assert_eq!(records[0].total_tasks, 3);
        assert_eq!(records[0].successful_tasks, 2);
        assert_eq!(records[0].failed_tasks, 1);
        assert_eq!(records[0], record);
    }

    #[test]
    fn list_twice_without_mutation_is_identical() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let mut store = make_store(dir.path());
        for name in ["a", "b", "c"] {
            store.save_record(&make_summary(name, 5, 1)).expect("save");
        }
        let first = store.list_records().expect("list");
        let second = store.list_records().expect("list");
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn save_same_task_id_replaces() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let mut store = make_store(dir.path());
        store.save_record(&make_summary("a", 5, 1)).expect("save");
        store.save_record(&make_summary("a", 8, 0)).expect("save");
        let records = store.list_records().expect("list");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total_tasks, 8);
    }

    #[test]
    fn delete_nonexistent_session_reports_failure() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let mut store = make_store(dir.path());
        store.save_record(&make_summary("a", 5, 1)).expect("save");
        let deleted = store.delete_record("missing").expect("delete should not error");
        assert!(!deleted);
        assert_eq!(store.list_records().expect("list").len(), 1);
    }

    #[test]
    fn delete_existing_session_persists() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let mut store = make_store(dir.path());
        store.save_record(&make_summary("a", 5, 1)).expect("save");
        store.save_record(&make_summary("b", 5, 1)).expect("save");
        assert!(store.delete_record("a").expect("delete"));

        // A fresh handle sees the deletion.
        let reopened = make_store(dir.path());
        let records = reopened.list_records().expect("list");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].session_name, "b");
    }

    #[test]
    fn non_finite_record_is_rejected_and_store_stays_readable() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let mut store = make_store(dir.path());
        store.save_record(&make_summary("a", 5, 1)).expect("save");

        let mut bad = make_summary("b", 2, 0);
        bad.total_time = f64::INFINITY;
        bad.avg_response_time = f64::INFINITY;
        let err = store.save_record(&bad).unwrap_err();
        assert!(matches!(err, LlmeterError::Storage(_)));

        let records = store.list_records().expect("list should still succeed");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].test_task_id, "task-a");
        store.save_record(&make_summary("c", 1, 0)).expect("later saves work");
        assert!(store.delete_record("a").expect("delete"));
    }

    #[test]
    fn corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let store = make_store(dir.path());
        fs::write(store.records_file(), b"{ not json").expect("write corrupt file");
        let err = store.list_records().unwrap_err();
        assert!(matches!(err, LlmeterError::Storage(_)));
    }

    #[test]
    fn clear_log_files_keeps_records() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let mut store = make_store(dir.path());
        fs::create_dir_all(store.log_dir()).expect("create log dir");
        fs::write(store.log_dir().join("task-a.log"), "log").expect("write log");
        store.save_record(&make_summary("a", 5, 1)).expect("save");

        assert_eq!(store.clear_log_files().expect("clear"), 1);
        assert_eq!(store.list_records().expect("list").len(), 1);
        assert!(!store.log_dir().join("task-a.log").exists());
    }
}
