use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Local};

use super::{
    log, DatasetError, DatasetStats, SessionRecord, TestOutcome, SESSION_NAME_FORMAT,
    TIMESTAMP_FORMAT,
};
use crate::error::LlmeterError;
use crate::results::PersistedSummary;

impl SessionRecord {
    /// Begin a new session stamped with the current local time.
    pub fn start(
        model_name: impl Into<String>,
        concurrency: i64,
        test_task_id: impl Into<String>,
    ) -> Result<Self, LlmeterError> {
        Self::start_at(model_name, concurrency, test_task_id, Local::now())
    }

    /// Begin a new session with an explicit start time.
    ///
    /// Parameters are validated before anything is built, so a rejected
    /// configuration leaves no state behind.
    pub fn start_at(
        model_name: impl Into<String>,
        concurrency: i64,
        test_task_id: impl Into<String>,
        started_at: DateTime<Local>,
    ) -> Result<Self, LlmeterError> {
        let model_name = model_name.into();
        if model_name.trim().is_empty() {
            return Err(LlmeterError::InvalidConfig(
                "model name must not be empty".to_string(),
            ));
        }
        let concurrency = u32::try_from(concurrency)
            .ok()
            .filter(|&c| c > 0)
            .ok_or_else(|| {
                LlmeterError::InvalidConfig(format!(
                    "concurrency must be a positive integer, got {concurrency}"
                ))
            })?;

        let test_task_id = test_task_id.into();
        validate_task_id(&test_task_id)?;

        let session_name = started_at.format(SESSION_NAME_FORMAT).to_string();
        tracing::info!(
            session = %session_name,
            model = %model_name,
            concurrency,
            task_id = %test_task_id,
            "starting test session"
        );

        Ok(Self {
            session_name,
            model_name,
            concurrency,
            test_task_id,
            start_time: started_at,
            end_time: None,
            datasets: BTreeMap::new(),
            errors: Vec::new(),
        })
    }

    /// Fold one completed request into the statistics of `dataset_name`.
    ///
    /// Unseen datasets are created on first use with zeroed counters.
    pub fn record_outcome(&mut self, dataset_name: &str, outcome: TestOutcome) {
        let stats = self
            .datasets
            .entry(dataset_name.to_string())
            .or_insert_with(|| DatasetStats::new(Local::now()));
        stats.record(&outcome);

        if !outcome.success {
            if let Some(message) = outcome.error_message {
                self.errors.push(DatasetError {
                    dataset: dataset_name.to_string(),
                    message,
                });
            }
        }

        tracing::debug!(dataset = dataset_name, success = outcome.success, "recorded outcome");
    }

    /// Close the session: write its log file under `log_dir` and reduce all
    /// datasets into a [`PersistedSummary`].
    ///
    /// Every call writes the log again; call it once per session. On I/O
    /// failure the error is returned and the session is left intact so the
    /// caller can retry.
    pub fn finalize(
        &mut self,
        end_time: DateTime<Local>,
        log_dir: &Path,
    ) -> Result<PersistedSummary, LlmeterError> {
        self.end_time = Some(end_time);

        let log_file = log::write_log(self, log_dir).inspect_err(|e| {
            tracing::error!(session = %self.session_name, "failed to write session log: {e}");
        })?;

        let totals = self.totals();
        let avg_generation_speed = totals.avg_generation_speed();
        let summary = PersistedSummary {
            test_task_id: self.test_task_id.clone(),
            session_name: self.session_name.clone(),
            model_name: self.model_name.clone(),
            concurrency: self.concurrency,
            total_tasks: totals.total_tasks,
            successful_tasks: totals.successful_tasks,
            failed_tasks: totals.failed_tasks,
            avg_response_time: totals.avg_response_time(),
            avg_generation_speed,
            total_chars: totals.total_chars,
            total_tokens: totals.total_tokens,
            avg_tps: totals.avg_tps(),
            total_time: totals.total_time,
            current_speed: avg_generation_speed,
            test_time: end_time.format(TIMESTAMP_FORMAT).to_string(),
            log_file,
        };

        tracing::info!(
            session = %summary.session_name,
            total = summary.total_tasks,
            successful = summary.successful_tasks,
            failed = summary.failed_tasks,
            "finalized test session"
        );
        Ok(summary)
    }
}

/// The task id names the session log file, so it must be a plain file stem.
fn validate_task_id(test_task_id: &str) -> Result<(), LlmeterError> {
    if test_task_id.trim().is_empty() {
        return Err(LlmeterError::InvalidConfig(
            "test task id must not be empty".to_string(),
        ));
    }
    if test_task_id.contains(&['/', '\\', '\0'][..]) || test_task_id.contains("..") {
        return Err(LlmeterError::InvalidConfig(format!(
            "test task id '{test_task_id}' must not contain path separators or '..'"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
