pub mod export;
pub mod table;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use table::{render_table, sort_summaries, SortKey, SortOrder, TableRow};

/// Flattened, persisted result of one finalized test session.
///
/// Times are in seconds, speeds in characters per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PersistedSummary {
    pub test_task_id: String,
    pub session_name: String,
    pub model_name: String,
    pub concurrency: u32,
    pub total_tasks: u64,
    pub successful_tasks: u64,
    pub failed_tasks: u64,
    /// Mean seconds per successful request.
    pub avg_response_time: f64,
    pub avg_generation_speed: f64,
    pub total_chars: u64,
    pub total_tokens: u64,
    /// Tokens per second of successful request time.
    pub avg_tps: f64,
    /// Sum of successful request durations.
    pub total_time: f64,
    pub current_speed: f64,
    /// Local time of finalization, `YYYY-MM-DD HH:MM:SS`.
    pub test_time: String,
    /// Session log written at finalize time.
    #[serde(default)]
    pub log_file: PathBuf,
}

impl PersistedSummary {
    /// Success rate in percent; 0 when no tasks ran.
    pub fn success_rate(&self) -> f64 {
        crate::session::ratio(
            self.successful_tasks as f64 * 100.0,
            self.total_tasks as f64,
        )
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Build a summary with the given name and counters for tests.
    pub fn make_summary(session_name: &str, total: u64, failed: u64) -> PersistedSummary {
        let successful = total.saturating_sub(failed);
        let total_time = successful as f64 * 1.5;
        PersistedSummary {
            test_task_id: format!("task-{session_name}"),
            session_name: session_name.to_string(),
            model_name: "gpt-x".to_string(),
            concurrency: 4,
            total_tasks: total,
            successful_tasks: successful,
            failed_tasks: failed,
            avg_response_time: if successful > 0 { 1.5 } else { 0.0 },
            avg_generation_speed: if successful > 0 { 100.0 } else { 0.0 },
            total_chars: (total_time * 100.0) as u64,
            total_tokens: (total_time * 10.0) as u64,
            avg_tps: if successful > 0 { 10.0 } else { 0.0 },
            total_time,
            current_speed: if successful > 0 { 100.0 } else { 0.0 },
            test_time: "2024-03-09 14:06:00".to_string(),
            log_file: PathBuf::from(format!("/tmp/task-{session_name}.log")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::make_summary;

    #[test]
    fn success_rate_percent() {
        let summary = make_summary("s", 200, 50);
        assert!((summary.success_rate() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn success_rate_zero_tasks_is_zero() {
        let summary = make_summary("s", 0, 0);
        assert_eq!(summary.success_rate(), 0.0);
    }

    #[test]
    fn serializes_with_snake_case_keys() {
        let summary = make_summary("s", 3, 1);
        let json = serde_json::to_value(&summary).expect("serialize should succeed");
        for key in [
            "test_task_id",
            "session_name",
            "avg_response_time",
            "avg_generation_speed",
            "avg_tps",
            "current_speed",
            "test_time",
            "log_file",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
    }
}
