pub mod aggregator;
pub mod log;
pub mod recorder;

use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

pub use recorder::{spawn_recorder, OutcomeSender, RecorderHandle};

/// `strftime` pattern for generated session names.
pub const SESSION_NAME_FORMAT: &str = "test_%Y%m%d_%H%M%S";

/// Human-readable timestamp format used in logs and persisted summaries.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// TestOutcome
// ---------------------------------------------------------------------------

/// Terminal result of one request, as reported by the test runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TestOutcome {
    pub success: bool,
    /// Wall time of the request in seconds.
    #[serde(default)]
    pub duration_seconds: f64,
    #[serde(default)]
    pub token_count: u64,
    #[serde(default)]
    pub char_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl TestOutcome {
    pub fn success(duration_seconds: f64, token_count: u64, char_count: u64) -> Self {
        Self {
            success: true,
            duration_seconds,
            token_count,
            char_count,
            error_message: None,
        }
    }

    pub fn failure(error_message: impl Into<String>) -> Self {
        Self {
            success: false,
            duration_seconds: 0.0,
            token_count: 0,
            char_count: 0,
            error_message: Some(error_message.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// DatasetStats
// ---------------------------------------------------------------------------

/// Running aggregate for one dataset within a session.
///
/// `total == successful + failed` holds after every update. Timing, token and
/// character sums only include successful outcomes.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStats {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub total_time_seconds: f64,
    pub total_tokens: u64,
    pub total_chars: u64,
    pub start_time: DateTime<Local>,
}

impl DatasetStats {
    pub fn new(start_time: DateTime<Local>) -> Self {
        Self {
            total: 0,
            successful: 0,
            failed: 0,
            total_time_seconds: 0.0,
            total_tokens: 0,
            total_chars: 0,
            start_time,
        }
    }

    pub(crate) fn record(&mut self, outcome: &TestOutcome) {
        self.total += 1;
        if outcome.success {
            self.successful += 1;
            self.total_time_seconds =
                saturating_add(self.total_time_seconds, outcome.duration_seconds);
            self.total_tokens += outcome.token_count;
            self.total_chars += outcome.char_count;
        } else {
            self.failed += 1;
        }
    }

    /// Success rate in percent; 0 for an empty dataset.
    pub fn success_rate(&self) -> f64 {
        ratio(self.successful as f64 * 100.0, self.total as f64)
    }

    pub fn avg_response_time(&self) -> f64 {
        ratio(self.total_time_seconds, self.successful as f64)
    }

    /// Characters generated per second of successful request time.
    pub fn avg_generation_speed(&self) -> f64 {
        ratio(self.total_chars as f64, self.total_time_seconds)
    }
}

// ---------------------------------------------------------------------------
// DatasetError
// ---------------------------------------------------------------------------

/// A failure message reported for a dataset, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatasetError {
    pub dataset: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// SessionTotals
// ---------------------------------------------------------------------------

/// Counters summed across every dataset of a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionTotals {
    pub total_tasks: u64,
    pub successful_tasks: u64,
    pub failed_tasks: u64,
    pub total_time: f64,
    pub total_tokens: u64,
    pub total_chars: u64,
}

impl SessionTotals {
    pub fn from_datasets<'a>(datasets: impl IntoIterator<Item = &'a DatasetStats>) -> Self {
        datasets
            .into_iter()
            .fold(Self::default(), |mut acc, stats| {
                acc.total_tasks += stats.total;
                acc.successful_tasks += stats.successful;
                acc.failed_tasks += stats.failed;
                acc.total_time = saturating_add(acc.total_time, stats.total_time_seconds);
                acc.total_tokens += stats.total_tokens;
                acc.total_chars += stats.total_chars;
                acc
            })
    }

    /// Mean seconds per successful request.
    pub fn avg_response_time(&self) -> f64 {
        ratio(self.total_time, self.successful_tasks as f64)
    }

    pub fn avg_generation_speed(&self) -> f64 {
        ratio(self.total_chars as f64, self.total_time)
    }

    pub fn avg_tps(&self) -> f64 {
        ratio(self.total_tokens as f64, self.total_time)
    }
}

/// `numerator / denominator`, or 0 when the denominator is not positive or
/// the quotient is not finite.
pub(crate) fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        let q = numerator / denominator;
        if q.is_finite() {
            return q;
        }
    }
    0.0
}

/// Add a duration to a running sum. Negative and non-finite durations count
/// as 0, and the sum saturates at `f64::MAX`.
fn saturating_add(sum: f64, seconds: f64) -> f64 {
    let seconds = if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    };
    (sum + seconds).min(f64::MAX)
}

// ---------------------------------------------------------------------------
// SessionRecord
// ---------------------------------------------------------------------------

/// One complete load-test run, owned by the caller while results arrive.
///
/// Created by [`SessionRecord::start`], fed by
/// [`SessionRecord::record_outcome`] and reduced to a
/// [`crate::results::PersistedSummary`] by [`SessionRecord::finalize`].
/// Operations live in [`aggregator`].
#[derive(Debug, Clone)]
pub struct SessionRecord {
    session_name: String,
    model_name: String,
    concurrency: u32,
    test_task_id: String,
    start_time: DateTime<Local>,
    end_time: Option<DateTime<Local>>,
    datasets: BTreeMap<String, DatasetStats>,
    errors: Vec<DatasetError>,
}

impl SessionRecord {
    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn concurrency(&self) -> u32 {
        self.concurrency
    }

    pub fn test_task_id(&self) -> &str {
        &self.test_task_id
    }

    pub fn start_time(&self) -> DateTime<Local> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Local>> {
        self.end_time
    }

    /// Per-dataset statistics, ordered by dataset name.
    pub fn datasets(&self) -> &BTreeMap<String, DatasetStats> {
        &self.datasets
    }

    pub fn dataset(&self, name: &str) -> Option<&DatasetStats> {
        self.datasets.get(name)
    }

    /// Failure messages as `(dataset, message)` pairs in arrival order.
    pub fn errors(&self) -> &[DatasetError] {
        &self.errors
    }

    /// Live totals across all datasets recorded so far.
    pub fn totals(&self) -> SessionTotals {
        SessionTotals::from_datasets(self.datasets.values())
    }
}
