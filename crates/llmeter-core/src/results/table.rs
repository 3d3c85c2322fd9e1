use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::PersistedSummary;
use crate::error::LlmeterError;

/// Column headers of the results table, in display order.
pub const TABLE_HEADERS: [&str; 11] = [
    "会话名称",
    "完成/总数",
    "成功率",
    "平均响应时间",
    "平均生成速度",
    "当前速度",
    "总字符数",
    "平均TPS",
    "总耗时",
    "模型名称",
    "并发数",
];

// ---------------------------------------------------------------------------
// TableRow
// ---------------------------------------------------------------------------

/// Display strings for one session row of the results table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TableRow {
    pub session_name: String,
    pub completion: String,
    pub success_rate: String,
    pub avg_response_time: String,
    pub avg_generation_speed: String,
    pub current_speed: String,
    pub total_chars: String,
    pub avg_tps: String,
    pub total_time: String,
    pub model_name: String,
    pub concurrency: String,
}

impl TableRow {
    pub fn from_summary(s: &PersistedSummary) -> Self {
        Self {
            session_name: s.session_name.clone(),
            completion: format!("{}/{}", s.successful_tasks, s.total_tasks),
            success_rate: format!("{:.1}%", s.success_rate()),
            avg_response_time: format!("{:.1}s", s.avg_response_time),
            avg_generation_speed: format!("{:.1}字/秒", s.avg_generation_speed),
            current_speed: format!("{:.1}字/秒", s.current_speed),
            total_chars: s.total_chars.to_string(),
            avg_tps: format!("{:.1}", s.avg_tps),
            total_time: format!("{:.1}s", s.total_time),
            model_name: s.model_name.clone(),
            concurrency: s.concurrency.to_string(),
        }
    }

    fn cells(&self) -> [&str; 11] {
        [
            self.session_name.as_str(),
            self.completion.as_str(),
            self.success_rate.as_str(),
            self.avg_response_time.as_str(),
            self.avg_generation_speed.as_str(),
            self.current_speed.as_str(),
            self.total_chars.as_str(),
            self.avg_tps.as_str(),
            self.total_time.as_str(),
            self.model_name.as_str(),
            self.concurrency.as_str(),
        ]
    }
}

/// Render rows as a plain-text table with a header line.
///
/// Columns are padded by character count and separated by two spaces.
pub fn render_table(rows: &[TableRow]) -> String {
    let mut widths = TABLE_HEADERS.map(|h| h.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, TABLE_HEADERS, &widths);
    for row in rows {
        push_line(&mut out, row.cells(), &widths);
    }
    out
}

fn push_line(out: &mut String, cells: [&str; 11], widths: &[usize; 11]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

/// Column to sort the results table by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    SessionName,
    Completion,
    SuccessRate,
    AvgResponseTime,
    AvgGenerationSpeed,
    CurrentSpeed,
    TotalChars,
    AvgTps,
    TotalTime,
    ModelName,
    Concurrency,
    /// Finalization time; the default ordering.
    #[default]
    TestTime,
}

impl SortKey {
    pub const ALL: [SortKey; 12] = [
        SortKey::SessionName,
        SortKey::Completion,
        SortKey::SuccessRate,
        SortKey::AvgResponseTime,
        SortKey::AvgGenerationSpeed,
        SortKey::CurrentSpeed,
        SortKey::TotalChars,
        SortKey::AvgTps,
        SortKey::TotalTime,
        SortKey::ModelName,
        SortKey::Concurrency,
        SortKey::TestTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::SessionName => "session_name",
            SortKey::Completion => "completion",
            SortKey::SuccessRate => "success_rate",
            SortKey::AvgResponseTime => "avg_response_time",
            SortKey::AvgGenerationSpeed => "avg_generation_speed",
            SortKey::CurrentSpeed => "current_speed",
            SortKey::TotalChars => "total_chars",
            SortKey::AvgTps => "avg_tps",
            SortKey::TotalTime => "total_time",
            SortKey::ModelName => "model_name",
            SortKey::Concurrency => "concurrency",
            SortKey::TestTime => "test_time",
        }
    }

    fn compare(&self, a: &PersistedSummary, b: &PersistedSummary) -> Ordering {
        match self {
            SortKey::SessionName => a.session_name.cmp(&b.session_name),
            // Completed count first, then the size of the run.
            SortKey::Completion => (a.successful_tasks, a.total_tasks)
                .cmp(&(b.successful_tasks, b.total_tasks)),
            SortKey::SuccessRate => a.success_rate().total_cmp(&b.success_rate()),
            SortKey::AvgResponseTime => a.avg_response_time.total_cmp(&b.avg_response_time),
            SortKey::AvgGenerationSpeed => {
                a.avg_generation_speed.total_cmp(&b.avg_generation_speed)
            }
            SortKey::CurrentSpeed => a.current_speed.total_cmp(&b.current_speed),
            SortKey::TotalChars => a.total_chars.cmp(&b.total_chars),
            SortKey::AvgTps => a.avg_tps.total_cmp(&b.avg_tps),
            SortKey::TotalTime => a.total_time.total_cmp(&b.total_time),
            SortKey::ModelName => a.model_name.cmp(&b.model_name),
            SortKey::Concurrency => a.concurrency.cmp(&b.concurrency),
            SortKey::TestTime => a.test_time.cmp(&b.test_time),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = LlmeterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str() == wanted)
            .ok_or_else(|| {
                let known = SortKey::ALL.map(|k| k.as_str()).join(", ");
                LlmeterError::InvalidConfig(format!(
                    "unknown sort column '{s}' (expected one of: {known})"
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Stable in-place sort of summaries by `key`.
pub fn sort_summaries(records: &mut [PersistedSummary], key: SortKey, order: SortOrder) {
    records.sort_by(|a, b| {
        let ord = key.compare(a, b);
        match order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    });
}
