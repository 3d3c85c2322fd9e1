use std::io;
use std::path::Path;

use super::PersistedSummary;
use crate::error::LlmeterError;

/// CSV header row for exported session records.
pub const CSV_HEADERS: [&str; 11] = [
    "测试时间",
    "模型名称",
    "并发数",
    "总任务数",
    "成功任务数",
    "失败任务数",
    "平均响应时间(ms)",
    "平均生成速度(字符/秒)",
    "总Token数",
    "平均TPS",
    "总耗时(ms)",
];

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

/// Export session records as CSV: a header row and one row per record.
///
/// Times are stored in seconds and written in milliseconds to match the
/// column headers. Floats are written unrounded.
pub fn export_csv(records: &[PersistedSummary]) -> Result<String, LlmeterError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    write_rows(&mut writer, records)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| LlmeterError::Io(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| LlmeterError::Internal(format!("CSV output is not UTF-8: {e}")))
}

/// Export session records as CSV straight to `path`.
pub fn write_csv(records: &[PersistedSummary], path: &Path) -> Result<(), LlmeterError> {
    let mut writer = csv::Writer::from_path(path)?;
    write_rows(&mut writer, records)?;
    writer.flush()?;
    tracing::info!(path = %path.display(), count = records.len(), "exported records as CSV");
    Ok(())
}

fn write_rows<W: io::Write>(
    writer: &mut csv::Writer<W>,
    records: &[PersistedSummary],
) -> Result<(), LlmeterError> {
    writer.write_record(CSV_HEADERS)?;
    for r in records {
        writer.write_record([
            r.test_time.clone(),
            r.model_name.clone(),
            r.concurrency.to_string(),
            r.total_tasks.to_string(),
            r.successful_tasks.to_string(),
            r.failed_tasks.to_string(),
            (r.avg_response_time * 1000.0).to_string(),
            r.avg_generation_speed.to_string(),
            r.total_tokens.to_string(),
            r.avg_tps.to_string(),
            (r.total_time * 1000.0).to_string(),
        ])?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON export
// ---------------------------------------------------------------------------

/// Export session records as pretty-printed JSON.
pub fn export_json(records: &[PersistedSummary]) -> Result<String, LlmeterError> {
    Ok(serde_json::to_string_pretty(records)?)
}
