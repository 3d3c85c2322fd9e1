use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{SessionRecord, TIMESTAMP_FORMAT};
use crate::error::LlmeterError;

/// Render the human-readable session log.
pub fn render_log(session: &SessionRecord) -> String {
    let mut out = String::new();

    // `fmt::Write` for `String` never fails.
    let _ = writeln!(out, "测试ID: {}", session.test_task_id());
    let _ = writeln!(out, "会话名称: {}", session.session_name());
    let _ = writeln!(out, "模型名称: {}", session.model_name());
    let _ = writeln!(out, "并发数: {}", session.concurrency());
    let _ = writeln!(
        out,
        "开始时间: {}",
        session.start_time().format(TIMESTAMP_FORMAT)
    );
    if let Some(end_time) = session.end_time() {
        let duration_secs =
            (end_time - session.start_time()).num_milliseconds() as f64 / 1000.0;
        let _ = writeln!(out, "结束时间: {}", end_time.format(TIMESTAMP_FORMAT));
        let _ = writeln!(out, "总耗时: {duration_secs:.2}秒");
    }

    out.push_str("\n数据集统计信息:\n");
    for (name, stats) in session.datasets() {
        let _ = writeln!(out, "\n{name}:");
        let _ = writeln!(out, "  总任务数: {}", stats.total);
        let _ = writeln!(out, "  成功数: {}", stats.successful);
        let _ = writeln!(out, "  失败数: {}", stats.failed);
        if stats.successful > 0 {
            let _ = writeln!(out, "  成功率: {:.1}%", stats.success_rate());
            let _ = writeln!(out, "  平均响应时间: {:.2}秒", stats.avg_response_time());
            let _ = writeln!(out, "  平均生成速度: {:.1}字/秒", stats.avg_generation_speed());
            let _ = writeln!(out, "  总字符数: {}", stats.total_chars);
        }
    }

    out
}

/// Path of the log file for `test_task_id` inside `log_dir`.
pub fn log_path(log_dir: &Path, test_task_id: &str) -> PathBuf {
    log_dir.join(format!("{test_task_id}.log"))
}

/// Write the session log to `<log_dir>/<test_task_id>.log`, creating the
/// directory if needed, and return the file path.
///
/// The file handle is closed before returning on every path.
pub fn write_log(session: &SessionRecord, log_dir: &Path) -> Result<PathBuf, LlmeterError> {
    fs::create_dir_all(log_dir)?;
    let path = log_path(log_dir, session.test_task_id());
    tracing::info!(path = %path.display(), "writing session log");

    let mut writer = BufWriter::new(File::create(&path)?);
    writer.write_all(render_log(session).as_bytes())?;
    writer.flush()?;

    Ok(path)
}

/// Read a session log for display.
///
/// An empty path or a missing file is reported as `NotFound`.
pub fn read_log(path: &Path) -> Result<String, LlmeterError> {
    if path.as_os_str().is_empty() {
        tracing::warn!("log file path is empty");
        return Err(LlmeterError::NotFound("no log file recorded".to_string()));
    }
    if !path.exists() {
        tracing::warn!(path = %path.display(), "log file does not exist");
        return Err(LlmeterError::NotFound(format!(
            "log file does not exist: {}",
            path.display()
        )));
    }

    let content = fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), chars = content.chars().count(), "read log file");
    Ok(content)
}
