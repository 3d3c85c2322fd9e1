use std::io::Write;
use std::path::Path;

use chrono::Local;
use llmeter_core::config::StoreConfig;
use llmeter_core::results::export::{export_json, write_csv};
use llmeter_core::results::{
    render_table, sort_summaries, PersistedSummary, SortKey, SortOrder, TableRow,
};
use llmeter_core::session::log::read_log;
use llmeter_core::session::SessionRecord;
use llmeter_core::store::{JsonFileStore, RecordStore};
use llmeter_core::LlmeterError;
use tokio::io::BufReader;
use uuid::Uuid;

use crate::cli::{Cli, Command, ExportFormat};
use crate::ingest::ingest_outcomes;

/// Dispatch a parsed command line, writing command output to `out`.
pub async fn run(cli: Cli, out: &mut impl Write) -> Result<(), LlmeterError> {
    let config = StoreConfig::new(cli.data_dir);
    let mut store = JsonFileStore::from_config(&config);

    match cli.command {
        Command::Ingest {
            model,
            concurrency,
            task_id,
            input,
        } => {
            let task_id = task_id.unwrap_or_else(|| Uuid::new_v4().to_string());
            let session = SessionRecord::start(model, concurrency, task_id)?;
            let session = match input {
                Some(path) => {
                    let file = tokio::fs::File::open(&path).await?;
                    ingest_outcomes(BufReader::new(file), session).await?
                }
                None => ingest_outcomes(BufReader::new(tokio::io::stdin()), session).await?,
            };
            finish_session(session, &config, &mut store, out)
        }
        Command::List { sort, desc } => {
            let order = if desc {
                SortOrder::Descending
            } else {
                SortOrder::Ascending
            };
            list(&store, sort, order, out)
        }
        Command::Log { session } => show_log(&store, &session, out),
        Command::Delete { session } => delete(&mut store, &session, out),
        Command::Export { path, format } => export(&store, &path, format, out),
        Command::ClearLogs => clear_logs(&mut store, out),
    }
}

/// Finalize an ingested session, save it and print its summary and errors.
pub fn finish_session(
    mut session: SessionRecord,
    config: &StoreConfig,
    store: &mut impl RecordStore,
    out: &mut impl Write,
) -> Result<(), LlmeterError> {
    let summary = session.finalize(Local::now(), &config.log_dir())?;
    store.save_record(&summary)?;

    print_summary(&summary, out)?;
    if !session.errors().is_empty() {
        writeln!(out, "\n错误信息:")?;
        for err in session.errors() {
            writeln!(out, "  数据集 {} 错误: {}", err.dataset, err.message)?;
        }
    }
    Ok(())
}

fn print_summary(s: &PersistedSummary, out: &mut impl Write) -> Result<(), LlmeterError> {
    writeln!(out, "会话名称: {}", s.session_name)?;
    writeln!(out, "测试ID: {}", s.test_task_id)?;
    writeln!(out, "完成/总数: {}/{}", s.successful_tasks, s.total_tasks)?;
    writeln!(out, "失败数: {}", s.failed_tasks)?;
    writeln!(out, "平均响应时间: {:.2}s", s.avg_response_time)?;
    writeln!(out, "平均生成速度: {:.1}字/秒", s.avg_generation_speed)?;
    writeln!(out, "平均TPS: {:.1}", s.avg_tps)?;
    writeln!(out, "日志文件: {}", s.log_file.display())?;
    Ok(())
}

pub fn list(
    store: &impl RecordStore,
    sort: SortKey,
    order: SortOrder,
    out: &mut impl Write,
) -> Result<(), LlmeterError> {
    let mut records = store.list_records()?;
    if records.is_empty() {
        tracing::info!("no stored test records");
    }
    sort_summaries(&mut records, sort, order);
    let rows: Vec<TableRow> = records.iter().map(TableRow::from_summary).collect();
    out.write_all(render_table(&rows).as_bytes())?;
    Ok(())
}

pub fn show_log(
    store: &impl RecordStore,
    session_name: &str,
    out: &mut impl Write,
) -> Result<(), LlmeterError> {
    let record = store
        .list_records()?
        .into_iter()
        .find(|r| r.session_name == session_name)
        .ok_or_else(|| LlmeterError::NotFound(format!("no test record named {session_name}")))?;
    let content = read_log(&record.log_file)?;
    out.write_all(content.as_bytes())?;
    Ok(())
}

pub fn delete(
    store: &mut impl RecordStore,
    session_name: &str,
    out: &mut impl Write,
) -> Result<(), LlmeterError> {
    if !store.delete_record(session_name)? {
        return Err(LlmeterError::Storage(format!(
            "failed to delete test record: {session_name}"
        )));
    }
    writeln!(out, "测试记录已删除: {session_name}")?;
    Ok(())
}

pub fn export(
    store: &impl RecordStore,
    path: &Path,
    format: ExportFormat,
    out: &mut impl Write,
) -> Result<(), LlmeterError> {
    let records = store.list_records()?;
    match format {
        ExportFormat::Csv => write_csv(&records, path)?,
        ExportFormat::Json => std::fs::write(path, export_json(&records)?)?,
    }
    writeln!(out, "记录导出成功: {} ({} 条)", path.display(), records.len())?;
    Ok(())
}

pub fn clear_logs(store: &mut impl RecordStore, out: &mut impl Write) -> Result<(), LlmeterError> {
    let removed = store.clear_log_files()?;
    writeln!(out, "日志文件已清除: {removed} 个")?;
    Ok(())
}
