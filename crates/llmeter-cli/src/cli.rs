use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use llmeter_core::results::SortKey;

/// Manage LLM load-test result records.
#[derive(Parser, Debug)]
#[command(name = "llmeter")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding `records.json` and `logs/tests/`.
    #[arg(long, global = true, env = "LLMETER_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Aggregate a JSON-lines stream of request outcomes into a new session,
    /// write its log and save the summary.
    ///
    /// Each line looks like
    /// `{"dataset": "A", "success": true, "duration_seconds": 1.2, "token_count": 40, "char_count": 120}`.
    Ingest {
        /// Model under test.
        #[arg(short, long)]
        model: String,

        /// Number of concurrent workers used by the test run.
        #[arg(short, long, allow_negative_numbers = true)]
        concurrency: i64,

        /// Test task id; a random UUID when omitted.
        #[arg(long)]
        task_id: Option<String>,

        /// Outcome file; stdin when omitted.
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Show stored sessions as a table.
    List {
        /// Column to sort by.
        #[arg(short, long, default_value_t = SortKey::TestTime)]
        sort: SortKey,

        /// Sort in descending order.
        #[arg(long)]
        desc: bool,
    },

    /// Print the log file of a session.
    Log {
        /// Session name, e.g. `test_20240309_140509`.
        session: String,
    },

    /// Delete the record of a session.
    Delete { session: String },

    /// Export every stored record.
    Export {
        /// Destination file.
        path: PathBuf,

        #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
    },

    /// Delete all session log files. Records are kept.
    ClearLogs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}
