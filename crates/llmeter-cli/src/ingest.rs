use llmeter_core::session::{spawn_recorder, SessionRecord, TestOutcome};
use llmeter_core::LlmeterError;
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// One line of an outcome stream.
#[derive(Debug, Deserialize)]
struct OutcomeLine {
    dataset: String,
    #[serde(flatten)]
    outcome: TestOutcome,
}

/// Feed every outcome line from `reader` into `session` through the
/// recorder queue and return the updated session.
///
/// Blank lines are skipped; a malformed line aborts the ingest.
pub async fn ingest_outcomes<R>(
    reader: R,
    session: SessionRecord,
) -> Result<SessionRecord, LlmeterError>
where
    R: AsyncBufRead + Unpin,
{
    let (tx, recorder) = spawn_recorder(session);

    let mut lines = reader.lines();
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let parsed: OutcomeLine = serde_json::from_str(trimmed).inspect_err(|e| {
            tracing::error!(line = line_no, "invalid outcome line: {e}");
        })?;
        tx.send(parsed.dataset, parsed.outcome).await?;
    }
    drop(tx);

    recorder.finish().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_session() -> SessionRecord {
        SessionRecord::start("gpt-x", 4, "task-ingest").expect("valid session")
    }

    #[tokio::test]
    async fn ingests_reference_stream() {
        let input = concat!(
            r#"{"dataset": "A", "success": true, "duration_seconds": 1.0, "token_count": 10, "char_count": 100}"#,
            "\n\n",
            r#"{"dataset": "A", "success": true, "duration_seconds": 2.0, "token_count": 20, "char_count": 200}"#,
            "\n",
            r#"{"dataset": "A", "success": false, "error_message": "timeout"}"#,
            "\n",
        );
        let session = ingest_outcomes(input.as_bytes(), make_session())
            .await
            .expect("ingest should succeed");

        let totals = session.totals();
        assert_eq!(totals.total_tasks, 3);
        assert_eq!(totals.successful_tasks, 2);
        assert_eq!(totals.total_chars, 300);
        assert_eq!(session.errors().len(), 1);
        assert_eq!(session.errors()[0].dataset, "A");
    }

    #[tokio::test]
    async fn malformed_line_is_an_error() {
        let input = "{\"dataset\": \"A\", \"success\": tru}\n";
        let err = ingest_outcomes(input.as_bytes(), make_session())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmeterError::Serde(_)));
    }

    #[tokio::test]
    async fn empty_stream_leaves_session_empty() {
        let session = ingest_outcomes("".as_bytes(), make_session())
            .await
            .expect("ingest should succeed");
        assert!(session.datasets().is_empty());
    }
}
