use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{SessionRecord, TestOutcome};
use crate::error::LlmeterError;

/// Queue depth between producers and the recording task.
pub const RECORDER_CHANNEL_CAPACITY: usize = 1024;

/// Cloneable producer side of a recorder. Hand one clone to each worker.
#[derive(Debug, Clone)]
pub struct OutcomeSender {
    tx: mpsc::Sender<(String, TestOutcome)>,
}

impl OutcomeSender {
    /// Queue an outcome for `dataset`. Waits while the queue is full.
    pub async fn send(
        &self,
        dataset: impl Into<String>,
        outcome: TestOutcome,
    ) -> Result<(), LlmeterError> {
        self.tx
            .send((dataset.into(), outcome))
            .await
            .map_err(|_| LlmeterError::Internal("outcome recorder has stopped".to_string()))
    }
}

/// Owner of the recording task.
pub struct RecorderHandle {
    task: JoinHandle<SessionRecord>,
}

impl RecorderHandle {
    /// Wait for the recording task to drain its queue and hand the session
    /// back.
    ///
    /// The task only ends once every [`OutcomeSender`] has been dropped.
    pub async fn finish(self) -> Result<SessionRecord, LlmeterError> {
        self.task
            .await
            .map_err(|e| LlmeterError::Internal(format!("outcome recorder task failed: {e}")))
    }
}

/// Move `session` into a single consumer task fed by a bounded queue.
///
/// Concurrent workers never touch the counters directly; every update is
/// applied by the one task that owns the record. Must be called from within
/// a tokio runtime.
pub fn spawn_recorder(session: SessionRecord) -> (OutcomeSender, RecorderHandle) {
    let (tx, mut rx) = mpsc::channel::<(String, TestOutcome)>(RECORDER_CHANNEL_CAPACITY);

    let task = tokio::spawn(async move {
        let mut session = session;
        while let Some((dataset, outcome)) = rx.recv().await {
            session.record_outcome(&dataset, outcome);
        }
        tracing::debug!(session = %session.session_name(), "outcome queue closed");
        session
    });

    (OutcomeSender { tx }, RecorderHandle { task })
}
