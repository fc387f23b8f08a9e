use super::types::RecordedEvent;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Journal handle. Events are queued without blocking and written as JSON
/// lines by a background task.
///
/// Cloning shares the same journal.
#[derive(Clone)]
pub struct RecordingLogger {
    sender: mpsc::UnboundedSender<RecordedEvent>,
}

impl RecordingLogger {
    /// Open (or create) the journal at `path` for appending.
    ///
    /// The file is opened here rather than in the writer, so a bad path is
    /// reported to the caller.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create journal directory {parent:?}"))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .with_context(|| format!("Failed to open journal {path:?}"))?;

        Ok(Self::from_file(file))
    }

    /// Journal into an already-opened file. Must be called inside a tokio
    /// runtime.
    pub fn from_file(file: File) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(write_journal(BufWriter::new(file), receiver));
        Self { sender }
    }

    pub fn record(&self, event: RecordedEvent) {
        if self.sender.send(event).is_err() {
            warn!("Journal writer has stopped, dropping recorded event");
        }
    }
}

/// Drain the queue, writing every event that is already waiting before a
/// single flush.
async fn write_journal(
    mut out: BufWriter<File>,
    mut receiver: mpsc::UnboundedReceiver<RecordedEvent>,
) {
    while let Some(first) = receiver.recv().await {
        let mut written = append_line(&mut out, &first).await;
        while let Ok(event) = receiver.try_recv() {
            written += append_line(&mut out, &event).await;
        }

        if let Err(e) = out.flush().await {
            error!("Failed to flush journal: {}", e);
        } else {
            debug!("Journaled {} event(s)", written);
        }
    }
}

/// Returns how many lines were buffered (0 or 1).
async fn append_line(out: &mut BufWriter<File>, event: &RecordedEvent) -> usize {
    let mut line = match serde_json::to_vec(event) {
        Ok(line) => line,
        Err(e) => {
            error!(
                "Dropping unserializable {:?} event for {}: {}",
                event.event_type, event.correlation_id, e
            );
            return 0;
        }
    };
    line.push(b'\n');

    match out.write_all(&line).await {
        Ok(()) => 1,
        Err(e) => {
            error!("Failed to write journal line: {}", e);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::types::{Direction, EventType};
    use std::time::Duration;

    async fn read_events(path: &Path, expected: usize) -> Vec<RecordedEvent> {
        let mut events = vec![];
        for _ in 0..100 {
            let contents = tokio::fs::read_to_string(path).await.unwrap_or_default();
            events = contents
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect();
            if events.len() == expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        events
    }

    #[tokio::test]
    async fn test_events_are_appended_as_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("recordings.jsonl");
        let logger = RecordingLogger::open(&path).await.unwrap();

        logger.record(RecordedEvent::new(
            "cid-1",
            EventType::WebhookReceived,
            Direction::Request,
            "webhook",
            serde_json::json!({"action": "created"}),
        ));
        logger.record(
            RecordedEvent::new(
                "cid-1",
                EventType::InvocationCompleted,
                Direction::Response,
                "invocation",
                serde_json::json!({"outcome": "no_match"}),
            )
            .with_metadata("issue", "octo/tasks#1"),
        );

        let events = read_events(&path, 2).await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, EventType::WebhookReceived);
        assert_eq!(events[1].metadata["issue"], "octo/tasks#1");
    }

    #[tokio::test]
    async fn test_existing_journal_is_appended_to() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recordings.jsonl");
        let earlier = RecordedEvent::new(
            "cid-0",
            EventType::WebhookReceived,
            Direction::Request,
            "webhook",
            serde_json::json!({}),
        );
        tokio::fs::write(&path, format!("{}\n", serde_json::to_string(&earlier).unwrap()))
            .await
            .unwrap();

        let file = OpenOptions::new().append(true).open(&path).await.unwrap();
        let logger = RecordingLogger::from_file(file);
        logger.record(RecordedEvent::new(
            "cid-1",
            EventType::InvocationCompleted,
            Direction::Response,
            "invocation",
            serde_json::json!({}),
        ));

        let events = read_events(&path, 2).await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].correlation_id, "cid-0");
        assert_eq!(events[1].correlation_id, "cid-1");
    }

    #[tokio::test]
    async fn test_unopenable_journal_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        tokio::fs::write(&blocker, "").await.unwrap();

        let result = RecordingLogger::open(blocker.join("recordings.jsonl")).await;

        assert!(result.is_err());
    }
}
