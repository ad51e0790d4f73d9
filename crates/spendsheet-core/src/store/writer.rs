//! Background writer that replicates record snapshots to the remote sheet.
//!
//! One writer task runs per store. Requests are handled strictly one at a
//! time in submission order, so a later snapshot can never be overwritten by
//! an earlier one that was still in flight. Every write replaces the whole
//! sheet, which means that when several snapshots are waiting only the newest
//! needs sending.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::api::{RemoteStore, Sheet};

/// Buffer size for the outcome channel back to the controller.
/// Outcomes beyond this are dropped; they are advisory only.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Outcome of a background sync step, reported back to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A snapshot was handed to the remote sheet
    Saved { sheet: Sheet, rows: usize },
    /// The remote write failed; the local cache still holds the data
    SaveFailed { sheet: Sheet, error: String },
    /// Writing the local cache failed
    CacheFailed { sheet: Sheet, error: String },
}

impl SyncEvent {
    /// User-facing advisory for failures, `None` for successes.
    pub fn advisory(&self) -> Option<String> {
        match self {
            SyncEvent::Saved { .. } => None,
            SyncEvent::SaveFailed { sheet, .. } => Some(format!(
                "Could not save {} to the remote sheet. Data was saved locally.",
                sheet
            )),
            SyncEvent::CacheFailed { sheet, .. } => {
                Some(format!("Could not save {} to local storage.", sheet))
            }
        }
    }
}

enum WriteRequest {
    Persist(Vec<Vec<String>>),
    Flush(oneshot::Sender<()>),
}

/// Handle to a store's writer task. Dropping it lets the task finish the
/// writes already queued and exit.
pub struct WriteQueue {
    request_tx: mpsc::UnboundedSender<WriteRequest>,
    event_rx: mpsc::Receiver<SyncEvent>,
}

impl WriteQueue {
    /// Spawn the writer task. Must be called from within a Tokio runtime.
    pub fn spawn(sheet: Sheet, remote: Arc<dyn RemoteStore>) -> Self {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        tokio::spawn(run_writer(sheet, remote, request_rx, event_tx));

        Self {
            request_tx,
            event_rx,
        }
    }

    /// Queue a full snapshot of the sheet. Returns immediately.
    pub fn enqueue(&self, rows: Vec<Vec<String>>) {
        if self.request_tx.send(WriteRequest::Persist(rows)).is_err() {
            warn!("Writer task has stopped, dropping snapshot");
        }
    }

    /// Wait until every snapshot queued so far has been attempted.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.request_tx.send(WriteRequest::Flush(done_tx)).is_err() {
            return;
        }
        let _ = done_rx.await;
    }

    /// Collect outcomes reported since the last call.
    pub fn drain_events(&mut self) -> Vec<SyncEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.event_rx.try_recv() {
            events.push(event);
        }
        events
    }
}

async fn run_writer(
    sheet: Sheet,
    remote: Arc<dyn RemoteStore>,
    mut request_rx: mpsc::UnboundedReceiver<WriteRequest>,
    event_tx: mpsc::Sender<SyncEvent>,
) {
    debug!(sheet = sheet.name(), "Writer task started");

    while let Some(first) = request_rx.recv().await {
        let mut latest = None;
        let mut waiters = Vec::new();
        let mut superseded = 0usize;

        {
            let mut absorb = |request: WriteRequest| match request {
                WriteRequest::Persist(rows) => {
                    if latest.replace(rows).is_some() {
                        superseded += 1;
                    }
                }
                WriteRequest::Flush(done) => waiters.push(done),
            };

            absorb(first);
            while let Ok(request) = request_rx.try_recv() {
                absorb(request);
            }
        }

        if superseded > 0 {
            debug!(sheet = sheet.name(), superseded, "Coalesced queued snapshots");
        }

        if let Some(rows) = latest {
            let count = rows.len();
            let event = match remote.persist_rows(sheet, rows).await {
                Ok(()) => {
                    info!(sheet = sheet.name(), rows = count, "Saved to remote sheet");
                    SyncEvent::Saved { sheet, rows: count }
                }
                Err(e) => {
                    warn!(sheet = sheet.name(), error = %e, "Remote save failed");
                    SyncEvent::SaveFailed {
                        sheet,
                        error: e.to_string(),
                    }
                }
            };
            if event_tx.try_send(event).is_err() {
                debug!(sheet = sheet.name(), "Outcome channel full, dropping sync event");
            }
        }

        for done in waiters {
            let _ = done.send(());
        }
    }

    debug!(sheet = sheet.name(), "Writer task finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeRemote;

    fn snapshot(tag: &str) -> Vec<Vec<String>> {
        vec![vec![tag.to_string()]]
    }

    #[tokio::test]
    async fn test_writes_in_submission_order() {
        let remote = Arc::new(FakeRemote::default());
        let queue = WriteQueue::spawn(Sheet::Expenses, remote.clone());

        queue.enqueue(snapshot("a"));
        queue.flush().await;
        queue.enqueue(snapshot("b"));
        queue.flush().await;

        let writes = remote.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].1, snapshot("a"));
        assert_eq!(writes[1].1, snapshot("b"));
    }

    #[tokio::test]
    async fn test_waiting_snapshots_coalesce_to_newest() {
        let remote = Arc::new(FakeRemote::default());
        let queue = WriteQueue::spawn(Sheet::Budgets, remote.clone());

        // Current-thread runtime: the writer cannot run until we await
        queue.enqueue(snapshot("1"));
        queue.enqueue(snapshot("2"));
        queue.enqueue(snapshot("3"));
        queue.flush().await;

        let writes = remote.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0], (Sheet::Budgets, snapshot("3")));
    }

    #[tokio::test]
    async fn test_reports_outcomes() {
        let remote = Arc::new(FakeRemote::default());
        let mut queue = WriteQueue::spawn(Sheet::Expenses, remote.clone());

        queue.enqueue(snapshot("ok"));
        queue.flush().await;
        remote.set_fail_writes(true);
        queue.enqueue(snapshot("fails"));
        queue.flush().await;

        let events = queue.drain_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], SyncEvent::Saved { sheet: Sheet::Expenses, rows: 1 });
        assert!(matches!(events[1], SyncEvent::SaveFailed { sheet: Sheet::Expenses, .. }));
        assert!(queue.drain_events().is_empty());
    }

    #[tokio::test]
    async fn test_flush_with_nothing_queued() {
        let remote = Arc::new(FakeRemote::default());
        let queue = WriteQueue::spawn(Sheet::Expenses, remote.clone());
        queue.flush().await;
        assert!(remote.writes().is_empty());
    }

    #[test]
    fn test_advisory_messages() {
        let saved = SyncEvent::Saved { sheet: Sheet::Budgets, rows: 3 };
        assert_eq!(saved.advisory(), None);

        let failed = SyncEvent::SaveFailed {
            sheet: Sheet::Budgets,
            error: "timeout".into(),
        };
        assert_eq!(
            failed.advisory().unwrap(),
            "Could not save budgets to the remote sheet. Data was saved locally."
        );
    }
}
