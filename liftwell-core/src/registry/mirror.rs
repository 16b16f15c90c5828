use std::sync::Arc;
use std::time::Duration;

use liftwell_model::ElevatorRecord;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use crate::store::ElevatorStore;

const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Commands for the background mirror task
#[derive(Debug)]
enum MirrorCommand {
    /// Write the record's runtime columns to the backing store
    Persist(ElevatorRecord),
    /// Acknowledge once every earlier command has been handled
    Flush(oneshot::Sender<()>),
}

/// Handle to the single task that copies accepted registry updates into the
/// backing store.
///
/// One writer keeps writes for the same elevator in the order the registry
/// accepted them. Sending never blocks, so the registry gate is never held
/// for store latency. When the last handle is dropped the task drains what
/// is still queued and exits.
#[derive(Debug, Clone)]
pub(crate) struct MirrorWriter {
    tx: mpsc::UnboundedSender<MirrorCommand>,
}

impl MirrorWriter {
    /// Must be called from within a Tokio runtime.
    pub(crate) fn spawn(store: Arc<dyn ElevatorStore>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_mirror(store, rx));
        Self { tx }
    }

    pub(crate) fn persist(&self, record: ElevatorRecord) {
        let elevator_id = record.id;
        if self.tx.send(MirrorCommand::Persist(record)).is_err() {
            error!("Mirror writer stopped; dropping store write for elevator {}", elevator_id);
        }
    }

    pub(crate) async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(MirrorCommand::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }
}

async fn run_mirror(
    store: Arc<dyn ElevatorStore>,
    mut rx: mpsc::UnboundedReceiver<MirrorCommand>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            MirrorCommand::Persist(record) => persist_with_retry(store.as_ref(), &record).await,
            MirrorCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("Mirror writer drained and stopped");
}

async fn persist_with_retry(store: &dyn ElevatorStore, record: &ElevatorRecord) {
    for attempt in 1..=MAX_ATTEMPTS {
        match store.persist_elevator_update(record).await {
            Ok(()) => return,
            Err(e) if attempt < MAX_ATTEMPTS => {
                warn!(
                    "Store write for elevator {} failed (attempt {}/{}): {}",
                    record.id, attempt, MAX_ATTEMPTS, e
                );
                tokio::time::sleep(RETRY_DELAY * attempt).await;
            }
            Err(e) => {
                error!(
                    "Giving up on store write for elevator {} after {} attempts: {}",
                    record.id, MAX_ATTEMPTS, e
                );
            }
        }
    }
}
