//! Asynchronous snapshot delivery on the tokio runtime.
//!
//! [`RecordWriter::spawn`] starts a background task that owns the receiving
//! end of an unbounded channel and applies every snapshot to the store. The
//! returned [`ChannelPublisher`] is cheap to clone and never blocks, which
//! keeps the durable write off the issuance path.

use std::sync::Arc;

use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{IsolationRecord, RecordPublisher, SerialStore};

#[derive(Debug)]
enum Snapshot {
    Advance(IsolationRecord),
    Rollover(IsolationRecord),
}

/// Sending half of a [`RecordWriter`].
#[derive(Clone, Debug)]
pub struct ChannelPublisher {
    tx: mpsc::UnboundedSender<Snapshot>,
}

impl ChannelPublisher {
    fn send(&self, snapshot: Snapshot) {
        if self.tx.send(snapshot).is_err() {
            #[cfg(feature = "tracing")]
            tracing::warn!("Record writer stopped; dropping isolation record");
        }
    }
}

impl RecordPublisher for ChannelPublisher {
    fn publish(&self, record: IsolationRecord) {
        self.send(Snapshot::Advance(record));
    }

    fn publish_rollover(&self, record: IsolationRecord) {
        self.send(Snapshot::Rollover(record));
    }
}

/// Handle to the background task applying published snapshots.
#[derive(Debug)]
pub struct RecordWriter {
    handle: JoinHandle<usize>,
    shutdown_token: CancellationToken,
}

impl RecordWriter {
    /// Spawns the writer task on the current tokio runtime.
    ///
    /// The store is called directly from the task, so a store whose writes
    /// block for long should be wrapped to offload them.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn(store: Arc<dyn SerialStore>) -> (ChannelPublisher, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown_token = CancellationToken::new();
        let handle = tokio::spawn(writer_loop(rx, store, shutdown_token.clone()));

        (
            ChannelPublisher { tx },
            Self {
                handle,
                shutdown_token,
            },
        )
    }

    /// Stops the writer after draining snapshots already queued.
    ///
    /// Returns how many snapshots the writer applied over its lifetime.
    pub async fn shutdown(self) -> usize {
        self.shutdown_token.cancel();
        match self.handle.await {
            Ok(written) => written,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::error!("Record writer task failed: {_e}");
                0
            }
        }
    }
}

async fn writer_loop(
    mut rx: mpsc::UnboundedReceiver<Snapshot>,
    store: Arc<dyn SerialStore>,
    shutdown_token: CancellationToken,
) -> usize {
    #[cfg(feature = "tracing")]
    tracing::trace!("Record writer started");

    let mut written = 0;
    loop {
        tokio::select! {
            biased;
            snapshot = rx.recv() => match snapshot {
                Some(snapshot) => written += write(store.as_ref(), snapshot),
                None => break,
            },
            () = shutdown_token.cancelled() => {
                while let Ok(snapshot) = rx.try_recv() {
                    written += write(store.as_ref(), snapshot);
                }
                break;
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Record writer stopped after {written} records");
    written
}

fn write(store: &dyn SerialStore, snapshot: Snapshot) -> usize {
    let applied = match snapshot {
        Snapshot::Advance(record) => store.upsert_isolation_record(record),
        Snapshot::Rollover(record) => store.replace_isolation_record(record),
    };
    match applied {
        Ok(()) => 1,
        Err(_e) => {
            #[cfg(feature = "tracing")]
            tracing::warn!("Failed to persist isolation record: {_e}");
            0
        }
    }
}
