use std::sync::Arc;

use crate::{IsolationRecord, SerialStore};

/// Fire-and-forget sink for issued-number snapshots.
///
/// Issuance never waits on the outcome. Delivery is assumed at-least-once and
/// may lag or arrive out of order, so the durable record is only ever treated
/// as a calibration hint and ordinary snapshots only ever raise it.
pub trait RecordPublisher: Send + Sync {
    fn publish(&self, record: IsolationRecord);

    /// Publishes the first snapshot after an unbounded counter rolled over.
    ///
    /// Unlike [`publish`](Self::publish) it must overwrite the higher number
    /// on record. The default forwards to `publish`.
    fn publish_rollover(&self, record: IsolationRecord) {
        self.publish(record);
    }
}

/// Discards every snapshot.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopPublisher;

impl RecordPublisher for NoopPublisher {
    fn publish(&self, _record: IsolationRecord) {}
}

/// Writes snapshots straight into a [`SerialStore`] on the calling thread.
///
/// Write failures are logged and dropped.
#[derive(Clone)]
pub struct StorePublisher {
    store: Arc<dyn SerialStore>,
}

impl StorePublisher {
    pub fn new(store: Arc<dyn SerialStore>) -> Self {
        Self { store }
    }
}

impl RecordPublisher for StorePublisher {
    fn publish(&self, record: IsolationRecord) {
        if let Err(_e) = self.store.upsert_isolation_record(record) {
            #[cfg(feature = "tracing")]
            tracing::warn!("Failed to persist isolation record: {_e}");
        }
    }

    fn publish_rollover(&self, record: IsolationRecord) {
        if let Err(_e) = self.store.replace_isolation_record(record) {
            #[cfg(feature = "tracing")]
            tracing::warn!("Failed to reset rolled-over isolation record: {_e}");
        }
    }
}
