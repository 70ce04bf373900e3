//! # Telemetry History
//!
//! Thread-safe log of every received record plus a single-slot live buffer.
//!
//! The live buffer holds the most recently appended record until it is read
//! once with [`TelemetryHistory::take_buffer`]. A low-rate poller can then
//! tell "nothing new since the last poll" apart from "new data arrived".

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use super::record::TelemetryRecord;

#[derive(Debug, Default)]
struct Inner {
    records: Vec<Arc<TelemetryRecord>>,
    buffer: Option<Arc<TelemetryRecord>>,
}

/// Append-only record log with a read-once live buffer
///
/// Both the log and the buffer sit behind one mutex so an append and its
/// buffer replacement are observed together. The lock is never held across
/// an `.await`.
#[derive(Debug, Default)]
pub struct TelemetryHistory {
    inner: Mutex<Inner>,
}

impl TelemetryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock cannot leave Inner half-updated:
        // every mutation below is a single push/assignment.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a record and make it the live buffer
    pub fn append(&self, record: Arc<TelemetryRecord>) {
        let mut inner = self.lock();
        inner.records.push(Arc::clone(&record));
        inner.buffer = Some(record);
        debug!("History now holds {} records", inner.records.len());
    }

    /// Read and clear the live buffer
    ///
    /// Returns `None` until another [`append`](Self::append) happens.
    pub fn take_buffer(&self) -> Option<Arc<TelemetryRecord>> {
        self.lock().buffer.take()
    }

    /// Copy of all records in insertion order
    pub fn snapshot(&self) -> Vec<Arc<TelemetryRecord>> {
        self.lock().records.clone()
    }

    /// Remove every record and empty the live buffer
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.records.clear();
        inner.buffer = None;
        debug!("History cleared");
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }
}
