//! # Status Lines
//!
//! Timestamped human-readable progress lines for the operator.
//!
//! Every worker outcome is published here exactly once. Lines fan out over a
//! broadcast channel so any number of displays can subscribe; a subscriber
//! that falls behind loses its oldest lines instead of stalling a worker.

use std::fmt;

use chrono::{DateTime, Local};
use tokio::sync::broadcast;
use tracing::info;

/// Lines buffered per subscriber before the oldest are dropped
pub const STATUS_CHANNEL_CAPACITY: usize = 256;

/// Timestamp layout: `MM/dd/yy HH:mm:ss.SSS`
const TIMESTAMP_FORMAT: &str = "%m/%d/%y %H:%M:%S%.3f";

/// One status line
#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl StatusLine {
    pub fn new(message: impl Into<String>) -> Self {
        Self::at(Local::now(), message)
    }

    pub fn at(timestamp: DateTime<Local>, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            message: message.into(),
        }
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format(TIMESTAMP_FORMAT), self.message)
    }
}

/// Publisher side of the status stream
///
/// Cheap to clone; each worker holds its own copy.
#[derive(Debug, Clone)]
pub struct StatusSink {
    tx: broadcast::Sender<StatusLine>,
    debug: bool,
}

impl StatusSink {
    /// Create a sink
    ///
    /// # Arguments
    ///
    /// * `debug` - Append a raw byte dump to traffic lines
    pub fn new(debug: bool) -> Self {
        let (tx, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        Self { tx, debug }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusLine> {
        self.tx.subscribe()
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug
    }

    /// Publish a line, also emitting it as a tracing event
    ///
    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, message: impl Into<String>) -> StatusLine {
        let line = StatusLine::new(message);
        info!(target: "kip_console::status", "{}", line.message);
        let _ = self.tx.send(line.clone());
        line
    }

    /// Debug suffix for a traffic line, empty when debug is off
    pub fn dump(&self, data: &[u8]) -> String {
        if self.debug {
            debug_dump(data)
        } else {
            String::new()
        }
    }
}

/// Raw byte dump: `\n\t[DEBUG][size N][b0, b1, ...]` with signed bytes
pub fn debug_dump(data: &[u8]) -> String {
    let bytes: Vec<String> = data.iter().map(|&b| (b as i8).to_string()).collect();
    format!("\n\t[DEBUG][size {}][{}]", data.len(), bytes.join(", "))
}
