//! # Live Poller
//!
//! Drains the history's live buffer at a fixed refresh rate and forwards
//! each result to a display.
//!
//! The poller runs until its task is aborted.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{debug, trace};

use crate::telemetry::history::TelemetryHistory;
use crate::telemetry::record::{Measurements, TelemetryRecord};

/// One poll result
#[derive(Debug, Clone, PartialEq)]
pub enum LiveUpdate {
    /// Nothing arrived since the previous poll
    NoData,
    /// Most recent record since the previous poll
    Record(Arc<TelemetryRecord>),
}

impl LiveUpdate {
    /// Measurements to display; all zero for [`LiveUpdate::NoData`]
    pub fn measurements(&self) -> Measurements {
        match self {
            LiveUpdate::NoData => Measurements::default(),
            LiveUpdate::Record(record) => *record.measurements(),
        }
    }
}

/// Consumer of live updates
#[cfg_attr(test, mockall::automock)]
pub trait LiveDisplay: Send {
    fn show(&mut self, update: LiveUpdate);
}

/// Forwards updates over a bounded channel
///
/// A full channel drops the update so a slow consumer never stalls polling.
impl LiveDisplay for mpsc::Sender<LiveUpdate> {
    fn show(&mut self, update: LiveUpdate) {
        if let Err(e) = self.try_send(update) {
            trace!("Live update not delivered: {}", e);
        }
    }
}

/// Poll period for a refresh rate in ticks per second
///
/// Rates above 1000 poll once per millisecond.
pub fn poll_period(refresh_hz: u32) -> Duration {
    Duration::from_millis(u64::from(1000 / refresh_hz.max(1)).max(1))
}

/// Take the live buffer once and show the result
pub fn poll_once<D: LiveDisplay + ?Sized>(history: &TelemetryHistory, display: &mut D) {
    let update = match history.take_buffer() {
        Some(record) => LiveUpdate::Record(record),
        None => LiveUpdate::NoData,
    };
    display.show(update);
}

/// Poll forever at `refresh_hz`
pub async fn run_poller<D: LiveDisplay>(history: &TelemetryHistory, refresh_hz: u32, display: &mut D) {
    let period = poll_period(refresh_hz);
    let mut ticker = interval(period);
    debug!("Polling live buffer every {:?}", period);

    loop {
        ticker.tick().await;
        poll_once(history, display);
    }
}

/// Start polling on its own task
pub fn spawn_poller<D: LiveDisplay + 'static>(
    history: Arc<TelemetryHistory>,
    refresh_hz: u32,
    mut display: D,
) -> JoinHandle<()> {
    tokio::spawn(async move { run_poller(&history, refresh_hz, &mut display).await })
}
