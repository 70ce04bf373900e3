//! # Command Sender
//!
//! Writes command frames to the shared socket, either once or as a timed
//! burst of triggers.
//!
//! A failed write is reported as a status line and never retried.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::command::Command;
use super::socket::DatagramSocket;
use super::status::StatusSink;
use crate::error::{KipError, Result};

/// Send one command and report the outcome
///
/// Publishes `<SND> host:port` on success or `Problem sending packet: <err>`
/// on failure. Exactly one line is published either way.
///
/// # Errors
///
/// Returns `Transport` error if the socket write fails
pub async fn send_command(
    socket: &dyn DatagramSocket,
    target: SocketAddr,
    command: Command,
    status: &StatusSink,
) -> Result<()> {
    let frame = command.frame();

    match socket.send_to(&frame, target).await {
        Ok(_) => {
            debug!("Sent {:?} to {}", command, target);
            status.publish(format!("<SND> {}{}", target, status.dump(&frame)));
            Ok(())
        }
        Err(e) => {
            status.publish(format!("Problem sending packet: {}", e));
            Err(KipError::Transport(format!("send to {} failed: {}", target, e)))
        }
    }
}

/// Send one command on its own task
pub fn spawn_command(
    socket: Arc<dyn DatagramSocket>,
    target: SocketAddr,
    command: Command,
    status: StatusSink,
) -> JoinHandle<Result<()>> {
    tokio::spawn(async move { send_command(socket.as_ref(), target, command, &status).await })
}

/// Rate and length of a trigger burst
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstPlan {
    /// Triggers per second, greater than 0
    pub hertz: u32,
    /// Burst length; zero or negative runs until cancelled
    pub seconds: i64,
}

impl BurstPlan {
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `hertz` is 0
    pub fn new(hertz: u32, seconds: i64) -> Result<Self> {
        if hertz == 0 {
            return Err(KipError::InvalidArgument(
                "hertz must be greater than 0".to_string(),
            ));
        }
        Ok(Self { hertz, seconds })
    }

    /// Number of triggers to send, `None` for an unbounded burst
    pub fn total(&self) -> Option<u64> {
        if self.seconds > 0 {
            Some(u64::from(self.hertz).saturating_mul(self.seconds as u64))
        } else {
            None
        }
    }

    /// Pause between triggers: `1000 / hertz` milliseconds
    pub fn period(&self) -> Duration {
        Duration::from_millis(u64::from(1000 / self.hertz.max(1)))
    }
}

/// How a burst ended
///
/// Every trigger is attempted once; `failed` counts writes that errored and
/// were reported without a retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BurstOutcome {
    /// Every planned trigger was attempted
    Completed { sent: u64, failed: u64 },
    /// Cancel was observed between sends
    Cancelled { sent: u64, failed: u64 },
}

impl BurstOutcome {
    /// Triggers written to the socket
    pub fn sent(&self) -> u64 {
        match self {
            BurstOutcome::Completed { sent, .. } | BurstOutcome::Cancelled { sent, .. } => *sent,
        }
    }

    /// Triggers whose write failed
    pub fn failed(&self) -> u64 {
        match self {
            BurstOutcome::Completed { failed, .. } | BurstOutcome::Cancelled { failed, .. } => *failed,
        }
    }

    pub fn attempts(&self) -> u64 {
        self.sent() + self.failed()
    }
}

/// Running trigger burst
///
/// Dropping the handle does not stop the burst; call [`BurstHandle::cancel`].
#[derive(Debug)]
pub struct BurstHandle {
    cancel: CancellationToken,
    task: JoinHandle<BurstOutcome>,
}

impl BurstHandle {
    /// Request a stop; observed before the next send
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the burst to end
    ///
    /// # Errors
    ///
    /// Returns `Transport` error if the burst task panicked or was aborted
    pub async fn join(self) -> Result<BurstOutcome> {
        self.task
            .await
            .map_err(|e| KipError::Transport(format!("burst task failed: {}", e)))
    }
}

/// Start a trigger burst
///
/// Sends a trigger, waits [`BurstPlan::period`], and repeats until
/// [`BurstPlan::total`] triggers were attempted or the token is cancelled.
/// A failed write is reported and skipped. An in-flight write is never
/// interrupted.
pub fn spawn_burst(
    socket: Arc<dyn DatagramSocket>,
    target: SocketAddr,
    plan: BurstPlan,
    status: StatusSink,
    cancel: CancellationToken,
) -> BurstHandle {
    let token = cancel.clone();
    let task = tokio::spawn(async move { run_burst(socket.as_ref(), target, plan, &status, &token).await });
    BurstHandle { cancel, task }
}

async fn run_burst(
    socket: &dyn DatagramSocket,
    target: SocketAddr,
    plan: BurstPlan,
    status: &StatusSink,
    cancel: &CancellationToken,
) -> BurstOutcome {
    let total = plan.total();
    let period = plan.period();
    let mut sent: u64 = 0;
    let mut failed: u64 = 0;

    debug!("Starting burst at {}Hz, total {:?}", plan.hertz, total);

    loop {
        if cancel.is_cancelled() {
            debug!("Burst cancelled after {} triggers, {} failed", sent, failed);
            return BurstOutcome::Cancelled { sent, failed };
        }

        // send_command has already published the failure line
        match send_command(socket, target, Command::Trigger, status).await {
            Ok(()) => sent += 1,
            Err(e) => {
                failed += 1;
                warn!("Burst trigger {} failed: {}", sent + failed, e);
            }
        }

        if total.is_some_and(|total| sent + failed >= total) {
            debug!("Burst completed with {} triggers, {} failed", sent, failed);
            return BurstOutcome::Completed { sent, failed };
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Burst cancelled after {} triggers, {} failed", sent, failed);
                return BurstOutcome::Cancelled { sent, failed };
            }
            _ = sleep(period) => {}
        }
    }
}
