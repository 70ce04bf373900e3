//! # Telemetry Receiver
//!
//! Listens on the shared socket, tags each datagram valid or invalid, and
//! stores every frame of the right length in the history.
//!
//! The loop has no cancellation path of its own. It ends when the socket
//! faults or when its task is aborted.

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Local;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::socket::{is_fatal, DatagramSocket};
use super::status::StatusSink;
use crate::error::{KipError, Result};
use crate::frame::decoder::validate;
use crate::frame::protocol::{FrameKind, TELEMETRY_FRAME_SIZE, TELEMETRY_ID_INDEX};
use crate::telemetry::history::TelemetryHistory;
use crate::telemetry::record::TelemetryRecord;

/// Receive buffer size; larger than a frame so oversized datagrams are seen
/// at their true length instead of being truncated to a valid-looking one
pub const RECEIVE_BUFFER_SIZE: usize = 2048;

/// What happened to one datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Valid frame, stored
    Stored,
    /// Right length but failed a header, footer, or checksum check; stored
    StoredInvalid,
    /// Wrong length, dropped
    Dropped,
}

/// Handle one datagram: publish its status line and store it if possible
pub fn handle_datagram(
    data: &[u8],
    source: SocketAddr,
    history: &TelemetryHistory,
    status: &StatusSink,
) -> Disposition {
    let validity = validate(data, FrameKind::Telemetry);
    let tag = if validity.is_ok() { "[VALID]" } else { "[INVALID]" };
    let id = data
        .get(TELEMETRY_ID_INDEX)
        .map(|&id| (id as i8).to_string())
        .unwrap_or_else(|| "?".to_string());

    status.publish(format!("<RCV> {} {} ID={}{}", tag, source, id, status.dump(data)));

    if let Err(defect) = &validity {
        debug!("Datagram from {} failed validation: {}", source, defect);
    }

    match TelemetryRecord::from_datagram(Local::now(), data) {
        Some(record) => {
            history.append(Arc::new(record));
            if validity.is_ok() {
                Disposition::Stored
            } else {
                Disposition::StoredInvalid
            }
        }
        None => {
            debug!(
                "Dropped {}-byte datagram from {}, expected {}",
                data.len(),
                source,
                TELEMETRY_FRAME_SIZE
            );
            Disposition::Dropped
        }
    }
}

/// Receive until the socket faults
///
/// Transient receive errors are reported and the loop continues. A fatal
/// error is reported once and returned.
///
/// # Errors
///
/// Returns `Transport` error carrying the fatal socket error
pub async fn run_receiver(
    socket: &dyn DatagramSocket,
    history: &TelemetryHistory,
    status: &StatusSink,
) -> Result<()> {
    let mut buffer = vec![0u8; RECEIVE_BUFFER_SIZE];
    let mut received: u64 = 0;

    loop {
        match socket.recv_from(&mut buffer).await {
            Ok((len, source)) => {
                received += 1;
                handle_datagram(&buffer[..len], source, history, status);
            }
            Err(e) if is_fatal(&e) => {
                status.publish(format!("Problem receiving response: {}", e));
                error!("Receiver stopped after {} datagrams: {}", received, e);
                return Err(KipError::Transport(format!("receive failed: {}", e)));
            }
            Err(e) => {
                status.publish(format!("Problem receiving response: {}", e));
                warn!("Receive error, continuing: {}", e);
            }
        }
    }
}

/// Start the receive loop on its own task
pub fn spawn_receiver(
    socket: Arc<dyn DatagramSocket>,
    history: Arc<TelemetryHistory>,
    status: StatusSink,
) -> JoinHandle<Result<()>> {
    tokio::spawn(async move { run_receiver(socket.as_ref(), &history, &status).await })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::encoder::encode_telemetry;
    use crate::frame::protocol::{SAMPLES_PER_CHANNEL, TELEMETRY_CHECKSUM_INDEX};
    use crate::transport::socket::mocks::MockSocket;
    use std::io;

    fn source() -> SocketAddr {
        "10.0.0.2:5000".parse().unwrap()
    }

    fn frame(id: u8) -> Vec<u8> {
        let zeros = [0u16; SAMPLES_PER_CHANNEL];
        encode_telemetry(id, &zeros, &zeros, &zeros).to_vec()
    }

    #[test]
    fn test_valid_frame_is_stored() {
        let history = TelemetryHistory::new();
        let status = StatusSink::new(false);
        let mut rx = status.subscribe();

        let disposition = handle_datagram(&frame(5), source(), &history, &status);

        assert_eq!(disposition, Disposition::Stored);
        assert_eq!(history.len(), 1);
        assert!(history.take_buffer().unwrap().is_valid());
        assert_eq!(rx.try_recv().unwrap().message, "<RCV> [VALID] 10.0.0.2:5000 ID=5");
    }

    #[test]
    fn test_bad_checksum_is_stored_as_invalid() {
        let history = TelemetryHistory::new();
        let status = StatusSink::new(false);
        let mut rx = status.subscribe();

        let mut data = frame(5);
        data[TELEMETRY_CHECKSUM_INDEX] ^= 0xFF;
        let disposition = handle_datagram(&data, source(), &history, &status);

        assert_eq!(disposition, Disposition::StoredInvalid);
        assert!(!history.take_buffer().unwrap().is_valid());
        assert_eq!(rx.try_recv().unwrap().message, "<RCV> [INVALID] 10.0.0.2:5000 ID=5");
    }

    #[test]
    fn test_wrong_length_is_dropped() {
        let history = TelemetryHistory::new();
        let status = StatusSink::new(false);
        let mut rx = status.subscribe();

        let short = &frame(5)[..100];
        assert_eq!(handle_datagram(short, source(), &history, &status), Disposition::Dropped);

        let mut long = frame(5);
        long.push(0);
        assert_eq!(handle_datagram(&long, source(), &history, &status), Disposition::Dropped);

        assert!(history.is_empty());
        assert!(rx.try_recv().unwrap().message.starts_with("<RCV> [INVALID]"));
        assert!(rx.try_recv().unwrap().message.starts_with("<RCV> [INVALID]"));
    }

    #[test]
    fn test_id_printed_signed_and_empty_datagram() {
        let history = TelemetryHistory::new();
        let status = StatusSink::new(false);
        let mut rx = status.subscribe();

        handle_datagram(&frame(200), source(), &history, &status);
        handle_datagram(&[], source(), &history, &status);

        assert!(rx.try_recv().unwrap().message.ends_with("ID=-56"));
        assert_eq!(rx.try_recv().unwrap().message, "<RCV> [INVALID] 10.0.0.2:5000 ID=?");
    }

    #[tokio::test]
    async fn test_receiver_continues_after_transient_error() {
        let mock = MockSocket::new();
        let history = Arc::new(TelemetryHistory::new());
        let status = StatusSink::new(false);
        let mut rx = status.subscribe();

        mock.push_datagram(&frame(1), source());
        mock.push_error(io::ErrorKind::ConnectionReset);
        mock.push_datagram(&frame(2), source());
        mock.close();

        let result = spawn_receiver(Arc::new(mock), Arc::clone(&history), status)
            .await
            .unwrap();

        assert!(matches!(result, Err(KipError::Transport(_))));
        assert_eq!(history.len(), 2);

        let messages: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|line| line.message)
            .collect();
        assert_eq!(messages.len(), 4);
        assert!(messages[0].starts_with("<RCV> [VALID]"));
        assert!(messages[1].starts_with("Problem receiving response:"));
        assert!(messages[2].starts_with("<RCV> [VALID]"));
        assert!(messages[3].starts_with("Problem receiving response:"));
    }

    #[tokio::test]
    async fn test_fatal_error_faults_once() {
        let mock = MockSocket::new();
        let history = Arc::new(TelemetryHistory::new());
        let status = StatusSink::new(false);
        let mut rx = status.subscribe();

        mock.push_error(io::ErrorKind::BrokenPipe);
        mock.push_datagram(&frame(1), source());

        let result = run_receiver(&mock, &history, &status).await;

        assert!(matches!(result, Err(KipError::Transport(_))));
        assert!(history.is_empty());
        assert!(rx.try_recv().unwrap().message.starts_with("Problem receiving response:"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_abort_stops_receiver() {
        let mock = MockSocket::new();
        let handle = spawn_receiver(
            Arc::new(mock.clone()),
            Arc::new(TelemetryHistory::new()),
            StatusSink::new(false),
        );

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }
}
