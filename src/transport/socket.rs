//! Trait abstraction for datagram socket operations to enable testing

use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;

use tokio::net::UdpSocket;

/// Trait for datagram socket I/O operations
///
/// Takes `&self` so one socket can be shared by the receiver and any number
/// of concurrent senders behind an `Arc`.
#[async_trait]
pub trait DatagramSocket: Send + Sync {
    /// Send one datagram to `target`
    async fn send_to(&self, data: &[u8], target: SocketAddr) -> io::Result<usize>;

    /// Wait for one datagram, returning its length and source
    async fn recv_from(&self, buffer: &mut [u8]) -> io::Result<(usize, SocketAddr)>;
}

#[async_trait]
impl DatagramSocket for UdpSocket {
    async fn send_to(&self, data: &[u8], target: SocketAddr) -> io::Result<usize> {
        UdpSocket::send_to(self, data, target).await
    }

    async fn recv_from(&self, buffer: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        UdpSocket::recv_from(self, buffer).await
    }
}

/// Bind a UDP socket for console traffic
///
/// # Arguments
///
/// * `bind_address` - Local address, e.g. `0.0.0.0:0` for any port
///
/// # Errors
///
/// Returns error if the address is malformed or cannot be bound
pub async fn bind(bind_address: &str) -> io::Result<UdpSocket> {
    let socket = UdpSocket::bind(bind_address).await?;
    tracing::info!("Bound UDP socket on {}", socket.local_addr()?);
    Ok(socket)
}

/// Whether a receive error means the socket is gone for good
pub fn is_fatal(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::NotConnected
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::Unsupported
    )
}


#[cfg(test)]
mod tests {
    use super::mocks::MockSocket;
    use super::*;

    #[test]
    fn test_fatal_error_kinds() {
        for kind in [
            io::ErrorKind::NotConnected,
            io::ErrorKind::BrokenPipe,
            io::ErrorKind::ConnectionAborted,
            io::ErrorKind::AddrNotAvailable,
            io::ErrorKind::Unsupported,
        ] {
            assert!(is_fatal(&io::Error::new(kind, "x")), "{:?} should be fatal", kind);
        }
    }

    #[test]
    fn test_transient_error_kinds() {
        for kind in [
            io::ErrorKind::ConnectionRefused,
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::WouldBlock,
            io::ErrorKind::Interrupted,
            io::ErrorKind::TimedOut,
        ] {
            assert!(!is_fatal(&io::Error::new(kind, "x")), "{:?} should not be fatal", kind);
        }
    }

    #[tokio::test]
    async fn test_udp_loopback() {
        let a = bind("127.0.0.1:0").await.unwrap();
        let b = bind("127.0.0.1:0").await.unwrap();
        let b_addr = b.local_addr().unwrap();

        let sent = DatagramSocket::send_to(&a, &[1, 2, 3], b_addr).await.unwrap();
        assert_eq!(sent, 3);

        let mut buffer = [0u8; 16];
        let (len, source) = DatagramSocket::recv_from(&b, &mut buffer).await.unwrap();
        assert_eq!(&buffer[..len], &[1, 2, 3]);
        assert_eq!(source, a.local_addr().unwrap());
    }

    #[tokio::test]
    async fn test_bind_rejects_malformed_address() {
        assert!(bind("not an address").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_records_sends() {
        let mock = MockSocket::new();
        let target: SocketAddr = "10.0.0.2:5000".parse().unwrap();

        mock.send_to(&[0xBC, 0x01], target).await.unwrap();
        assert_eq!(mock.get_sent_data(), vec![(vec![0xBC, 0x01], target)]);

        mock.set_send_error(io::ErrorKind::PermissionDenied);
        let err = mock.send_to(&[0xBC], target).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(mock.get_sent_data().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_delivers_then_reports_closed() {
        let mock = MockSocket::new();
        let source: SocketAddr = "10.0.0.2:5000".parse().unwrap();
        mock.push_datagram(&[9, 8, 7], source);
        mock.close();

        let mut buffer = [0u8; 8];
        let (len, from) = mock.recv_from(&mut buffer).await.unwrap();
        assert_eq!((&buffer[..len], from), (&[9u8, 8, 7][..], source));

        let err = mock.recv_from(&mut buffer).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }
}
