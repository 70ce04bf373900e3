//! # Operator Console
//!
//! Session facade tying one socket, one history and one status stream to the
//! operations a front end needs.
//!
//! Every operation takes the raw text the operator typed. Bad text is
//! reported as one status line and nothing is sent.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::error::{KipError, Result};
use crate::telemetry::history::TelemetryHistory;
use crate::transport::command::{self, Command};
use crate::transport::poller::{spawn_poller, LiveDisplay};
use crate::transport::receiver::spawn_receiver;
use crate::transport::sender::{self, spawn_burst, BurstHandle, BurstPlan};
use crate::transport::socket::{self as udp, DatagramSocket};
use crate::transport::status::{StatusLine, StatusSink};

/// One operator session
pub struct Console {
    socket: Arc<dyn DatagramSocket>,
    local_addr: Option<SocketAddr>,
    history: Arc<TelemetryHistory>,
    status: StatusSink,
    config: Config,
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("local_addr", &self.local_addr)
            .field("records", &self.history.len())
            .finish_non_exhaustive()
    }
}

impl Console {
    /// Bind a UDP socket at the configured address and start a session
    ///
    /// # Errors
    ///
    /// Returns `Transport` error if the socket cannot be bound
    pub async fn bind(config: Config) -> Result<Self> {
        let socket = udp::bind(&config.network.bind_address).await.map_err(|e| {
            KipError::Transport(format!("bind {} failed: {}", config.network.bind_address, e))
        })?;
        let local_addr = socket.local_addr().ok();

        let mut console = Self::with_socket(Arc::new(socket), config);
        console.local_addr = local_addr;
        Ok(console)
    }

    /// Start a session on an existing socket
    pub fn with_socket(socket: Arc<dyn DatagramSocket>, config: Config) -> Self {
        let status = StatusSink::new(config.status.debug);
        Self {
            socket,
            local_addr: None,
            history: Arc::new(TelemetryHistory::new()),
            status,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn history(&self) -> &Arc<TelemetryHistory> {
        &self.history
    }

    pub fn status(&self) -> &StatusSink {
        &self.status
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusLine> {
        self.status.subscribe()
    }

    /// Bound address, when the session owns a real UDP socket
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Publish the operator-facing line for a rejected request
    fn reject(&self, error: KipError) -> KipError {
        match &error {
            KipError::InvalidArgument(detail) => {
                self.status.publish(format!("Unknown port or id: {}", detail));
            }
            KipError::Transport(detail) => {
                self.status.publish(format!("Can not connect to host: {}", detail));
            }
            other => {
                self.status.publish(other.to_string());
            }
        }
        error
    }

    /// Resolve operator text to the board's socket address
    pub async fn target(&self, address: &str, port: &str) -> Result<SocketAddr> {
        let port = command::parse_port(port).map_err(|e| self.reject(e))?;
        command::resolve_from(address, port, self.local_addr)
            .await
            .map_err(|e| self.reject(e))
    }

    /// Send an already parsed command
    ///
    /// # Errors
    ///
    /// Returns error if the target does not resolve or the write fails
    pub async fn send_command(&self, address: &str, port: &str, command: Command) -> Result<()> {
        let target = self.target(address, port).await?;
        sender::spawn_command(Arc::clone(&self.socket), target, command, self.status.clone())
            .await
            .map_err(|e| KipError::Transport(format!("send task failed: {}", e)))?
    }

    /// Ask the board for one telemetry frame
    pub async fn send_trigger(&self, address: &str, port: &str) -> Result<()> {
        self.send_command(address, port, Command::Trigger).await
    }

    pub async fn send_id(&self, address: &str, port: &str, id: &str) -> Result<()> {
        let id = command::parse_id(id).map_err(|e| self.reject(e))?;
        self.send_command(address, port, Command::SetId(id)).await
    }

    pub async fn send_ip(&self, address: &str, port: &str, ip: &str) -> Result<()> {
        let ip = command::parse_ip(ip).map_err(|e| self.reject(e))?;
        self.send_command(address, port, Command::SetIp(ip)).await
    }

    pub async fn send_mac(&self, address: &str, port: &str, mac: &str) -> Result<()> {
        let mac = command::parse_mac(mac).map_err(|e| self.reject(e))?;
        self.send_command(address, port, Command::SetMac(mac)).await
    }

    pub async fn send_delay(&self, address: &str, port: &str, delay_ms: &str) -> Result<()> {
        let delay_ms = command::parse_delay(delay_ms).map_err(|e| self.reject(e))?;
        self.send_command(address, port, Command::SetDelay(delay_ms)).await
    }

    pub async fn send_reset(&self, address: &str, port: &str) -> Result<()> {
        self.send_command(address, port, Command::Reset).await
    }

    /// Start a cancellable trigger burst
    ///
    /// # Arguments
    ///
    /// * `hertz` - Triggers per second, greater than 0
    /// * `seconds` - Burst length; zero or negative runs until cancelled
    ///
    /// # Returns
    ///
    /// * `Result<BurstHandle>` - Handle to cancel or join the burst
    pub async fn send_trigger_burst(
        &self,
        address: &str,
        port: &str,
        hertz: &str,
        seconds: &str,
    ) -> Result<BurstHandle> {
        let plan = command::parse_hertz(hertz)
            .and_then(|hertz| Ok((hertz, command::parse_seconds(seconds)?)))
            .and_then(|(hertz, seconds)| BurstPlan::new(hertz, seconds))
            .map_err(|e| self.reject(e))?;
        let target = self.target(address, port).await?;

        info!("Trigger burst to {} at {}Hz for {}s", target, plan.hertz, plan.seconds);
        Ok(spawn_burst(
            Arc::clone(&self.socket),
            target,
            plan,
            self.status.clone(),
            CancellationToken::new(),
        ))
    }

    /// Start the receive loop; abort the handle to stop it
    pub fn start_receiving(&self) -> JoinHandle<Result<()>> {
        spawn_receiver(
            Arc::clone(&self.socket),
            Arc::clone(&self.history),
            self.status.clone(),
        )
    }

    /// Poll the live buffer at the configured refresh rate
    pub fn start_polling<D: LiveDisplay + 'static>(&self, display: D) -> JoinHandle<()> {
        self.start_polling_at(self.config.realtime.refresh_hz, display)
    }

    pub fn start_polling_at<D: LiveDisplay + 'static>(&self, refresh_hz: u32, display: D) -> JoinHandle<()> {
        spawn_poller(Arc::clone(&self.history), refresh_hz, display)
    }
}
