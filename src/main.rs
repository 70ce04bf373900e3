//! # KiP Console
//!
//! Command line operator console for KiP power measurement boards.
//!
//! Sends commands to a board over UDP, listens for telemetry, and prints the
//! live measurements as JSON lines.
//!
//! # Examples
//!
//! ```bash
//! kip-console --address 192.168.1.20 listen --save history.csv
//! kip-console trigger --hertz 10 --seconds -1
//! kip-console set-delay 250
//! kip-console history history.csv
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::{broadcast, mpsc};
use tokio::time::Duration;
use tracing::{info, warn};

use kip_console::config::Config;
use kip_console::console::Console;
use kip_console::logging;
use kip_console::telemetry::archive;
use kip_console::telemetry::history::TelemetryHistory;
use kip_console::transport::poller::LiveUpdate;
use kip_console::transport::status::StatusLine;

/// How long to wait for the last status lines on exit
const STATUS_DRAIN_TIMEOUT: Duration = Duration::from_millis(200);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Board host name or IP, overriding the configuration
    #[arg(short, long, global = true)]
    address: Option<String>,

    /// Board UDP port, overriding the configuration
    #[arg(short, long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Receive telemetry and print live measurements until Ctrl+C
    Listen {
        /// Write the received history here on exit
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Run a trigger burst while listening
    Trigger {
        /// Triggers per second
        #[arg(long)]
        hertz: Option<u32>,

        /// Burst length; zero or negative runs until Ctrl+C
        #[arg(long, allow_hyphen_values = true)]
        seconds: Option<i64>,

        /// Write the received history here on exit
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Assign the board id (-128..=127), defaulting to `device.id`
    SetId {
        #[arg(allow_hyphen_values = true)]
        id: Option<String>,
    },
    /// Assign the board IPv4 address
    SetIp { ip: String },
    /// Assign the board MAC address, defaulting to `device.mac`
    SetMac { mac: Option<String> },
    /// Set the sampling delay in milliseconds
    SetDelay { delay_ms: String },
    /// Restart the board
    Reset,
    /// Print the measurements of a saved history file
    History { path: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(address) = &cli.address {
        config.device.address = address.clone();
    }
    if let Some(port) = cli.port {
        config.device.port = port;
    }
    config.validate()?;

    let _log_guard = logging::init(&config.logging)?;
    info!("KiP Console v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Commands::History { path } = &cli.command {
        return print_history(path);
    }

    let console = Console::bind(config).await?;
    let mut printer = tokio::spawn(print_status(console.subscribe()));

    let address = console.config().device.address.clone();
    let port = console.config().device.port.to_string();

    let result = match cli.command {
        Commands::Listen { save } => {
            listen(&console).await;
            save_history(&console, save.as_deref())
        }
        Commands::Trigger { hertz, seconds, save } => {
            let hertz = hertz.unwrap_or(console.config().trigger.hertz).to_string();
            let seconds = seconds.unwrap_or(console.config().trigger.duration_s).to_string();
            trigger(&console, &address, &port, &hertz, &seconds)
                .await
                .and_then(|()| save_history(&console, save.as_deref()))
        }
        Commands::SetId { id } => {
            let id = id_text(id, console.config());
            console.send_id(&address, &port, &id).await.map_err(Into::into)
        }
        Commands::SetIp { ip } => console.send_ip(&address, &port, &ip).await.map_err(Into::into),
        Commands::SetMac { mac } => {
            let mac = mac_text(mac, console.config());
            console.send_mac(&address, &port, &mac).await.map_err(Into::into)
        }
        Commands::SetDelay { delay_ms } => {
            console.send_delay(&address, &port, &delay_ms).await.map_err(Into::into)
        }
        Commands::Reset => console.send_reset(&address, &port).await.map_err(Into::into),
        Commands::History { .. } => Ok(()),
    };

    // Aborted workers may still hold a sink clone; give the printer a moment
    drop(console);
    if tokio::time::timeout(STATUS_DRAIN_TIMEOUT, &mut printer).await.is_err() {
        printer.abort();
    }

    result
}

/// Id argument, falling back to the configured id
fn id_text(id: Option<String>, config: &Config) -> String {
    id.unwrap_or_else(|| config.device.id.to_string())
}

/// MAC argument, falling back to the configured MAC
///
/// An empty configured MAC is rejected by the console like any bad input.
fn mac_text(mac: Option<String>, config: &Config) -> String {
    mac.unwrap_or_else(|| config.device.mac.clone())
}

/// Print status lines until the console is dropped
async fn print_status(mut rx: broadcast::Receiver<StatusLine>) {
    loop {
        match rx.recv().await {
            Ok(line) => println!("{}", line),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Status display skipped {} lines", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Print one live update as a JSON line of measurements, or `no data`
fn print_update(update: &LiveUpdate) {
    match update {
        LiveUpdate::NoData => println!("no data"),
        LiveUpdate::Record(record) => match serde_json::to_string(record.measurements()) {
            Ok(json) => println!("{}", json),
            Err(e) => warn!("Failed to serialize measurements: {}", e),
        },
    }
}

/// Receive and display until Ctrl+C
async fn listen(console: &Console) {
    let receiver = console.start_receiving();
    let (tx, mut rx) = mpsc::channel(console.config().realtime.buffer_size);
    let poller = console.start_polling(tx);

    info!("Listening, press Ctrl+C to exit");

    loop {
        tokio::select! {
            Some(update) = rx.recv() => print_update(&update),

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    receiver.abort();
    poller.abort();
    info!("Total records received: {}", console.history().len());
}

/// Listen while a trigger burst runs; Ctrl+C cancels the burst
async fn trigger(console: &Console, address: &str, port: &str, hertz: &str, seconds: &str) -> Result<()> {
    let receiver = console.start_receiving();
    let (tx, mut rx) = mpsc::channel(console.config().realtime.buffer_size);
    let poller = console.start_polling(tx);

    let burst = match console.send_trigger_burst(address, port, hertz, seconds).await {
        Ok(burst) => burst,
        Err(e) => {
            receiver.abort();
            poller.abort();
            return Err(e.into());
        }
    };
    let cancel = burst.cancel_token();
    let mut burst_task = tokio::spawn(burst.join());

    let outcome = loop {
        tokio::select! {
            Some(update) = rx.recv() => print_update(&update),

            joined = &mut burst_task => break joined,

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, cancelling burst...");
                cancel.cancel();
            }
        }
    };

    receiver.abort();
    poller.abort();

    let outcome = outcome.context("burst task panicked")??;
    info!(
        "Burst finished: {:?}, {} records received",
        outcome,
        console.history().len()
    );
    Ok(())
}

fn save_history(console: &Console, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        archive::save(path, console.history())
            .with_context(|| format!("saving history to {}", path.display()))?;
    }
    Ok(())
}

/// Print each archived record as a JSON line
fn print_history(path: &Path) -> Result<()> {
    let history = TelemetryHistory::new();
    archive::load(path, &history).with_context(|| format!("loading history from {}", path.display()))?;

    for record in history.snapshot() {
        let line = serde_json::json!({
            "received_at": record.received_at().to_rfc3339(),
            "device_id": record.device_id(),
            "valid": record.is_valid(),
            "measurements": record.measurements(),
        });
        println!("{}", line);
    }
    Ok(())
}
