//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and field is optional; missing values take the defaults
//! below. The loaded value is passed explicitly to each worker.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{KipError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub trigger: TriggerConfig,
    #[serde(default)]
    pub status: StatusConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Target board
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DeviceConfig {
    #[serde(default = "default_device_address")]
    pub address: String,

    #[serde(default = "default_device_port")]
    pub port: u16,

    /// Default id offered for `set-id`
    #[serde(default)]
    pub id: i8,

    /// Default MAC offered for `set-mac`
    #[serde(default)]
    pub mac: String,
}

/// Local socket
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct NetworkConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

/// Live display polling
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RealtimeConfig {
    /// Polls per second
    #[serde(default = "default_refresh_hz")]
    pub refresh_hz: u32,

    /// Live updates buffered for the display
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

/// Trigger burst defaults
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TriggerConfig {
    #[serde(default = "default_trigger_hertz")]
    pub hertz: u32,

    /// Zero or negative runs until cancelled
    #[serde(default = "default_trigger_duration_s")]
    pub duration_s: i64,
}

/// Status line options
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct StatusConfig {
    /// Append raw byte dumps to traffic lines
    #[serde(default)]
    pub debug: bool,
}

/// Log output
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct LoggingConfig {
    /// Directory for daily log files; empty logs to stderr only
    #[serde(default)]
    pub log_dir: String,
}

// Default value functions
fn default_device_address() -> String { "127.0.0.1".to_string() }
fn default_device_port() -> u16 { 5000 }

fn default_bind_address() -> String { "0.0.0.0:0".to_string() }

fn default_refresh_hz() -> u32 { 2 }
fn default_buffer_size() -> usize { 10 }

fn default_trigger_hertz() -> u32 { 1 }
fn default_trigger_duration_s() -> i64 { 1 }

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: default_device_address(),
            port: default_device_port(),
            id: 0,
            mac: String::new(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self { bind_address: default_bind_address() }
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            refresh_hz: default_refresh_hz(),
            buffer_size: default_buffer_size(),
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            hertz: default_trigger_hertz(),
            duration_s: default_trigger_duration_s(),
        }
    }
}

fn invalid(message: impl std::fmt::Display) -> KipError {
    KipError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use kip_console::config::Config;
    ///
    /// let config = Config::load("kip.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.device.address.trim().is_empty() {
            return Err(invalid("device address cannot be empty"));
        }

        if self.device.port == 0 {
            return Err(invalid("device port must be between 1 and 65535"));
        }

        if !self.device.mac.is_empty() {
            crate::transport::command::parse_mac(&self.device.mac)
                .map_err(|e| invalid(format!("device mac: {}", e)))?;
        }

        if self.network.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(invalid(format!(
                "bind_address '{}' must be an IP:port socket address",
                self.network.bind_address
            )));
        }

        if self.realtime.refresh_hz == 0 || self.realtime.refresh_hz > 100 {
            return Err(invalid("refresh_hz must be between 1 and 100"));
        }

        if self.realtime.buffer_size == 0 {
            return Err(invalid("buffer_size must be greater than 0"));
        }

        if self.trigger.hertz == 0 || self.trigger.hertz > 1000 {
            return Err(invalid("trigger hertz must be between 1 and 1000"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.device.address, "127.0.0.1");
        assert_eq!(config.device.port, 5000);
        assert_eq!(config.network.bind_address, "0.0.0.0:0");
        assert_eq!(config.realtime.refresh_hz, 2);
        assert_eq!(config.realtime.buffer_size, 10);
        assert_eq!(config.trigger.hertz, 1);
        assert_eq!(config.trigger.duration_s, 1);
        assert!(!config.status.debug);
        assert!(config.logging.log_dir.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::parse(
            r#"
            [device]
            address = "kip-board.local"
            id = -3

            [realtime]
            refresh_hz = 10

            [status]
            debug = true
            "#,
        )
        .unwrap();

        assert_eq!(config.device.address, "kip-board.local");
        assert_eq!(config.device.port, 5000);
        assert_eq!(config.device.id, -3);
        assert_eq!(config.realtime.refresh_hz, 10);
        assert_eq!(config.realtime.buffer_size, 10);
        assert!(config.status.debug);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[device]\nport = 6001\n\n[trigger]\nhertz = 20\nduration_s = -1").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.device.port, 6001);
        assert_eq!(config.trigger.hertz, 20);
        assert_eq!(config.trigger.duration_s, -1);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(Config::load("/nonexistent/kip.toml"), Err(KipError::Io(_))));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(Config::parse("[device\nport = 1"), Err(KipError::Config(_))));
        assert!(matches!(Config::parse("[device]\nport = \"x\""), Err(KipError::Config(_))));
    }

    #[test]
    fn test_invalid_refresh_hz() {
        let mut config = Config::default();
        config.realtime.refresh_hz = 0;
        assert!(config.validate().is_err());

        config.realtime.refresh_hz = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_buffer_size() {
        let mut config = Config::default();
        config.realtime.buffer_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_trigger_hertz() {
        let mut config = Config::default();
        config.trigger.hertz = 0;
        assert!(config.validate().is_err());

        config.trigger.hertz = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_device_fields() {
        let mut config = Config::default();
        config.device.address = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.device.port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.device.mac = "00:11:22".to_string();
        assert!(config.validate().is_err());

        config.device.mac = "00:11:22:33:44:55".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_bind_address() {
        let mut config = Config::default();
        config.network.bind_address = "localhost".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("bind_address"));
    }

    #[test]
    fn test_device_id_out_of_range() {
        assert!(Config::parse("[device]\nid = 200").is_err());
    }
}
