//! # Error Types
//!
//! Custom error types for KiP Console using `thiserror`.

use thiserror::Error;

/// Main error type for KiP Console
#[derive(Debug, Error)]
pub enum KipError {
    /// Malformed operator input (address, port, id, IP, MAC, delay, rate)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Frame structure errors
    #[error("Frame error: {0}")]
    Frame(String),

    /// Socket creation, send, or receive failures
    #[error("Transport error: {0}")]
    Transport(String),

    /// Saved history that cannot be parsed back into records
    #[error("Archive error: {0}")]
    Archive(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader/writer errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for KiP Console
pub type Result<T> = std::result::Result<T, KipError>;
