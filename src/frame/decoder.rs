//! # KiP Frame Decoder
//!
//! Validates received frames and decodes command frames.

use thiserror::Error;

use super::checksum::checksum;
use super::protocol::*;
use crate::error::{KipError, Result};

/// First check a frame failed, in the order the checks are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameDefect {
    /// Frame length differs from the fixed size of its kind
    #[error("length mismatch: expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
    /// Header byte is not the protocol constant
    #[error("invalid header: expected 0x{expected:02X}, got 0x{actual:02X}")]
    Header { expected: u8, actual: u8 },
    /// Footer byte is not the protocol constant
    #[error("invalid footer: expected 0x{expected:02X}, got 0x{actual:02X}")]
    Footer { expected: u8, actual: u8 },
    /// Stored checksum differs from the recomputed one
    #[error("checksum mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    Checksum { expected: u8, actual: u8 },
}

/// Check a frame and report the first failed check
///
/// Checks run in priority order: length, header, footer, checksum.
///
/// # Arguments
///
/// * `data` - Frame bytes
/// * `kind` - Expected frame layout
///
/// # Errors
///
/// Returns the first [`FrameDefect`] found.
pub fn validate(data: &[u8], kind: FrameKind) -> std::result::Result<(), FrameDefect> {
    if data.len() != kind.size() {
        return Err(FrameDefect::Length {
            expected: kind.size(),
            actual: data.len(),
        });
    }

    let header = data[kind.header_index()];
    if header != kind.header() {
        return Err(FrameDefect::Header {
            expected: kind.header(),
            actual: header,
        });
    }

    let footer = data[kind.footer_index()];
    if footer != kind.footer() {
        return Err(FrameDefect::Footer {
            expected: kind.footer(),
            actual: footer,
        });
    }

    let stored = data[kind.checksum_index()];
    let calculated = checksum(data, kind);
    if stored != calculated {
        return Err(FrameDefect::Checksum {
            expected: calculated,
            actual: stored,
        });
    }

    Ok(())
}

/// Whether a frame passes every check for its kind
///
/// Never panics; any byte slice is accepted.
pub fn is_valid(data: &[u8], kind: FrameKind) -> bool {
    validate(data, kind).is_ok()
}

/// Decode a complete command frame
///
/// # Errors
///
/// Returns error if:
/// - Frame fails validation
/// - Command code is unknown
pub fn decode_command(data: &[u8]) -> Result<CommandFrame> {
    validate(data, FrameKind::Command).map_err(|defect| KipError::Frame(defect.to_string()))?;

    let code = CommandCode::try_from(data[COMMAND_CODE_INDEX]).map_err(|_| {
        KipError::Frame(format!("Unknown command code: 0x{:02X}", data[COMMAND_CODE_INDEX]))
    })?;

    let mut arg2 = [0u8; COMMAND_ARG2_SIZE];
    arg2.copy_from_slice(&data[COMMAND_ARG2_INDEX..COMMAND_ARG2_INDEX + COMMAND_ARG2_SIZE]);

    Ok(CommandFrame {
        code,
        arg1: data[COMMAND_ARG1_INDEX],
        arg2,
    })
}

/// View a datagram as a telemetry frame if it has the fixed telemetry length
///
/// Only the length is checked: header, footer and checksum are left to
/// [`validate`] so a frame with a bad checksum can still be decoded.
pub fn telemetry_frame(data: &[u8]) -> Option<TelemetryBytes> {
    TelemetryBytes::try_from(data).ok()
}
