//! # KiP Frame Constants and Types
//!
//! Byte layouts for the two fixed-size frames exchanged with a KiP board.
//!
//! ```text
//! Command frame (console -> board), 11 bytes:
//!   [0] header 0xBC | [1] command | [2] arg1 | [3..=8] arg2 | [9] checksum | [10] footer 0xCB
//!
//! Telemetry frame (board -> console), 402 bytes:
//!   [0] header 0xBF | [1] device id | [2..=385] samples | [386..=387] delay (BE)
//!   [388..=399] reserved | [400] checksum | [401] footer 0xFB
//! ```

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Command frame header byte
pub const COMMAND_HEADER: u8 = 0xBC;

/// Command frame footer byte
pub const COMMAND_FOOTER: u8 = 0xCB;

/// Total command frame size
pub const COMMAND_FRAME_SIZE: usize = 11;

pub const COMMAND_HEADER_INDEX: usize = 0;
pub const COMMAND_CODE_INDEX: usize = 1;
pub const COMMAND_ARG1_INDEX: usize = 2;
/// First byte of the 6-byte second argument
pub const COMMAND_ARG2_INDEX: usize = 3;
pub const COMMAND_CHECKSUM_INDEX: usize = 9;
pub const COMMAND_FOOTER_INDEX: usize = 10;

/// Length of the second command argument
pub const COMMAND_ARG2_SIZE: usize = 6;

/// Telemetry frame header byte
pub const TELEMETRY_HEADER: u8 = 0xBF;

/// Telemetry frame footer byte
pub const TELEMETRY_FOOTER: u8 = 0xFB;

/// Total telemetry frame size
pub const TELEMETRY_FRAME_SIZE: usize = 402;

pub const TELEMETRY_HEADER_INDEX: usize = 0;
pub const TELEMETRY_ID_INDEX: usize = 1;
/// First byte of the interleaved sample block
pub const TELEMETRY_SAMPLES_INDEX: usize = 2;
pub const TELEMETRY_DELAY_HIGH_INDEX: usize = 386;
pub const TELEMETRY_DELAY_LOW_INDEX: usize = 387;
pub const TELEMETRY_RESERVED_INDEX: usize = 388;
pub const TELEMETRY_RESERVED_SIZE: usize = 12;
pub const TELEMETRY_CHECKSUM_INDEX: usize = 400;
pub const TELEMETRY_FOOTER_INDEX: usize = 401;

/// Samples per channel in one telemetry frame
pub const SAMPLES_PER_CHANNEL: usize = 64;

/// Number of interleaved channels (voltage, current 1, current 2)
pub const CHANNEL_COUNT: usize = 3;

/// Bytes per 10-bit sample (big-endian pair)
pub const BYTES_PER_SAMPLE: usize = 2;

/// Bytes per interleaved sample group (one sample of each channel)
pub const SAMPLE_STRIDE: usize = CHANNEL_COUNT * BYTES_PER_SAMPLE;

/// Size of the sample block (64 × 3 × 2 = 384 bytes)
pub const SAMPLE_BLOCK_SIZE: usize = SAMPLES_PER_CHANNEL * SAMPLE_STRIDE;

/// Largest value a 10-bit ADC sample can take
pub const SAMPLE_VALUE_MAX: u16 = 1023;

/// Raw command frame bytes
pub type CommandBytes = [u8; COMMAND_FRAME_SIZE];

/// Raw telemetry frame bytes
pub type TelemetryBytes = [u8; TELEMETRY_FRAME_SIZE];

/// Which of the two frame layouts a byte sequence should be checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// Console to board
    Command,
    /// Board to console
    Telemetry,
}

impl FrameKind {
    /// Fixed frame length for this kind
    pub const fn size(self) -> usize {
        match self {
            FrameKind::Command => COMMAND_FRAME_SIZE,
            FrameKind::Telemetry => TELEMETRY_FRAME_SIZE,
        }
    }

    pub const fn header(self) -> u8 {
        match self {
            FrameKind::Command => COMMAND_HEADER,
            FrameKind::Telemetry => TELEMETRY_HEADER,
        }
    }

    pub const fn footer(self) -> u8 {
        match self {
            FrameKind::Command => COMMAND_FOOTER,
            FrameKind::Telemetry => TELEMETRY_FOOTER,
        }
    }

    pub const fn header_index(self) -> usize {
        match self {
            FrameKind::Command => COMMAND_HEADER_INDEX,
            FrameKind::Telemetry => TELEMETRY_HEADER_INDEX,
        }
    }

    pub const fn footer_index(self) -> usize {
        match self {
            FrameKind::Command => COMMAND_FOOTER_INDEX,
            FrameKind::Telemetry => TELEMETRY_FOOTER_INDEX,
        }
    }

    /// Position of the checksum byte, which is excluded from the sum
    pub const fn checksum_index(self) -> usize {
        match self {
            FrameKind::Command => COMMAND_CHECKSUM_INDEX,
            FrameKind::Telemetry => TELEMETRY_CHECKSUM_INDEX,
        }
    }
}

/// Command codes understood by the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum CommandCode {
    /// Take one measurement and send a telemetry frame back
    Trigger = 0x01,
    /// Set the board id (applied after reset)
    SetId = 0x02,
    SetIp = 0x03,
    SetMac = 0x04,
    /// Set the delay field reported in telemetry
    SetDelay = 0x05,
    /// Revert to default id/IP/MAC
    Reset = 0x0F,
}

/// Decoded command frame fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame {
    pub code: CommandCode,
    pub arg1: u8,
    pub arg2: [u8; COMMAND_ARG2_SIZE],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_sizes_match_layout() {
        assert_eq!(COMMAND_FRAME_SIZE, 11);
        assert_eq!(TELEMETRY_FRAME_SIZE, 402);
        assert_eq!(SAMPLE_BLOCK_SIZE, 384);
        assert_eq!(TELEMETRY_SAMPLES_INDEX + SAMPLE_BLOCK_SIZE, TELEMETRY_DELAY_HIGH_INDEX);
        assert_eq!(TELEMETRY_RESERVED_INDEX + TELEMETRY_RESERVED_SIZE, TELEMETRY_CHECKSUM_INDEX);
        assert_eq!(COMMAND_ARG2_INDEX + COMMAND_ARG2_SIZE, COMMAND_CHECKSUM_INDEX);
    }

    #[test]
    fn test_frame_kind_accessors() {
        assert_eq!(FrameKind::Command.size(), 11);
        assert_eq!(FrameKind::Command.header(), 0xBC);
        assert_eq!(FrameKind::Command.footer(), 0xCB);
        assert_eq!(FrameKind::Command.checksum_index(), 9);
        assert_eq!(FrameKind::Telemetry.size(), 402);
        assert_eq!(FrameKind::Telemetry.header(), 0xBF);
        assert_eq!(FrameKind::Telemetry.footer(), 0xFB);
        assert_eq!(FrameKind::Telemetry.checksum_index(), 400);
        assert_eq!(FrameKind::Telemetry.footer_index(), 401);
    }

    #[test]
    fn test_command_codes() {
        assert_eq!(u8::from(CommandCode::Trigger), 0x01);
        assert_eq!(u8::from(CommandCode::Reset), 0x0F);
        assert_eq!(CommandCode::try_from(0x04).ok(), Some(CommandCode::SetMac));
        assert!(CommandCode::try_from(0x06).is_err());
    }
}
