//! # KiP Frame Encoder
//!
//! Builds command frames for the board and telemetry frames in the board's
//! layout (used by tests and loopback tooling).

use super::checksum::checksum;
use super::protocol::*;

/// Encode a command frame
///
/// # Arguments
///
/// * `code` - Command to send
/// * `arg1` - First argument byte (board id for `SetId`, otherwise 0)
/// * `arg2` - Six-byte second argument (IP, MAC, delay, or zeros)
///
/// # Returns
///
/// * `CommandBytes` - Complete 11-byte frame with checksum
///
/// # Examples
///
/// ```
/// use kip_console::frame::encoder::encode_command;
/// use kip_console::frame::protocol::CommandCode;
///
/// let frame = encode_command(CommandCode::Trigger, 0, [0; 6]);
/// assert_eq!(frame.len(), 11);
/// assert_eq!(frame[0], 0xBC);
/// ```
pub fn encode_command(code: CommandCode, arg1: u8, arg2: [u8; COMMAND_ARG2_SIZE]) -> CommandBytes {
    let mut frame = [0u8; COMMAND_FRAME_SIZE];

    frame[COMMAND_HEADER_INDEX] = COMMAND_HEADER;
    frame[COMMAND_CODE_INDEX] = code.into();
    frame[COMMAND_ARG1_INDEX] = arg1;
    frame[COMMAND_ARG2_INDEX..COMMAND_ARG2_INDEX + COMMAND_ARG2_SIZE].copy_from_slice(&arg2);
    frame[COMMAND_FOOTER_INDEX] = COMMAND_FOOTER;
    frame[COMMAND_CHECKSUM_INDEX] = checksum(&frame, FrameKind::Command);

    frame
}

/// Encode a telemetry frame
///
/// Samples are written two bytes each, big-endian, interleaved in 6-byte
/// groups (voltage, current 1, current 2). Delay and reserved bytes are zero.
///
/// # Arguments
///
/// * `device_id` - Board id byte
/// * `voltage` - 64 voltage samples
/// * `current_1` - 64 current channel 1 samples
/// * `current_2` - 64 current channel 2 samples
///
/// # Returns
///
/// * `TelemetryBytes` - Complete 402-byte frame with checksum
pub fn encode_telemetry(
    device_id: u8,
    voltage: &[u16; SAMPLES_PER_CHANNEL],
    current_1: &[u16; SAMPLES_PER_CHANNEL],
    current_2: &[u16; SAMPLES_PER_CHANNEL],
) -> TelemetryBytes {
    let mut frame = [0u8; TELEMETRY_FRAME_SIZE];

    frame[TELEMETRY_HEADER_INDEX] = TELEMETRY_HEADER;
    frame[TELEMETRY_ID_INDEX] = device_id;

    let block = &mut frame[TELEMETRY_SAMPLES_INDEX..TELEMETRY_SAMPLES_INDEX + SAMPLE_BLOCK_SIZE];
    for (channel, samples) in [voltage, current_1, current_2].into_iter().enumerate() {
        for (i, &value) in samples.iter().enumerate() {
            let offset = i * SAMPLE_STRIDE + channel * BYTES_PER_SAMPLE;
            block[offset..offset + BYTES_PER_SAMPLE].copy_from_slice(&encode_sample(value));
        }
    }

    frame[TELEMETRY_FOOTER_INDEX] = TELEMETRY_FOOTER;
    frame[TELEMETRY_CHECKSUM_INDEX] = checksum(&frame, FrameKind::Telemetry);

    frame
}

/// Encode one ADC sample as a big-endian byte pair
pub fn encode_sample(value: u16) -> [u8; BYTES_PER_SAMPLE] {
    value.to_be_bytes()
}
