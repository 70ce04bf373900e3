//! # Frame Checksum
//!
//! 8-bit wrapping sum used by both KiP frame layouts.
//!
//! **Covered bytes**: every byte of the frame except the checksum byte itself
//! **Width**: 8 bits, modulo-256 (no carry, no complement)

use super::protocol::FrameKind;

/// Calculate the checksum of a frame
///
/// Sums every byte except the one at `kind.checksum_index()`. Works on any
/// slice length so that a datagram of the wrong size can still be inspected;
/// a slice too short to contain the checksum position is summed in full.
///
/// # Arguments
///
/// * `data` - Frame bytes
/// * `kind` - Frame layout that decides which byte is skipped
///
/// # Returns
///
/// * `u8` - Wrapping sum of the covered bytes
///
/// # Examples
///
/// ```
/// use kip_console::frame::checksum::checksum;
/// use kip_console::frame::protocol::FrameKind;
///
/// let frame = [0xBC, 0x01, 0, 0, 0, 0, 0, 0, 0, 0xFF, 0xCB];
/// assert_eq!(checksum(&frame, FrameKind::Command), 0xBC_u8.wrapping_add(0x01).wrapping_add(0xCB));
/// ```
pub fn checksum(data: &[u8], kind: FrameKind) -> u8 {
    let skip = kind.checksum_index();

    data.iter()
        .enumerate()
        .filter(|&(index, _)| index != skip)
        .fold(0u8, |sum, (_, &byte)| sum.wrapping_add(byte))
}

/// Reference checksum with explicit integer widening (slow, for verification)
///
/// Sums into a `u32` and truncates once at the end; must agree with
/// [`checksum`] for every input.
#[cfg(test)]
fn checksum_widened(data: &[u8], kind: FrameKind) -> u8 {
    let mut sum: u32 = 0;

    for (index, &byte) in data.iter().enumerate() {
        if index != kind.checksum_index() {
            sum += u32::from(byte);
        }
    }

    (sum % 256) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::protocol::*;

    #[test]
    fn test_checksum_empty() {
        assert_eq!(checksum(&[], FrameKind::Command), 0x00);
        assert_eq!(checksum(&[], FrameKind::Telemetry), 0x00);
    }

    #[test]
    fn test_checksum_skips_checksum_byte() {
        let mut frame = [0u8; COMMAND_FRAME_SIZE];
        frame[0] = 0x10;
        frame[COMMAND_CHECKSUM_INDEX] = 0xAA;
        assert_eq!(checksum(&frame, FrameKind::Command), 0x10);

        frame[COMMAND_CHECKSUM_INDEX] = 0x55;
        assert_eq!(checksum(&frame, FrameKind::Command), 0x10);
    }

    #[test]
    fn test_checksum_wraps_at_256() {
        let frame = [0xFF, 0xFF, 0x02];
        // 0xFF + 0xFF + 0x02 = 0x200 -> 0x00
        assert_eq!(checksum(&frame, FrameKind::Telemetry), 0x00);
    }

    #[test]
    fn test_checksum_high_bytes_do_not_sign_extend() {
        // 0x80 + 0x80 = 0x100 -> 0x00; 0xBF + 0xFB = 0x1BA -> 0xBA
        assert_eq!(checksum(&[0x80, 0x80], FrameKind::Telemetry), 0x00);
        assert_eq!(checksum(&[0xBF, 0xFB], FrameKind::Telemetry), 0xBA);
    }

    #[test]
    fn test_checksum_is_order_independent() {
        let mut frame = [0u8; COMMAND_FRAME_SIZE];
        for (i, byte) in frame.iter_mut().enumerate() {
            *byte = (i as u8).wrapping_mul(37).wrapping_add(200);
        }
        let before = checksum(&frame, FrameKind::Command);

        // Swap two bytes that are neither header, footer nor checksum
        frame.swap(2, 7);
        assert_eq!(checksum(&frame, FrameKind::Command), before);
    }

    #[test]
    fn test_checksum_uses_frame_kind_index() {
        let mut frame = [1u8; TELEMETRY_FRAME_SIZE];
        frame[COMMAND_CHECKSUM_INDEX] = 100;

        // Telemetry skips index 400, so index 9 is counted
        let telemetry = checksum(&frame, FrameKind::Telemetry);
        // Command skips index 9, so index 400 is counted
        let command = checksum(&frame, FrameKind::Command);

        assert_eq!(telemetry, checksum_widened(&frame, FrameKind::Telemetry));
        assert_eq!(command, checksum_widened(&frame, FrameKind::Command));
        assert_ne!(telemetry, command);
    }

    #[test]
    fn test_checksum_matches_widened_reference() {
        let test_data = [
            vec![0x01, 0x02, 0x03],
            vec![0xFF, 0xFE, 0xFD],
            vec![0xBC, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xCB],
            vec![0xFF; TELEMETRY_FRAME_SIZE],
            vec![0x80; 10],
        ];

        for data in test_data.iter() {
            for kind in [FrameKind::Command, FrameKind::Telemetry] {
                assert_eq!(
                    checksum(data, kind),
                    checksum_widened(data, kind),
                    "Checksum mismatch for data: {:?}",
                    data
                );
            }
        }
    }
}
