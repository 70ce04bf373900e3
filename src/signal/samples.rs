//! # ADC Sample De-interleaving
//!
//! Splits the 384-byte sample block of a telemetry frame into three channels
//! of 64 ten-bit readings each.
//!
//! ## Block Layout
//!
//! ```text
//! group i (6 bytes): V_hi V_lo | I1_hi I1_lo | I2_hi I2_lo
//! sample(c, i) = be16(block[i*6 + 2c], block[i*6 + 2c + 1])
//! ```

use crate::frame::protocol::*;

/// One channel of the sample block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Voltage = 0,
    Current1 = 1,
    Current2 = 2,
}

impl Channel {
    /// All channels in block order
    pub const ALL: [Channel; CHANNEL_COUNT] = [Channel::Voltage, Channel::Current1, Channel::Current2];

    /// Position of this channel inside each 6-byte group
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Samples of one channel
pub type ChannelSamples = [u16; SAMPLES_PER_CHANNEL];

/// De-interleaved samples of a telemetry frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSet {
    channels: [ChannelSamples; CHANNEL_COUNT],
}

impl SampleSet {
    /// Build a sample set from already separated channels
    pub fn new(voltage: ChannelSamples, current_1: ChannelSamples, current_2: ChannelSamples) -> Self {
        Self {
            channels: [voltage, current_1, current_2],
        }
    }

    /// De-interleave the sample block of a full telemetry frame
    pub fn from_frame(frame: &TelemetryBytes) -> Self {
        let mut block = [0u8; SAMPLE_BLOCK_SIZE];
        block.copy_from_slice(&frame[TELEMETRY_SAMPLES_INDEX..TELEMETRY_SAMPLES_INDEX + SAMPLE_BLOCK_SIZE]);
        deinterleave(&block)
    }

    /// Samples for one channel
    pub fn channel(&self, channel: Channel) -> &ChannelSamples {
        &self.channels[channel.index()]
    }

    pub fn voltage(&self) -> &ChannelSamples {
        self.channel(Channel::Voltage)
    }

    pub fn current_1(&self) -> &ChannelSamples {
        self.channel(Channel::Current1)
    }

    pub fn current_2(&self) -> &ChannelSamples {
        self.channel(Channel::Current2)
    }
}

/// De-interleave a sample block into three channels
///
/// # Arguments
///
/// * `block` - The 384-byte sample region of a telemetry frame
///
/// # Returns
///
/// * `SampleSet` - Voltage, current 1 and current 2 samples in order
pub fn deinterleave(block: &[u8; SAMPLE_BLOCK_SIZE]) -> SampleSet {
    let mut channels = [[0u16; SAMPLES_PER_CHANNEL]; CHANNEL_COUNT];

    for (i, group) in block.chunks_exact(SAMPLE_STRIDE).enumerate() {
        for channel in Channel::ALL {
            let offset = channel.index() * BYTES_PER_SAMPLE;
            channels[channel.index()][i] = decode_sample(group[offset], group[offset + 1]);
        }
    }

    SampleSet { channels }
}

/// Combine a big-endian byte pair into one sample value
pub fn decode_sample(high: u8, low: u8) -> u16 {
    u16::from_be_bytes([high, low])
}
