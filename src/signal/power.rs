//! # Power Calculations
//!
//! Converts peak ADC magnitudes into physical units using the board's fixed
//! calibration.

use std::f64::consts::SQRT_2;

use super::samples::Channel;

/// Linear current calibration for channel 1 (amps per ADC unit)
pub const SLOPE_CURRENT_1: f64 = 0.00785;

/// Linear current calibration for channel 2 (amps per ADC unit)
pub const SLOPE_CURRENT_2: f64 = 0.085;

/// RMS line voltage of the board's supply (volts)
pub const LINE_VOLTAGE: f64 = 84.853;

/// Current sensing channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurrentChannel {
    One,
    Two,
}

impl CurrentChannel {
    /// Calibration slope for this channel
    pub const fn slope(self) -> f64 {
        match self {
            CurrentChannel::One => SLOPE_CURRENT_1,
            CurrentChannel::Two => SLOPE_CURRENT_2,
        }
    }
}

impl From<CurrentChannel> for Channel {
    fn from(channel: CurrentChannel) -> Self {
        match channel {
            CurrentChannel::One => Channel::Current1,
            CurrentChannel::Two => Channel::Current2,
        }
    }
}

/// Current in amps from a peak magnitude
pub fn to_current(peak_magnitude: u16, channel: CurrentChannel) -> f64 {
    channel.slope() * f64::from(peak_magnitude)
}

/// RMS voltage of a sine wave with the given peak
pub fn to_rms_voltage(peak_magnitude: u16) -> f64 {
    f64::from(peak_magnitude) / SQRT_2
}

/// Power in watts
///
/// The board runs at a fixed line voltage, so power is [`LINE_VOLTAGE`] times
/// current; `_rms_voltage` is not part of the calculation.
pub fn to_watts(_rms_voltage: f64, current: f64) -> f64 {
    LINE_VOLTAGE * current
}
