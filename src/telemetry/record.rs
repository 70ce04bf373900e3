//! # Telemetry Record
//!
//! Decoded, immutable view of one received telemetry frame.

use std::cmp::Ordering;

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};
use serde::Serialize;

use crate::error::{KipError, Result};
use crate::frame::decoder::{is_valid, telemetry_frame};
use crate::frame::protocol::*;
use crate::signal::peaks::{frequency, peak_magnitude};
use crate::signal::power::{to_current, to_rms_voltage, to_watts, CurrentChannel};
use crate::signal::samples::{Channel, SampleSet};

/// Measurements derived from one telemetry frame
///
/// `Default` gives the all-zero placeholder shown when no data arrived.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Measurements {
    /// Average voltage peak (ADC units)
    pub voltage_peak: u16,
    /// Average current channel 1 peak (ADC units)
    pub current_1_peak: u16,
    /// Average current channel 2 peak (ADC units)
    pub current_2_peak: u16,
    /// Current channel 1 in amps
    pub current_1: f64,
    /// Current channel 2 in amps
    pub current_2: f64,
    /// Frequency of current channel 1 in Hz
    pub frequency_1: f64,
    /// Frequency of current channel 2 in Hz
    pub frequency_2: f64,
    /// RMS voltage derived from the voltage peak
    pub rms_voltage: f64,
    /// Power in watts (from current channel 1)
    pub watts: f64,
    /// Delay field reported by the board, in milliseconds
    pub delay_ms: u16,
}

impl Measurements {
    /// Run signal processing over a frame's samples
    pub fn from_samples(samples: &SampleSet, delay_ms: u16) -> Self {
        let voltage_peak = peak_magnitude(samples.voltage());
        let current_1_peak = peak_magnitude(samples.current_1());
        let current_2_peak = peak_magnitude(samples.current_2());

        let current_1 = to_current(current_1_peak, CurrentChannel::One);
        let current_2 = to_current(current_2_peak, CurrentChannel::Two);
        let rms_voltage = to_rms_voltage(voltage_peak);

        Self {
            voltage_peak,
            current_1_peak,
            current_2_peak,
            current_1,
            current_2,
            frequency_1: frequency(samples.current_1()),
            frequency_2: frequency(samples.current_2()),
            rms_voltage,
            watts: to_watts(rms_voltage, current_1),
            delay_ms,
        }
    }
}

/// One received telemetry frame with its arrival time and measurements
#[derive(Debug, Clone)]
pub struct TelemetryRecord {
    received_at: DateTime<Local>,
    raw: TelemetryBytes,
    samples: SampleSet,
    measurements: Measurements,
    valid: bool,
}

impl TelemetryRecord {
    /// Decode a telemetry frame received at `received_at`
    ///
    /// Decoding does not require the frame to be valid; validity is kept
    /// on the record as a diagnostic flag.
    pub fn new(received_at: DateTime<Local>, raw: TelemetryBytes) -> Self {
        let samples = SampleSet::from_frame(&raw);
        let delay_ms = u16::from_be_bytes([raw[TELEMETRY_DELAY_HIGH_INDEX], raw[TELEMETRY_DELAY_LOW_INDEX]]);
        let measurements = Measurements::from_samples(&samples, delay_ms);
        let valid = is_valid(&raw, FrameKind::Telemetry);

        Self {
            received_at,
            raw,
            samples,
            measurements,
            valid,
        }
    }

    /// Decode a datagram, or `None` if it does not have the telemetry length
    pub fn from_datagram(received_at: DateTime<Local>, data: &[u8]) -> Option<Self> {
        telemetry_frame(data).map(|raw| Self::new(received_at, raw))
    }

    /// Rebuild a record from a stored epoch timestamp and frame bytes
    ///
    /// # Errors
    ///
    /// Returns error if the timestamp is out of range or the frame has the
    /// wrong length.
    pub fn from_epoch_millis(epoch_millis: i64, data: &[u8]) -> Result<Self> {
        let received_at = Local
            .timestamp_millis_opt(epoch_millis)
            .single()
            .ok_or_else(|| KipError::Archive(format!("Invalid timestamp: {}", epoch_millis)))?;

        Self::from_datagram(received_at, data).ok_or_else(|| {
            KipError::Archive(format!(
                "Expected {} frame bytes, got {}",
                TELEMETRY_FRAME_SIZE,
                data.len()
            ))
        })
    }

    /// Raw frame bytes
    pub fn raw(&self) -> &TelemetryBytes {
        &self.raw
    }

    pub fn samples(&self) -> &SampleSet {
        &self.samples
    }

    /// Samples of one channel
    pub fn channel(&self, channel: Channel) -> &[u16; SAMPLES_PER_CHANNEL] {
        self.samples.channel(channel)
    }

    pub fn measurements(&self) -> &Measurements {
        &self.measurements
    }

    /// Whether the frame passed header, footer and checksum checks
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn device_id(&self) -> u8 {
        self.raw[TELEMETRY_ID_INDEX]
    }

    /// Average peak magnitude of one channel
    pub fn peak(&self, channel: Channel) -> u16 {
        match channel {
            Channel::Voltage => self.measurements.voltage_peak,
            Channel::Current1 => self.measurements.current_1_peak,
            Channel::Current2 => self.measurements.current_2_peak,
        }
    }

    pub fn current(&self, channel: CurrentChannel) -> f64 {
        match channel {
            CurrentChannel::One => self.measurements.current_1,
            CurrentChannel::Two => self.measurements.current_2,
        }
    }

    pub fn frequency(&self, channel: CurrentChannel) -> f64 {
        match channel {
            CurrentChannel::One => self.measurements.frequency_1,
            CurrentChannel::Two => self.measurements.frequency_2,
        }
    }

    pub fn rms_voltage(&self) -> f64 {
        self.measurements.rms_voltage
    }

    pub fn watts(&self) -> f64 {
        self.measurements.watts
    }

    /// Board delay in milliseconds
    pub fn delay_ms(&self) -> u16 {
        self.measurements.delay_ms
    }

    /// Arrival time
    pub fn received_at(&self) -> DateTime<Local> {
        self.received_at
    }

    pub fn year(&self) -> i32 {
        self.received_at.year()
    }

    /// Month of the year, 1-12
    pub fn month(&self) -> u32 {
        self.received_at.month()
    }

    pub fn day(&self) -> u32 {
        self.received_at.day()
    }

    pub fn hour(&self) -> u32 {
        self.received_at.hour()
    }

    pub fn minute(&self) -> u32 {
        self.received_at.minute()
    }

    pub fn second(&self) -> u32 {
        self.received_at.second()
    }

    /// Millisecond within the second, 0-999
    pub fn millisecond(&self) -> u32 {
        self.received_at.timestamp_subsec_millis()
    }

    /// Milliseconds since the Unix epoch
    pub fn epoch_millis(&self) -> i64 {
        self.received_at.timestamp_millis()
    }
}

// Records order by arrival time; the raw bytes only break ties so that
// ordering stays consistent with equality.
impl PartialEq for TelemetryRecord {
    fn eq(&self, other: &Self) -> bool {
        self.received_at == other.received_at && self.raw == other.raw
    }
}

impl Eq for TelemetryRecord {}

impl PartialOrd for TelemetryRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TelemetryRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.received_at
            .cmp(&other.received_at)
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::encoder::encode_telemetry;

    fn at(epoch_millis: i64) -> DateTime<Local> {
        Local.timestamp_millis_opt(epoch_millis).unwrap()
    }

    fn sine(amplitude: f64, period: usize) -> [u16; SAMPLES_PER_CHANNEL] {
        let mut samples = [0u16; SAMPLES_PER_CHANNEL];
        for (i, s) in samples.iter_mut().enumerate() {
            let phase = 2.0 * std::f64::consts::PI * (i % period) as f64 / period as f64;
            let v = amplitude * phase.sin();
            *s = if v > 0.0 { v as u16 } else { 0 };
        }
        samples
    }

    #[test]
    fn test_constant_signals_decode_to_zero() {
        let frame = encode_telemetry(
            5,
            &[1; SAMPLES_PER_CHANNEL],
            &[2; SAMPLES_PER_CHANNEL],
            &[3; SAMPLES_PER_CHANNEL],
        );
        let record = TelemetryRecord::new(at(0), frame);

        assert!(record.is_valid());
        assert_eq!(record.device_id(), 5);
        assert_eq!(record.peak(Channel::Voltage), 0);
        assert_eq!(record.peak(Channel::Current1), 0);
        assert_eq!(record.peak(Channel::Current2), 0);
        assert_eq!(record.current(CurrentChannel::One), 0.0);
        assert_eq!(record.frequency(CurrentChannel::Two), 0.0);
        assert_eq!(record.watts(), 0.0);
        assert_eq!(record.channel(Channel::Current2), &[3; SAMPLES_PER_CHANNEL]);
    }

    #[test]
    fn test_sine_signals_decode_to_measurements() {
        let frame = encode_telemetry(1, &sine(768.0, 16), &sine(500.0, 16), &sine(100.0, 8));
        let record = TelemetryRecord::new(at(0), frame);
        let m = record.measurements();

        assert_eq!(m.voltage_peak, 768);
        assert_eq!(m.current_1_peak, 500);
        assert_eq!(m.current_2_peak, 100);
        assert!((m.current_1 - 3.925).abs() < 1e-9);
        assert!((m.current_2 - 8.5).abs() < 1e-9);
        assert_eq!(m.frequency_1, 1500.0 / 16.0);
        assert_eq!(m.frequency_2, 1500.0 / 8.0);
        assert!((m.rms_voltage - 768.0 / std::f64::consts::SQRT_2).abs() < 1e-9);
        assert!((m.watts - 84.853 * 3.925).abs() < 1e-9);
    }

    #[test]
    fn test_delay_is_big_endian() {
        let zeros = [0u16; SAMPLES_PER_CHANNEL];
        let mut frame = encode_telemetry(0, &zeros, &zeros, &zeros);
        frame[TELEMETRY_DELAY_HIGH_INDEX] = 0x01;
        frame[TELEMETRY_DELAY_LOW_INDEX] = 0xF4;

        let record = TelemetryRecord::new(at(0), frame);
        assert_eq!(record.delay_ms(), 500);
        // Checksum was not updated after editing the delay
        assert!(!record.is_valid());
    }

    #[test]
    fn test_from_datagram_requires_telemetry_length() {
        let zeros = [0u16; SAMPLES_PER_CHANNEL];
        let frame = encode_telemetry(0, &zeros, &zeros, &zeros);

        assert!(TelemetryRecord::from_datagram(at(0), &frame).is_some());
        assert!(TelemetryRecord::from_datagram(at(0), &frame[..11]).is_none());
    }

    #[test]
    fn test_bad_checksum_still_decodes() {
        let mut frame = encode_telemetry(3, &sine(768.0, 16), &sine(500.0, 16), &sine(100.0, 16));
        frame[TELEMETRY_CHECKSUM_INDEX] ^= 0xFF;

        let record = TelemetryRecord::from_datagram(at(0), &frame).unwrap();
        assert!(!record.is_valid());
        assert_eq!(record.peak(Channel::Current1), 500);
    }

    #[test]
    fn test_timestamp_facets() {
        let received_at = Local.with_ymd_and_hms(2012, 4, 17, 13, 45, 30).unwrap()
            + chrono::Duration::milliseconds(250);
        let zeros = [0u16; SAMPLES_PER_CHANNEL];
        let record = TelemetryRecord::new(received_at, encode_telemetry(0, &zeros, &zeros, &zeros));

        assert_eq!(record.year(), 2012);
        assert_eq!(record.month(), 4);
        assert_eq!(record.day(), 17);
        assert_eq!(record.hour(), 13);
        assert_eq!(record.minute(), 45);
        assert_eq!(record.second(), 30);
        assert_eq!(record.millisecond(), 250);
        assert_eq!(record.epoch_millis(), received_at.timestamp_millis());
    }

    #[test]
    fn test_from_epoch_millis() {
        let zeros = [0u16; SAMPLES_PER_CHANNEL];
        let frame = encode_telemetry(0, &zeros, &zeros, &zeros);

        let record = TelemetryRecord::from_epoch_millis(1_334_670_330_250, &frame).unwrap();
        assert_eq!(record.epoch_millis(), 1_334_670_330_250);
        assert_eq!(record.raw(), &frame);

        assert!(matches!(
            TelemetryRecord::from_epoch_millis(0, &frame[..100]),
            Err(KipError::Archive(_))
        ));
    }

    #[test]
    fn test_records_order_by_timestamp() {
        let zeros = [0u16; SAMPLES_PER_CHANNEL];
        let late = TelemetryRecord::new(at(2_000), encode_telemetry(0, &zeros, &zeros, &zeros));
        let early = TelemetryRecord::new(at(1_000), encode_telemetry(9, &zeros, &zeros, &zeros));

        assert!(early < late);

        let mut records = vec![late.clone(), early.clone()];
        records.sort();
        assert_eq!(records, vec![early, late]);
    }

    #[test]
    fn test_placeholder_measurements_are_zero() {
        let m = Measurements::default();
        assert_eq!(m.voltage_peak, 0);
        assert_eq!(m.watts, 0.0);
        assert_eq!(m.delay_ms, 0);
    }
}
