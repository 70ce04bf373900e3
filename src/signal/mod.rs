//! # Signal Processing Module
//!
//! Turns the raw sample block of a telemetry frame into measurements.
//!
//! This module handles:
//! - De-interleaving the three ADC channels
//! - Peak detection with noise floor and spacing filter
//! - Frequency estimation from peak distance
//! - Conversion to current, RMS voltage and power

pub mod samples;
pub mod peaks;
pub mod power;
