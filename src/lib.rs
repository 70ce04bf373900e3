//! # KiP Console Library
//!
//! Operator console for KiP power measurement boards over UDP.
//!
//! This library provides the frame codec, the signal processing that turns
//! raw ADC samples into current, frequency and power, the telemetry history,
//! and the async workers that send commands and receive telemetry.

pub mod config;
pub mod error;
pub mod frame;
pub mod signal;
pub mod telemetry;
pub mod transport;
pub mod console;
pub mod logging;
