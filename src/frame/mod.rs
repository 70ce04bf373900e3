//! # KiP Frame Module
//!
//! Implementation of the fixed-size KiP UDP frames.
//!
//! This module handles:
//! - Command frame encoding (11 bytes, console to board)
//! - Telemetry frame encoding and validation (402 bytes, board to console)
//! - 8-bit wrapping checksum calculation
//! - Header, footer and length validation

pub mod protocol;
pub mod encoder;
pub mod decoder;
pub mod checksum;
