//! # Telemetry Module
//!
//! Stores and archives telemetry received from KiP boards.
//!
//! This module handles:
//! - Building a record with derived measurements from each frame
//! - Keeping the full history plus a read-once live buffer
//! - Saving and loading history as CSV

pub mod record;
pub mod history;
pub mod archive;
