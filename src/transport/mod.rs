//! # Transport Module
//!
//! Drives the KiP protocol over one shared UDP socket.
//!
//! This module handles:
//! - Socket abstraction shared by every worker
//! - Parsing operator text into commands
//! - One-shot sends and cancellable trigger bursts
//! - The receive loop feeding the telemetry history
//! - Polling the live buffer for displays
//! - Timestamped status lines for every outcome

pub mod socket;
pub mod status;
pub mod command;
pub mod sender;
pub mod receiver;
pub mod poller;
