//! # Operator Commands
//!
//! One variant per command kind, each carrying only its own arguments, plus
//! parsers for the text an operator types in.

use std::net::SocketAddr;

use tokio::net::lookup_host;

use crate::error::{KipError, Result};
use crate::frame::encoder::encode_command;
use crate::frame::protocol::{CommandBytes, CommandCode, COMMAND_ARG2_SIZE};

/// Command sent to a board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Ask for one telemetry frame
    Trigger,
    /// Assign the board id
    SetId(u8),
    /// Assign the board IPv4 address
    SetIp([u8; 4]),
    /// Assign the board MAC address
    SetMac([u8; 6]),
    /// Set the sampling delay in milliseconds
    SetDelay(u16),
    /// Restart the board
    Reset,
}

impl Command {
    pub fn code(&self) -> CommandCode {
        match self {
            Command::Trigger => CommandCode::Trigger,
            Command::SetId(_) => CommandCode::SetId,
            Command::SetIp(_) => CommandCode::SetIp,
            Command::SetMac(_) => CommandCode::SetMac,
            Command::SetDelay(_) => CommandCode::SetDelay,
            Command::Reset => CommandCode::Reset,
        }
    }

    /// Arguments as they appear on the wire
    pub fn args(&self) -> (u8, [u8; COMMAND_ARG2_SIZE]) {
        let mut arg2 = [0u8; COMMAND_ARG2_SIZE];
        let arg1 = match *self {
            Command::Trigger | Command::Reset => 0,
            Command::SetId(id) => id,
            Command::SetIp(ip) => {
                arg2[..4].copy_from_slice(&ip);
                0
            }
            Command::SetMac(mac) => {
                arg2.copy_from_slice(&mac);
                0
            }
            Command::SetDelay(delay_ms) => {
                arg2[..2].copy_from_slice(&delay_ms.to_be_bytes());
                0
            }
        };
        (arg1, arg2)
    }

    /// Encoded command frame
    pub fn frame(&self) -> CommandBytes {
        let (arg1, arg2) = self.args();
        encode_command(self.code(), arg1, arg2)
    }
}

fn invalid(message: String) -> KipError {
    KipError::InvalidArgument(message)
}

/// Parse a device id in signed byte range
///
/// The id is stored as its two's-complement byte, so `-1` becomes `0xFF`.
///
/// # Errors
///
/// Returns error if the text is not an integer in -128..=127
pub fn parse_id(text: &str) -> Result<u8> {
    text.trim()
        .parse::<i8>()
        .map(|id| id as u8)
        .map_err(|e| invalid(format!("id '{}': {}", text, e)))
}

/// Parse a dotted-quad IPv4 address
pub fn parse_ip(text: &str) -> Result<[u8; 4]> {
    let octets: Vec<&str> = text.trim().split('.').collect();
    if octets.len() != 4 {
        return Err(invalid(format!("IP '{}': expected 4 octets", text)));
    }

    let mut ip = [0u8; 4];
    for (slot, octet) in ip.iter_mut().zip(octets) {
        *slot = octet
            .parse::<u8>()
            .map_err(|e| invalid(format!("IP '{}': octet '{}': {}", text, octet, e)))?;
    }
    Ok(ip)
}

/// Parse a MAC address of six colon-separated hex octets
pub fn parse_mac(text: &str) -> Result<[u8; 6]> {
    let octets: Vec<&str> = text.trim().split(':').collect();
    if octets.len() != 6 {
        return Err(invalid(format!("MAC '{}': expected 6 octets", text)));
    }

    let mut mac = [0u8; 6];
    for (slot, octet) in mac.iter_mut().zip(octets) {
        if octet.is_empty() || octet.len() > 2 {
            return Err(invalid(format!("MAC '{}': octet '{}' is not one byte", text, octet)));
        }
        *slot = u8::from_str_radix(octet, 16)
            .map_err(|e| invalid(format!("MAC '{}': octet '{}': {}", text, octet, e)))?;
    }
    Ok(mac)
}

/// Parse a delay in milliseconds
pub fn parse_delay(text: &str) -> Result<u16> {
    text.trim()
        .parse::<u16>()
        .map_err(|e| invalid(format!("delay '{}': {}", text, e)))
}

/// Parse a trigger rate, which must be positive
pub fn parse_hertz(text: &str) -> Result<u32> {
    match text.trim().parse::<u32>() {
        Ok(0) => Err(invalid(format!("hertz '{}': must be greater than 0", text))),
        Ok(hertz) => Ok(hertz),
        Err(e) => Err(invalid(format!("hertz '{}': {}", text, e))),
    }
}

/// Parse a burst duration; zero or negative runs until cancelled
pub fn parse_seconds(text: &str) -> Result<i64> {
    text.trim()
        .parse::<i64>()
        .map_err(|e| invalid(format!("seconds '{}': {}", text, e)))
}

/// Parse a port number
pub fn parse_port(text: &str) -> Result<u16> {
    text.trim()
        .parse::<u16>()
        .map_err(|e| invalid(format!("port '{}': {}", text, e)))
}

/// Resolve a host name or IP plus port to a socket address
///
/// # Errors
///
/// Returns `Transport` error if the host does not resolve
pub async fn resolve(address: &str, port: u16) -> Result<SocketAddr> {
    resolve_from(address, port, None).await
}

/// Resolve a target reachable from the socket bound at `local`
///
/// Hosts with both IPv4 and IPv6 records resolve to the family of `local`.
///
/// # Errors
///
/// Returns `Transport` error if the host does not resolve
pub async fn resolve_from(address: &str, port: u16, local: Option<SocketAddr>) -> Result<SocketAddr> {
    let address = address.trim();
    if address.is_empty() {
        return Err(invalid("address is empty".to_string()));
    }

    let candidates = lookup_host((address, port))
        .await
        .map_err(|e| KipError::Transport(format!("{}: {}", address, e)))?;
    pick_address(candidates, local)
        .ok_or_else(|| KipError::Transport(format!("{}: no addresses found", address)))
}

/// First candidate in the family of `local`, else the first candidate
pub fn pick_address(
    candidates: impl IntoIterator<Item = SocketAddr>,
    local: Option<SocketAddr>,
) -> Option<SocketAddr> {
    let candidates: Vec<SocketAddr> = candidates.into_iter().collect();
    local
        .and_then(|local| candidates.iter().copied().find(|c| c.is_ipv4() == local.is_ipv4()))
        .or_else(|| candidates.first().copied())
}
