//! Error types for the analyzer.

use thiserror::Error;

/// Errors raised while opening or reading from a capture device.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Interface '{0}' not found")]
    InterfaceNotFound(String),

    #[error("Insufficient permissions to capture packets (try running as root)")]
    InsufficientPermissions,

    #[error("Failed to create capture channel: {0}")]
    ChannelCreation(String),
}

/// Errors raised while parsing a DHCPv4 payload.
///
/// These are never fatal: the decode loop drops the offending payload
/// and moves on to the next one.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("Packet too short: expected at least {expected} bytes, got {actual}")]
    PacketTooShort { expected: usize, actual: usize },

    #[error("Invalid DHCP magic cookie")]
    InvalidMagicCookie,

    #[error("Unknown BOOTP operation code {0}")]
    UnknownOperation(u8),

    #[error("Invalid option at offset {offset}: {message}")]
    InvalidOption { offset: usize, message: String },
}

/// Errors raised while constructing a tracing backend.
#[derive(Error, Debug)]
pub enum TracerError {
    #[error("Invalid collector endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Failed to spawn span reporter: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while validating runtime configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid tracing endpoint: {0}")]
    Endpoint(#[source] TracerError),
}
