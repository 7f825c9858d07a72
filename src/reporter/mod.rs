//! Reporting module for decoded DHCP packets.
//!
//! This module defines the `PacketReporter` trait and the text formatter
//! used by the console implementation.

mod console_reporter;

pub use console_reporter::{format_packet, ConsoleReporter};

use crate::domain::DhcpPacket;

/// Sink for decoded packets.
///
/// This trait only handles reporting, not filtering or correlation.
/// Different implementations can output to console, files, etc.
pub trait PacketReporter: Send {
    /// Report a decoded packet.
    fn report(&mut self, packet: &DhcpPacket);

    /// Called when the analyzer starts.
    fn on_start(&mut self, _interface: &str) {}

    /// Called when the analyzer stops.
    fn on_stop(&mut self) {}
}
