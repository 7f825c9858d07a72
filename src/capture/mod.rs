//! Packet capture abstraction.
//!
//! This module defines the `PacketCapture` trait and provides a
//! pnet-based implementation, so the decode loop can be driven by a
//! live interface or by canned payloads in tests.

mod pnet_capture;

pub use pnet_capture::PnetCapture;

use std::net::IpAddr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::error::CaptureError;

/// A DHCP payload captured from the wire.
#[derive(Debug, Clone)]
pub struct RawPacket {
    /// UDP payload of a port 67/68 datagram
    pub data: Vec<u8>,
    /// Source MAC address of the Ethernet frame
    pub src_mac: [u8; 6],
}

/// A capture-capable network device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub addresses: Vec<IpAddr>,
}

/// Trait for packet capture implementations.
pub trait PacketCapture: Send {
    /// Open the device and return an iterator over DHCP payloads.
    ///
    /// Returns only the UDP payload of packets on ports 67/68. The
    /// iterator ends once the running flag is cleared; dropping it
    /// releases the underlying capture handle.
    fn capture_dhcp_packets(
        &mut self,
    ) -> Result<Box<dyn Iterator<Item = RawPacket> + '_>, CaptureError>;

    /// Get the name of the interface being captured.
    fn interface_name(&self) -> &str;

    /// Set the running flag for graceful shutdown.
    fn set_running(&mut self, running: Arc<AtomicBool>);
}
