//! pnet-based packet capture implementation.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use pnet::datalink::{self, Channel, Config, NetworkInterface};
use pnet::packet::ethernet::{EtherTypes, EthernetPacket};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::udp::UdpPacket;
use pnet::packet::Packet;

use super::{DeviceInfo, PacketCapture, RawPacket};
use crate::error::CaptureError;

/// DHCP server port
const DHCP_SERVER_PORT: u16 = 67;
/// DHCP client port
const DHCP_CLIENT_PORT: u16 = 68;

/// Read timeout, bounds how long a cleared running flag goes unnoticed
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Consecutive read failures tolerated before the capture gives up
const MAX_CONSECUTIVE_ERRORS: u32 = 50;

/// Packet capture using the pnet library.
pub struct PnetCapture {
    interface: NetworkInterface,
    running: Arc<AtomicBool>,
}

impl PnetCapture {
    /// Create a new capture on the specified interface.
    pub fn new(interface_name: &str) -> Result<Self, CaptureError> {
        let interface = datalink::interfaces()
            .into_iter()
            .find(|iface| iface.name == interface_name)
            .ok_or_else(|| CaptureError::InterfaceNotFound(interface_name.to_string()))?;

        Ok(Self {
            interface,
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    /// List all available network interfaces with their addresses.
    pub fn list_interfaces() -> Vec<DeviceInfo> {
        datalink::interfaces()
            .into_iter()
            .map(|iface| DeviceInfo {
                addresses: iface.ips.iter().map(|net| net.ip()).collect(),
                name: iface.name,
            })
            .collect()
    }
}

impl PacketCapture for PnetCapture {
    fn capture_dhcp_packets(
        &mut self,
    ) -> Result<Box<dyn Iterator<Item = RawPacket> + '_>, CaptureError> {
        let config = Config {
            read_timeout: Some(READ_TIMEOUT),
            promiscuous: true,
            ..Config::default()
        };

        let rx = match datalink::channel(&self.interface, config) {
            Ok(Channel::Ethernet(_tx, rx)) => rx,
            Ok(_) => {
                return Err(CaptureError::ChannelCreation(
                    "unsupported channel type".to_string(),
                ))
            }
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("permission") || msg.contains("Operation not permitted") {
                    return Err(CaptureError::InsufficientPermissions);
                }
                return Err(CaptureError::ChannelCreation(msg));
            }
        };

        let packets = DhcpPacketIterator::new(rx, Arc::clone(&self.running));
        Ok(Box::new(packets))
    }

    fn interface_name(&self) -> &str {
        &self.interface.name
    }

    fn set_running(&mut self, running: Arc<AtomicBool>) {
        self.running = running;
    }
}

/// Iterator that yields DHCP payloads from the network.
///
/// Read errors other than timeouts are retried after a pause. The iterator
/// ends once `MAX_CONSECUTIVE_ERRORS` reads in a row have failed.
struct DhcpPacketIterator {
    rx: Box<dyn datalink::DataLinkReceiver>,
    running: Arc<AtomicBool>,
    /// Pause after a failed read
    backoff: Duration,
    failures: u32,
}

impl DhcpPacketIterator {
    fn new(rx: Box<dyn datalink::DataLinkReceiver>, running: Arc<AtomicBool>) -> Self {
        Self {
            rx,
            running,
            backoff: READ_TIMEOUT,
            failures: 0,
        }
    }
}

impl Iterator for DhcpPacketIterator {
    type Item = RawPacket;

    fn next(&mut self) -> Option<Self::Item> {
        while self.running.load(Ordering::SeqCst) {
            match self.rx.next() {
                Ok(frame) => {
                    self.failures = 0;
                    if let Some(dhcp_packet) = extract_dhcp_packet(frame) {
                        return Some(dhcp_packet);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::TimedOut => self.failures = 0,
                Err(e) => {
                    self.failures += 1;
                    if self.failures >= MAX_CONSECUTIVE_ERRORS {
                        tracing::error!(
                            "Capture failed {} times in a row, stopping: {}",
                            self.failures,
                            e
                        );
                        return None;
                    }
                    if self.failures == 1 {
                        tracing::warn!("Capture error: {}", e);
                    } else {
                        tracing::debug!("Capture error: {}", e);
                    }
                    thread::sleep(self.backoff);
                }
            }
        }
        None
    }
}

/// Extract the DHCP payload from an Ethernet frame if it is one.
fn extract_dhcp_packet(data: &[u8]) -> Option<RawPacket> {
    let ethernet = EthernetPacket::new(data)?;

    if ethernet.get_ethertype() != EtherTypes::Ipv4 {
        return None;
    }

    let ipv4 = Ipv4Packet::new(ethernet.payload())?;

    if ipv4.get_next_level_protocol() != IpNextHeaderProtocols::Udp {
        return None;
    }

    let udp = UdpPacket::new(ipv4.payload())?;

    if !is_dhcp_port(udp.get_source()) && !is_dhcp_port(udp.get_destination()) {
        return None;
    }

    Some(RawPacket {
        data: udp.payload().to_vec(),
        src_mac: ethernet.get_source().octets(),
    })
}

fn is_dhcp_port(port: u16) -> bool {
    port == DHCP_SERVER_PORT || port == DHCP_CLIENT_PORT
}
