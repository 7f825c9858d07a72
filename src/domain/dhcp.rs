//! DHCP packet domain models.
//!
//! These types represent the logical structure of DHCPv4 packets,
//! independent of wire format parsing.

use std::fmt;
use std::net::Ipv4Addr;

use macaddr::MacAddr6;

use super::option::OptionCode;

/// BOOTP operation carried in the first header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhcpOperation {
    /// BOOTREQUEST (1), sent by clients
    Request,
    /// BOOTREPLY (2), sent by servers
    Reply,
}

impl DhcpOperation {
    /// Parse from the `op` header byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Request),
            2 => Some(Self::Reply),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "Request",
            Self::Reply => "Reply",
        }
    }
}

impl fmt::Display for DhcpOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// DHCP message types as defined in RFC 2132 (option 53).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhcpMessageType {
    Discover,
    Offer,
    Request,
    Decline,
    Ack,
    Nak,
    Release,
    Inform,
}

impl DhcpMessageType {
    /// Parse from the DHCP option 53 value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Discover),
            2 => Some(Self::Offer),
            3 => Some(Self::Request),
            4 => Some(Self::Decline),
            5 => Some(Self::Ack),
            6 => Some(Self::Nak),
            7 => Some(Self::Release),
            8 => Some(Self::Inform),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discover => "Discover",
            Self::Offer => "Offer",
            Self::Request => "Request",
            Self::Decline => "Decline",
            Self::Ack => "Ack",
            Self::Nak => "Nak",
            Self::Release => "Release",
            Self::Inform => "Inform",
        }
    }
}

impl fmt::Display for DhcpMessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single option record: type code plus its raw payload.
///
/// Options are kept undecoded; the decoder turns them into typed values
/// on demand so a malformed payload never prevents the packet from being
/// reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpOption {
    pub code: OptionCode,
    pub data: Vec<u8>,
}

impl DhcpOption {
    pub fn new(code: impl Into<OptionCode>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            code: code.into(),
            data: data.into(),
        }
    }
}

/// A parsed DHCPv4 packet.
#[derive(Debug, Clone)]
pub struct DhcpPacket {
    /// Operation: Request (client) or Reply (server)
    pub op: DhcpOperation,
    /// Hardware type (1 = Ethernet)
    pub htype: u8,
    /// Hardware address length
    pub hlen: u8,
    /// Relay hop count
    pub hops: u8,
    /// Transaction ID
    pub xid: u32,
    /// Seconds elapsed
    pub secs: u16,
    /// Flags
    pub flags: u16,
    /// Client IP address (if already known)
    pub ciaddr: Ipv4Addr,
    /// 'Your' IP address (assigned by server)
    pub yiaddr: Ipv4Addr,
    /// Next server IP address
    pub siaddr: Ipv4Addr,
    /// Relay agent IP address
    pub giaddr: Ipv4Addr,
    /// Client hardware address (MAC)
    pub chaddr: MacAddr6,
    /// DHCP options in wire order
    pub options: Vec<DhcpOption>,
}

impl DhcpPacket {
    /// First option with the given code.
    pub fn option(&self, code: OptionCode) -> Option<&DhcpOption> {
        self.options.iter().find(|opt| opt.code == code)
    }

    /// Client hardware address as lower-case, colon separated text.
    pub fn client_mac(&self) -> String {
        format_mac(&self.chaddr)
    }
}

/// Format a MAC address as `aa:bb:cc:dd:ee:ff`.
pub fn format_mac(mac: &MacAddr6) -> String {
    mac.as_bytes()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}
