//! DHCP option codes and their value formats (RFC 2132).
//!
//! Every known option is described by one row of [`OPTION_TABLE`]: its
//! code, its display name and the kind of value it carries. Adding support
//! for a new option means adding a row, nothing else.

use std::borrow::Cow;
use std::fmt;

/// How an option payload is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Raw text (hostnames, domain names, paths, messages)
    Text,
    /// A single DHCP message type byte
    MessageType,
    /// An IPv4 address in the first four bytes
    Ipv4,
    /// A 32-bit big-endian duration in seconds
    Timer,
    /// A list of option codes, one per byte
    ParameterList,
    /// Anything else, shown as raw bytes
    Raw,
}

/// Payload length a value kind accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthRule {
    Any,
    Exactly(usize),
    AtLeast(usize),
}

impl LengthRule {
    pub fn accepts(&self, len: usize) -> bool {
        match *self {
            Self::Any => true,
            Self::Exactly(n) => len == n,
            Self::AtLeast(n) => len >= n,
        }
    }
}

impl ValueKind {
    pub fn length_rule(&self) -> LengthRule {
        match self {
            Self::MessageType => LengthRule::Exactly(1),
            Self::Ipv4 => LengthRule::AtLeast(4),
            Self::Timer => LengthRule::Exactly(4),
            Self::Text | Self::ParameterList | Self::Raw => LengthRule::Any,
        }
    }
}

/// One row of the option table.
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub code: u8,
    pub name: &'static str,
    pub kind: ValueKind,
}

const fn spec(code: u8, name: &'static str, kind: ValueKind) -> OptionSpec {
    OptionSpec { code, name, kind }
}

use ValueKind::{Ipv4, MessageType, ParameterList, Raw, Text, Timer};

/// Known DHCP options.
pub static OPTION_TABLE: &[OptionSpec] = &[
    spec(1, "SubnetMask", Ipv4),
    spec(2, "TimeOffset", Raw),
    spec(3, "Router", Raw),
    spec(4, "TimeServer", Raw),
    spec(5, "NameServer", Raw),
    spec(6, "DomainNameServer", Raw),
    spec(7, "LogServer", Raw),
    spec(8, "CookieServer", Raw),
    spec(9, "LPRServer", Raw),
    spec(10, "ImpressServer", Raw),
    spec(11, "ResLocServer", Raw),
    spec(12, "Hostname", Text),
    spec(13, "BootfileSize", Raw),
    spec(14, "MeritDumpFile", Text),
    spec(15, "DomainName", Text),
    spec(16, "SwapServer", Raw),
    spec(17, "RootPath", Text),
    spec(18, "ExtensionsPath", Text),
    spec(19, "IPForwarding", Raw),
    spec(20, "SourceRouting", Raw),
    spec(21, "PolicyFilter", Raw),
    spec(22, "DatagramMTU", Raw),
    spec(23, "DefaultTTL", Raw),
    spec(24, "PathMTUAgingTimeout", Timer),
    spec(25, "PathMTUPlateauTable", Raw),
    spec(26, "InterfaceMTU", Raw),
    spec(27, "AllSubnetsLocal", Raw),
    spec(28, "BroadcastAddr", Ipv4),
    spec(29, "MaskDiscovery", Raw),
    spec(30, "MaskSupplier", Raw),
    spec(31, "RouterDiscovery", Raw),
    spec(32, "SolicitAddr", Ipv4),
    spec(33, "StaticRoute", Raw),
    spec(34, "ARPTrailers", Raw),
    spec(35, "ARPTimeout", Timer),
    spec(36, "EthernetEncap", Raw),
    spec(37, "TCPTTL", Raw),
    spec(38, "TCPKeepAliveInterval", Timer),
    spec(39, "TCPKeepAliveGarbage", Raw),
    spec(40, "NISDomain", Text),
    spec(41, "NISServers", Raw),
    spec(42, "NTPServers", Raw),
    spec(43, "VendorOption", Raw),
    spec(44, "NetBIOSNameServer", Raw),
    spec(45, "NetBIOSDistServer", Raw),
    spec(46, "NetBIOSNodeType", Raw),
    spec(47, "NetBIOSScope", Text),
    spec(48, "XFontServer", Text),
    spec(49, "XDisplayManager", Text),
    spec(50, "RequestIP", Ipv4),
    spec(51, "LeaseTime", Timer),
    spec(52, "OptionOverload", Raw),
    spec(53, "MessageType", MessageType),
    spec(54, "ServerID", Ipv4),
    spec(55, "ParameterRequestList", ParameterList),
    spec(56, "Message", Text),
    spec(57, "MaxMessageSize", Raw),
    spec(58, "T1", Timer),
    spec(59, "T2", Timer),
    spec(60, "ClassID", Raw),
    spec(61, "ClientID", Raw),
    spec(119, "DomainSearch", Text),
    spec(120, "SIPServers", Raw),
    spec(121, "ClasslessStaticRoute", Raw),
];

/// A DHCP option type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OptionCode(pub u8);

impl OptionCode {
    pub const PAD: Self = Self(0);
    pub const SUBNET_MASK: Self = Self(1);
    pub const ROUTER: Self = Self(3);
    pub const DOMAIN_NAME_SERVER: Self = Self(6);
    pub const HOSTNAME: Self = Self(12);
    pub const LEASE_TIME: Self = Self(51);
    pub const MESSAGE_TYPE: Self = Self(53);
    pub const SERVER_ID: Self = Self(54);
    pub const PARAMETER_REQUEST_LIST: Self = Self(55);
    pub const END: Self = Self(255);

    /// Table row for this code, if the option is known.
    pub fn spec(&self) -> Option<&'static OptionSpec> {
        OPTION_TABLE.iter().find(|row| row.code == self.0)
    }

    /// Value kind; unknown codes are treated as raw bytes.
    pub fn kind(&self) -> ValueKind {
        self.spec().map_or(ValueKind::Raw, |row| row.kind)
    }

    /// Display name, `Unknown(<code>)` for codes outside the table.
    pub fn name(&self) -> Cow<'static, str> {
        match self.spec() {
            Some(row) => Cow::Borrowed(row.name),
            None => Cow::Owned(format!("Unknown({})", self.0)),
        }
    }
}

impl From<u8> for OptionCode {
    fn from(code: u8) -> Self {
        Self(code)
    }
}

impl fmt::Display for OptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
