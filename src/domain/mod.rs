//! Domain models for passive DHCPv4 analysis.
//!
//! This module contains the core domain types that are independent
//! of capture, parsing and tracing concerns.

mod dhcp;
mod option;

pub use dhcp::{format_mac, DhcpMessageType, DhcpOperation, DhcpOption, DhcpPacket};
pub use option::{LengthRule, OptionCode, OptionSpec, ValueKind, OPTION_TABLE};
