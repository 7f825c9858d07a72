//! DHCP packet parsing module.
//!
//! This module is responsible for parsing raw bytes into domain DHCP types.

mod dhcp_parser;

pub use dhcp_parser::{DhcpParser, DHCP_MAGIC_COOKIE};
