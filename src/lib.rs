//! Passive DHCPv4 analyzer.
//!
//! Captures DHCP traffic, decodes option records into readable values and
//! correlates packets sharing a transaction id into a trace tree.

pub mod analyzer;
pub mod capture;
pub mod config;
pub mod correlator;
pub mod decoder;
pub mod domain;
pub mod error;
pub mod parser;
pub mod reporter;
pub mod tracer;

pub use analyzer::{Analyzer, AnalyzerStats};
pub use config::{Config, Mode};
pub use correlator::TransactionCorrelator;
pub use domain::{DhcpMessageType, DhcpOperation, DhcpOption, DhcpPacket, OptionCode};
