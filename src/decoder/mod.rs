//! DHCP option decoding module.
//!
//! Turns raw option records into typed, printable values. Decoding is
//! driven by the option table in [`crate::domain::OPTION_TABLE`].

mod option_decoder;

pub use option_decoder::{decode, decode_option, render_option, DecodedValue, INVALID};
