//! Transaction correlation module.
//!
//! Turns the stream of decoded packets into a trace tree: one root span
//! per DHCP transaction id, one child span per packet.

mod transaction_correlator;

pub use transaction_correlator::{
    message_type_name, Transaction, TransactionCorrelator, TransactionState, ROOT_SPAN_NAME,
};
