//! Transaction id → span correlation.

use std::collections::HashMap;

use crate::decoder::decode_option;
use crate::domain::{DhcpMessageType, DhcpPacket, OptionCode};
use crate::tracer::{SpanContext, Tracer};

/// Name of the per-transaction root span.
pub const ROOT_SPAN_NAME: &str = "dhcp";

/// Message type that completes a transaction.
const TERMINAL_MESSAGE_TYPE: DhcpMessageType = DhcpMessageType::Ack;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Root span started, no Ack seen yet
    Open,
    /// Root span finished
    Closed,
}

/// One DHCP exchange, keyed by transaction id.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub root: SpanContext,
    pub state: TransactionState,
    /// Packets seen with this id (one child span each)
    pub packets: u64,
}

/// Groups packets sharing a transaction id under one root span.
///
/// Entries are never evicted: a closed transaction stays in the table
/// and later packets with the same id still get a child span under the
/// finished root.
pub struct TransactionCorrelator<T: Tracer> {
    tracer: T,
    transactions: HashMap<u32, Transaction>,
}

impl<T: Tracer> TransactionCorrelator<T> {
    pub fn new(tracer: T) -> Self {
        Self {
            tracer,
            transactions: HashMap::new(),
        }
    }

    /// Record a packet, returning the (already finished) child span.
    pub fn observe(&mut self, packet: &DhcpPacket) -> SpanContext {
        let xid = packet.xid;
        let tracer = &mut self.tracer;

        let transaction = self.transactions.entry(xid).or_insert_with(|| {
            let xid_tag = xid.to_string();
            let root = tracer.start_root_span(ROOT_SPAN_NAME, &[("Xid", xid_tag.as_str())]);
            tracing::debug!(xid, "Opened transaction");
            Transaction {
                root,
                state: TransactionState::Open,
                packets: 0,
            }
        });

        let message_type = message_type_name(packet);
        let child = tracer.start_child_span(&message_type, transaction.root);
        tag_packet(tracer, child, packet);
        tracer.finish(child);
        transaction.packets += 1;

        if message_type == TERMINAL_MESSAGE_TYPE.as_str()
            && transaction.state == TransactionState::Open
        {
            tracer.finish(transaction.root);
            transaction.state = TransactionState::Closed;
            tracing::debug!(xid, packets = transaction.packets, "Closed transaction");
        }

        child
    }

    pub fn transaction(&self, xid: u32) -> Option<&Transaction> {
        self.transactions.get(&xid)
    }

    /// Number of tracked transactions, open or closed.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn open_count(&self) -> usize {
        self.transactions
            .values()
            .filter(|t| t.state == TransactionState::Open)
            .count()
    }

    pub fn tracer(&self) -> &T {
        &self.tracer
    }
}

/// Decoded value of the first MessageType option, empty if there is none.
pub fn message_type_name(packet: &DhcpPacket) -> String {
    packet
        .option(OptionCode::MESSAGE_TYPE)
        .map(|option| decode_option(option).to_string())
        .unwrap_or_default()
}

fn tag_packet<T: Tracer>(tracer: &mut T, span: SpanContext, packet: &DhcpPacket) {
    tracer.set_tag(span, "Operation", packet.op.as_str());
    tracer.set_tag(span, "ClientIP", &packet.ciaddr.to_string());
    tracer.set_tag(span, "ClientMAC", &packet.client_mac());
    tracer.set_tag(span, "YourClientIP", &packet.yiaddr.to_string());
    tracer.set_tag(span, "NextServerIP", &packet.siaddr.to_string());
    tracer.set_tag(span, "RelayAgentIP", &packet.giaddr.to_string());

    for option in &packet.options {
        let value = decode_option(option).to_string();
        tracer.set_tag(span, &option.code.name(), &value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DhcpOperation, DhcpOption};
    use crate::tracer::{NoopTracer, RecordingTracer};
    use macaddr::MacAddr6;
    use std::net::Ipv4Addr;

    const XID: u32 = 0x12345678;

    fn create_test_packet(op: DhcpOperation, options: Vec<DhcpOption>) -> DhcpPacket {
        DhcpPacket {
            op,
            htype: 1,
            hlen: 6,
            hops: 0,
            xid: XID,
            secs: 0,
            flags: 0,
            ciaddr: Ipv4Addr::UNSPECIFIED,
            yiaddr: Ipv4Addr::UNSPECIFIED,
            siaddr: Ipv4Addr::UNSPECIFIED,
            giaddr: Ipv4Addr::UNSPECIFIED,
            chaddr: MacAddr6::new(0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff),
            options,
        }
    }

    fn typed_packet(msg_type: u8) -> DhcpPacket {
        let op = match msg_type {
            2 | 5 | 6 => DhcpOperation::Reply,
            _ => DhcpOperation::Request,
        };
        let options = vec![DhcpOption::new(OptionCode::MESSAGE_TYPE, vec![msg_type])];
        create_test_packet(op, options)
    }

    fn dora() -> Vec<DhcpPacket> {
        [1, 2, 3, 5].into_iter().map(typed_packet).collect()
    }

    #[test]
    fn test_first_packet_opens_transaction() {
        let mut correlator = TransactionCorrelator::new(RecordingTracer::new());
        let child = correlator.observe(&typed_packet(1));

        let tracer = correlator.tracer();
        assert_eq!(tracer.roots().count(), 1);
        assert_eq!(tracer.spans().len(), 2);

        let transaction = correlator.transaction(XID).unwrap();
        assert_eq!(transaction.state, TransactionState::Open);
        assert_eq!(tracer.span(child).unwrap().parent, Some(transaction.root));

        let root = tracer.span(transaction.root).unwrap();
        assert_eq!(root.name, ROOT_SPAN_NAME);
        assert_eq!(root.tag("Xid"), Some("305419896"));
        assert!(!root.is_finished());
    }

    #[test]
    fn test_second_packet_reuses_root() {
        let mut correlator = TransactionCorrelator::new(RecordingTracer::new());
        correlator.observe(&typed_packet(1));
        correlator.observe(&typed_packet(2));

        let root = correlator.transaction(XID).unwrap().root;
        let tracer = correlator.tracer();
        assert_eq!(tracer.roots().count(), 1);
        assert_eq!(tracer.children_of(root).count(), 2);
        assert_eq!(correlator.len(), 1);
    }

    #[test]
    fn test_dora_closes_root_once_after_ack() {
        let mut correlator = TransactionCorrelator::new(RecordingTracer::new());
        let packets = dora();

        for packet in &packets[..3] {
            correlator.observe(packet);
        }
        let root = correlator.transaction(XID).unwrap().root;
        assert!(!correlator.tracer().span(root).unwrap().is_finished());

        correlator.observe(&packets[3]);

        let tracer = correlator.tracer();
        assert_eq!(tracer.roots().count(), 1);
        assert_eq!(tracer.span(root).unwrap().finish_count, 1);
        let names: Vec<_> = tracer.children_of(root).map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Discover", "Offer", "Request", "Ack"]);
        assert!(tracer.children_of(root).all(|s| s.finish_count == 1));
        assert_eq!(
            correlator.transaction(XID).unwrap().state,
            TransactionState::Closed
        );
        assert_eq!(correlator.open_count(), 0);
    }

    #[test]
    fn test_packet_after_close_attaches_to_finished_root() {
        let mut correlator = TransactionCorrelator::new(RecordingTracer::new());
        for packet in dora() {
            correlator.observe(&packet);
        }
        let child = correlator.observe(&typed_packet(3));

        let transaction = correlator.transaction(XID).unwrap();
        assert_eq!(transaction.state, TransactionState::Closed);
        assert_eq!(transaction.packets, 5);

        let tracer = correlator.tracer();
        assert_eq!(tracer.children_of(transaction.root).count(), 5);
        assert_eq!(tracer.span(child).unwrap().parent, Some(transaction.root));
        assert_eq!(tracer.span(transaction.root).unwrap().finish_count, 1);
    }

    #[test]
    fn test_second_ack_does_not_refinish_root() {
        let mut correlator = TransactionCorrelator::new(RecordingTracer::new());
        correlator.observe(&typed_packet(5));
        correlator.observe(&typed_packet(5));

        let root = correlator.transaction(XID).unwrap().root;
        assert_eq!(correlator.tracer().span(root).unwrap().finish_count, 1);
    }

    #[test]
    fn test_missing_message_type_uses_empty_name() {
        let mut correlator = TransactionCorrelator::new(RecordingTracer::new());
        let child = correlator.observe(&create_test_packet(DhcpOperation::Request, vec![]));

        let span = correlator.tracer().span(child).unwrap();
        assert_eq!(span.name, "");
        assert!(span.is_finished());
        assert_eq!(
            correlator.transaction(XID).unwrap().state,
            TransactionState::Open
        );
    }

    #[test]
    fn test_malformed_message_type_is_invalid() {
        let packet = create_test_packet(
            DhcpOperation::Request,
            vec![DhcpOption::new(OptionCode::MESSAGE_TYPE, vec![5, 5])],
        );
        assert_eq!(message_type_name(&packet), "INVALID");
    }

    #[test]
    fn test_child_span_tags() {
        let mut packet = create_test_packet(
            DhcpOperation::Reply,
            vec![
                DhcpOption::new(OptionCode::MESSAGE_TYPE, vec![2]),
                DhcpOption::new(OptionCode::LEASE_TIME, vec![0, 0, 14, 16]),
                DhcpOption::new(OptionCode::PARAMETER_REQUEST_LIST, vec![1, 3, 6]),
                DhcpOption::new(OptionCode(224), vec![9]),
            ],
        );
        packet.yiaddr = Ipv4Addr::new(10, 0, 0, 5);

        let mut correlator = TransactionCorrelator::new(RecordingTracer::new());
        let child = correlator.observe(&packet);
        let span = correlator.tracer().span(child).unwrap();

        assert_eq!(span.name, "Offer");
        assert_eq!(span.tag("Operation"), Some("Reply"));
        assert_eq!(span.tag("ClientIP"), Some("0.0.0.0"));
        assert_eq!(span.tag("ClientMAC"), Some("aa:bb:cc:dd:ee:ff"));
        assert_eq!(span.tag("YourClientIP"), Some("10.0.0.5"));
        assert_eq!(span.tag("NextServerIP"), Some("0.0.0.0"));
        assert_eq!(span.tag("RelayAgentIP"), Some("0.0.0.0"));
        assert_eq!(span.tag("MessageType"), Some("Offer"));
        assert_eq!(span.tag("LeaseTime"), Some("3600"));
        assert_eq!(
            span.tag("ParameterRequestList"),
            Some("SubnetMask,Router,DomainNameServer")
        );
        assert_eq!(span.tag("Unknown(224)"), Some("[9]"));
    }

    #[test]
    fn test_distinct_transactions_get_distinct_roots() {
        let mut correlator = TransactionCorrelator::new(RecordingTracer::new());
        let mut other = typed_packet(1);
        other.xid = 0xdeadbeef;

        correlator.observe(&typed_packet(1));
        correlator.observe(&other);

        assert_eq!(correlator.len(), 2);
        assert_eq!(correlator.open_count(), 2);
        assert_eq!(correlator.tracer().roots().count(), 2);
    }

    #[test]
    fn test_noop_tracer_still_tracks_transactions() {
        let mut correlator = TransactionCorrelator::new(NoopTracer::new());
        for packet in dora() {
            correlator.observe(&packet);
        }
        assert_eq!(correlator.len(), 1);
        assert_eq!(correlator.transaction(XID).unwrap().packets, 4);
    }
}
