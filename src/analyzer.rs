//! Decode loop tying capture, parsing, reporting and correlation together.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use macaddr::MacAddr6;

use crate::capture::{PacketCapture, RawPacket};
use crate::correlator::TransactionCorrelator;
use crate::domain::{format_mac, DhcpPacket};
use crate::error::CaptureError;
use crate::parser::DhcpParser;
use crate::reporter::PacketReporter;
use crate::tracer::Tracer;

/// Counters for one analyzer run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerStats {
    /// Payloads read from the capture source
    pub received: u64,
    /// Payloads decoded as DHCPv4
    pub decoded: u64,
    /// Payloads that were not valid DHCPv4
    pub dropped: u64,
}

/// Processes captured payloads one at a time, in capture order.
pub struct Analyzer<T: Tracer> {
    parser: DhcpParser,
    reporter: Option<Box<dyn PacketReporter>>,
    correlator: TransactionCorrelator<T>,
    running: Arc<AtomicBool>,
    stats: AnalyzerStats,
}

impl<T: Tracer> Analyzer<T> {
    pub fn new(tracer: T) -> Self {
        Self {
            parser: DhcpParser::new(),
            reporter: None,
            correlator: TransactionCorrelator::new(tracer),
            running: Arc::new(AtomicBool::new(true)),
            stats: AnalyzerStats::default(),
        }
    }

    /// Announce the capture and every decoded packet through `reporter`.
    pub fn with_reporter(mut self, reporter: Box<dyn PacketReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Share a cancellation flag; clearing it stops [`Analyzer::run`].
    pub fn with_running(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = running;
        self
    }

    /// Read from `capture` until cancelled or the source is exhausted.
    ///
    /// The capture iterator is dropped before returning, which releases
    /// the device on every exit path.
    pub fn run<C: PacketCapture + ?Sized>(
        &mut self,
        capture: &mut C,
    ) -> Result<AnalyzerStats, CaptureError> {
        capture.set_running(Arc::clone(&self.running));
        let interface = capture.interface_name().to_string();

        {
            let packets = capture.capture_dhcp_packets()?;
            tracing::info!("Analyzing DHCP packets on {}", interface);
            if let Some(reporter) = self.reporter.as_mut() {
                reporter.on_start(&interface);
            }

            for raw in packets {
                if !self.running.load(Ordering::SeqCst) {
                    break;
                }
                self.process(&raw);
            }
        }

        if let Some(reporter) = self.reporter.as_mut() {
            reporter.on_stop();
        }
        tracing::info!(
            received = self.stats.received,
            decoded = self.stats.decoded,
            dropped = self.stats.dropped,
            transactions = self.correlator.len(),
            "Capture stopped"
        );

        Ok(self.stats)
    }

    /// Decode one payload and route it to the reporter and correlator.
    ///
    /// Returns the decoded packet, or `None` if the payload was dropped.
    pub fn process(&mut self, raw: &RawPacket) -> Option<DhcpPacket> {
        self.stats.received += 1;

        let packet = match self.parser.parse(&raw.data) {
            Ok(packet) => packet,
            Err(e) => {
                self.stats.dropped += 1;
                tracing::debug!(
                    "Dropping payload from {}: {}",
                    format_mac(&MacAddr6::from(raw.src_mac)),
                    e
                );
                return None;
            }
        };
        self.stats.decoded += 1;
        tracing::trace!(xid = packet.xid, op = %packet.op, "Decoded DHCP packet");

        if let Some(reporter) = self.reporter.as_mut() {
            reporter.report(&packet);
        }
        self.correlator.observe(&packet);

        Some(packet)
    }

    pub fn correlator(&self) -> &TransactionCorrelator<T> {
        &self.correlator
    }
}
