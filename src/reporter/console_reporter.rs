//! Console-based packet reporter.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::net::Ipv4Addr;

use crate::decoder::render_option;
use crate::domain::DhcpPacket;
use crate::reporter::PacketReporter;

/// Render a packet as a multi-line human-readable report.
///
/// Layout: a header line, one line per option in wire order, the
/// YourClientIP / NextServerIP / RelayAgentIP lines when the address is
/// set, then the transaction id. Every line ends with a newline.
pub fn format_packet(packet: &DhcpPacket) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "{} from {} / {}",
        packet.op,
        packet.ciaddr,
        packet.client_mac()
    );

    for option in &packet.options {
        let _ = writeln!(output, "  {}", render_option(option));
    }

    for (label, addr) in [
        ("YourClientIP", packet.yiaddr),
        ("NextServerIP", packet.siaddr),
        ("RelayAgentIP", packet.giaddr),
    ] {
        if addr != Ipv4Addr::UNSPECIFIED {
            let _ = writeln!(output, "  {:<15} : {}", label, addr);
        }
    }

    let _ = writeln!(output, "  {:<15} : {}", "Xid", packet.xid);

    output
}

/// Prints the capture banner and packet reports to standard output.
///
/// Reports are separated by a blank line. The banner is written once the
/// capture device is open, whether or not packet printing is enabled.
pub struct ConsoleReporter {
    /// Whether packet reports are written
    print_packets: bool,
    out: Box<dyn Write + Send>,
}

impl ConsoleReporter {
    /// Create a new console reporter.
    pub fn new() -> Self {
        Self {
            print_packets: true,
            out: Box::new(io::stdout()),
        }
    }

    /// Enable or disable packet reports.
    pub fn with_packets(mut self, print_packets: bool) -> Self {
        self.print_packets = print_packets;
        self
    }

    /// Write to `out` instead of standard output.
    pub fn with_writer(mut self, out: impl Write + Send + 'static) -> Self {
        self.out = Box::new(out);
        self
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketReporter for ConsoleReporter {
    fn report(&mut self, packet: &DhcpPacket) {
        if !self.print_packets {
            return;
        }
        let output = format_packet(packet);
        let _ = writeln!(self.out, "{}", output);
    }

    fn on_start(&mut self, interface: &str) {
        let _ = writeln!(self.out, "Analyze DHCP packets on device {}", interface);
        let _ = self.out.flush();
    }
}
