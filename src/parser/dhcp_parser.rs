//! DHCP packet parser implementation.
//!
//! Parses raw DHCPv4 packets according to RFC 2131.

use std::net::Ipv4Addr;

use macaddr::MacAddr6;

use crate::domain::{DhcpOperation, DhcpOption, DhcpPacket, OptionCode};
use crate::error::ParseError;

/// DHCP magic cookie: 0x63825363
pub const DHCP_MAGIC_COOKIE: [u8; 4] = [0x63, 0x82, 0x53, 0x63];

/// Fixed BOOTP header size (without cookie and options)
const BOOTP_HEADER_SIZE: usize = 236;

/// Offset of the first option, right after the magic cookie
const OPTIONS_OFFSET: usize = 240;

/// Parser for DHCPv4 packets.
///
/// Options are kept as raw records; the parser only checks the TLV
/// framing, never the payload of individual options.
pub struct DhcpParser;

impl DhcpParser {
    /// Create a new DHCP parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a DHCP packet from raw bytes.
    ///
    /// The input should be the UDP payload (not including IP/UDP headers).
    pub fn parse(&self, data: &[u8]) -> Result<DhcpPacket, ParseError> {
        if data.len() < OPTIONS_OFFSET {
            return Err(ParseError::PacketTooShort {
                expected: OPTIONS_OFFSET,
                actual: data.len(),
            });
        }

        // BOOTP-only traffic shares ports 67/68 but is not DHCPv4
        if data[BOOTP_HEADER_SIZE..OPTIONS_OFFSET] != DHCP_MAGIC_COOKIE {
            return Err(ParseError::InvalidMagicCookie);
        }

        let op = DhcpOperation::from_u8(data[0])
            .ok_or(ParseError::UnknownOperation(data[0]))?;
        let htype = data[1];
        let hlen = data[2];
        let hops = data[3];
        let xid = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        let secs = u16::from_be_bytes([data[8], data[9]]);
        let flags = u16::from_be_bytes([data[10], data[11]]);

        let ciaddr = Ipv4Addr::new(data[12], data[13], data[14], data[15]);
        let yiaddr = Ipv4Addr::new(data[16], data[17], data[18], data[19]);
        let siaddr = Ipv4Addr::new(data[20], data[21], data[22], data[23]);
        let giaddr = Ipv4Addr::new(data[24], data[25], data[26], data[27]);

        // chaddr is 16 bytes at offset 28; Ethernet uses the first 6
        let chaddr = MacAddr6::new(data[28], data[29], data[30], data[31], data[32], data[33]);

        let options = self.parse_options(&data[OPTIONS_OFFSET..])?;

        Ok(DhcpPacket {
            op,
            htype,
            hlen,
            hops,
            xid,
            secs,
            flags,
            ciaddr,
            yiaddr,
            siaddr,
            giaddr,
            chaddr,
            options,
        })
    }

    /// Parse the option area into type/length/data records.
    fn parse_options(&self, data: &[u8]) -> Result<Vec<DhcpOption>, ParseError> {
        let mut options = Vec::new();
        let mut offset = 0;

        while offset < data.len() {
            let code = OptionCode(data[offset]);

            if code == OptionCode::PAD {
                offset += 1;
                continue;
            }

            if code == OptionCode::END {
                break;
            }

            if offset + 1 >= data.len() {
                return Err(ParseError::InvalidOption {
                    offset,
                    message: "option length missing".to_string(),
                });
            }

            let len = data[offset + 1] as usize;

            if offset + 2 + len > data.len() {
                return Err(ParseError::InvalidOption {
                    offset,
                    message: format!(
                        "option data truncated: expected {} bytes, have {}",
                        len,
                        data.len() - offset - 2
                    ),
                });
            }

            options.push(DhcpOption::new(code, &data[offset + 2..offset + 2 + len]));

            offset += 2 + len;
        }

        Ok(options)
    }
}

impl Default for DhcpParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_payload(options: &[u8]) -> Vec<u8> {
        let mut packet = vec![0u8; OPTIONS_OFFSET];

        // Op: BOOTREQUEST
        packet[0] = 1;
        // Hardware type: Ethernet
        packet[1] = 1;
        // Hardware address length
        packet[2] = 6;
        // XID
        packet[4..8].copy_from_slice(&0x12345678u32.to_be_bytes());
        // yiaddr
        packet[16..20].copy_from_slice(&[10, 0, 0, 5]);
        // MAC address
        packet[28..34].copy_from_slice(&[0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        // Magic cookie
        packet[236..240].copy_from_slice(&DHCP_MAGIC_COOKIE);
        packet.extend_from_slice(options);
        packet
    }

    #[test]
    fn test_parse_minimum_packet() {
        let parser = DhcpParser::new();
        let packet = create_test_payload(&[53, 1, 1, 255]);

        let dhcp = parser.parse(&packet).unwrap();
        assert_eq!(dhcp.op, DhcpOperation::Request);
        assert_eq!(dhcp.xid, 0x12345678);
        assert_eq!(dhcp.yiaddr, Ipv4Addr::new(10, 0, 0, 5));
        assert_eq!(dhcp.ciaddr, Ipv4Addr::UNSPECIFIED);
        assert_eq!(
            dhcp.chaddr,
            MacAddr6::new(0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff)
        );
        assert_eq!(dhcp.options, vec![DhcpOption::new(OptionCode(53), vec![1])]);
    }

    #[test]
    fn test_options_keep_wire_order_and_skip_padding() {
        let parser = DhcpParser::new();
        let packet = create_test_payload(&[0, 0, 12, 2, b'h', b'i', 0, 55, 3, 1, 3, 6, 255, 99]);

        let dhcp = parser.parse(&packet).unwrap();
        assert_eq!(
            dhcp.options,
            vec![
                DhcpOption::new(OptionCode(12), b"hi".to_vec()),
                DhcpOption::new(OptionCode(55), vec![1, 3, 6]),
            ]
        );
    }

    #[test]
    fn test_malformed_option_payload_is_kept() {
        let parser = DhcpParser::new();
        let packet = create_test_payload(&[51, 2, 0, 1, 255]);

        let dhcp = parser.parse(&packet).unwrap();
        assert_eq!(dhcp.options, vec![DhcpOption::new(OptionCode(51), vec![0, 1])]);
    }

    #[test]
    fn test_options_without_end_marker() {
        let parser = DhcpParser::new();
        let packet = create_test_payload(&[53, 1, 5]);

        let dhcp = parser.parse(&packet).unwrap();
        assert_eq!(dhcp.options.len(), 1);
    }

    #[test]
    fn test_truncated_option() {
        let parser = DhcpParser::new();
        let packet = create_test_payload(&[12, 10, b'a']);

        let result = parser.parse(&packet);
        assert!(matches!(result, Err(ParseError::InvalidOption { offset: 0, .. })));
    }

    #[test]
    fn test_missing_option_length() {
        let parser = DhcpParser::new();
        let packet = create_test_payload(&[12]);

        let result = parser.parse(&packet);
        assert!(matches!(result, Err(ParseError::InvalidOption { .. })));
    }

    #[test]
    fn test_packet_too_short() {
        let parser = DhcpParser::new();
        let packet = vec![0u8; 100];

        let result = parser.parse(&packet);
        assert_eq!(
            result.unwrap_err(),
            ParseError::PacketTooShort {
                expected: 240,
                actual: 100
            }
        );
    }

    #[test]
    fn test_bootp_without_cookie() {
        let parser = DhcpParser::new();
        let mut packet = create_test_payload(&[255]);
        packet[236] = 0;

        assert_eq!(parser.parse(&packet).unwrap_err(), ParseError::InvalidMagicCookie);
    }

    #[test]
    fn test_unknown_operation() {
        let parser = DhcpParser::new();
        let mut packet = create_test_payload(&[255]);
        packet[0] = 7;

        assert_eq!(parser.parse(&packet).unwrap_err(), ParseError::UnknownOperation(7));
    }
}
