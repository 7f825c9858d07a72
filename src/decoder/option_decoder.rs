//! Option value decoding.

use std::fmt;
use std::net::Ipv4Addr;

use crate::domain::{DhcpMessageType, DhcpOption, OptionCode, ValueKind};

/// Marker shown in place of a value whose payload length is wrong.
pub const INVALID: &str = "INVALID";

/// A typed option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedValue {
    Text(String),
    /// Raw message type byte; unknown values render as `Unknown`
    MessageType(u8),
    Address(Ipv4Addr),
    Timer(u32),
    ParameterList(Vec<OptionCode>),
    Raw(Vec<u8>),
    /// Payload length violated the option's length rule
    Invalid,
}

impl DecodedValue {
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid)
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::MessageType(value) => match DhcpMessageType::from_u8(*value) {
                Some(msg_type) => f.write_str(msg_type.as_str()),
                None => f.write_str("Unknown"),
            },
            Self::Address(addr) => write!(f, "{addr}"),
            Self::Timer(seconds) => write!(f, "{seconds}"),
            Self::ParameterList(codes) => {
                for (i, code) in codes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    f.write_str(&code.name())?;
                }
                Ok(())
            }
            Self::Raw(bytes) => write!(f, "{bytes:?}"),
            Self::Invalid => f.write_str(INVALID),
        }
    }
}

/// Decode an option payload according to its code.
///
/// Never fails: a payload whose length does not satisfy the option's
/// length rule decodes to [`DecodedValue::Invalid`].
pub fn decode(code: OptionCode, data: &[u8]) -> DecodedValue {
    let kind = code.kind();
    if !kind.length_rule().accepts(data.len()) {
        return DecodedValue::Invalid;
    }

    match kind {
        ValueKind::Text => DecodedValue::Text(String::from_utf8_lossy(data).into_owned()),
        ValueKind::MessageType => match data {
            [value] => DecodedValue::MessageType(*value),
            _ => DecodedValue::Invalid,
        },
        ValueKind::Ipv4 => match data {
            [a, b, c, d, ..] => DecodedValue::Address(Ipv4Addr::new(*a, *b, *c, *d)),
            _ => DecodedValue::Invalid,
        },
        ValueKind::Timer => match <[u8; 4]>::try_from(data) {
            Ok(bytes) => DecodedValue::Timer(u32::from_be_bytes(bytes)),
            Err(_) => DecodedValue::Invalid,
        },
        ValueKind::ParameterList => {
            DecodedValue::ParameterList(data.iter().copied().map(OptionCode).collect())
        }
        ValueKind::Raw => DecodedValue::Raw(data.to_vec()),
    }
}

/// Decode an option record.
pub fn decode_option(option: &DhcpOption) -> DecodedValue {
    decode(option.code, &option.data)
}

/// Render an option as a report line body: padded name, ` : `, value.
pub fn render_option(option: &DhcpOption) -> String {
    format!("{:<15} : {}", option.code.name(), decode_option(option))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS_CODES: [u8; 5] = [1, 28, 32, 50, 54];
    const TIMER_CODES: [u8; 6] = [24, 35, 38, 51, 58, 59];

    fn decode_str(code: u8, data: &[u8]) -> String {
        decode(OptionCode(code), data).to_string()
    }

    #[test]
    fn test_address_options() {
        for code in ADDRESS_CODES {
            assert_eq!(decode_str(code, &[192, 168, 1, 1]), "192.168.1.1");
        }
    }

    #[test]
    fn test_address_uses_first_four_bytes() {
        assert_eq!(decode_str(1, &[255, 255, 255, 0, 9, 9]), "255.255.255.0");
    }

    #[test]
    fn test_address_too_short() {
        for code in ADDRESS_CODES {
            assert_eq!(decode_str(code, &[192, 168, 1]), INVALID);
            assert_eq!(decode_str(code, &[]), INVALID);
        }
    }

    #[test]
    fn test_message_type() {
        assert_eq!(decode_str(53, &[5]), "Ack");
        assert_eq!(decode_str(53, &[1]), "Discover");
        assert_eq!(decode_str(53, &[42]), "Unknown");
    }

    #[test]
    fn test_message_type_wrong_length() {
        assert_eq!(decode_str(53, &[]), INVALID);
        assert_eq!(decode_str(53, &[5, 5]), INVALID);
    }

    #[test]
    fn test_timer_options() {
        for code in TIMER_CODES {
            assert_eq!(decode_str(code, &[0, 0, 14, 16]), "3600");
        }
        assert_eq!(decode_str(51, &[0xff, 0xff, 0xff, 0xff]), "4294967295");
    }

    #[test]
    fn test_timer_wrong_length() {
        for code in TIMER_CODES {
            assert_eq!(decode_str(code, &[0, 14, 16]), INVALID);
            assert_eq!(decode_str(code, &[0, 0, 0, 14, 16]), INVALID);
        }
    }

    #[test]
    fn test_parameter_request_list() {
        assert_eq!(
            decode_str(55, &[1, 3, 6]),
            "SubnetMask,Router,DomainNameServer"
        );
        assert_eq!(decode_str(55, &[]), "");
        assert_eq!(decode_str(55, &[15, 250]), "DomainName,Unknown(250)");
    }

    #[test]
    fn test_text_options() {
        assert_eq!(decode_str(12, b"workstation-7"), "workstation-7");
        assert_eq!(decode_str(15, b"example.org"), "example.org");
        assert_eq!(decode_str(56, b""), "");
    }

    #[test]
    fn test_text_is_lossy() {
        assert_eq!(decode_str(12, &[b'a', 0xff, b'b']), "a\u{fffd}b");
    }

    #[test]
    fn test_unknown_code_is_raw() {
        assert_eq!(decode_str(224, &[1, 2, 3]), "[1, 2, 3]");
        assert_eq!(decode_str(224, &[]), "[]");
        assert_eq!(decode(OptionCode(224), &[7]), DecodedValue::Raw(vec![7]));
    }

    #[test]
    fn test_render_option() {
        let option = DhcpOption::new(OptionCode::MESSAGE_TYPE, vec![1]);
        assert_eq!(render_option(&option), "MessageType     : Discover");

        let option = DhcpOption::new(OptionCode::PARAMETER_REQUEST_LIST, vec![1, 3]);
        assert_eq!(
            render_option(&option),
            "ParameterRequestList : SubnetMask,Router"
        );
    }

    #[test]
    fn test_invalid_flag() {
        assert!(decode(OptionCode::LEASE_TIME, &[1]).is_invalid());
        assert!(!decode(OptionCode::LEASE_TIME, &[0, 0, 0, 1]).is_invalid());
    }
}
