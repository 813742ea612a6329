use std::fmt::{self, Display};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Unsupported Protocol: {0}")]
    UnsupportedProtocol(u8),
}

/// 上位プロトコル番号
///
/// Internet Checksumを持つヘッダーを運ぶプロトコルのみを扱う。
///
/// 参照:
/// - [IANA Protocol Numbers](https://www.iana.org/assignments/protocol-numbers/protocol-numbers.xhtml)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Internet Control Message
    /// ref: RFC792
    ICMP = 1,

    /// Internet Group Management
    /// ref: RFC1112
    IGMP = 2,

    /// Transmission Control
    /// ref: RFC9293
    TCP = 6,

    /// User Datagram
    /// ref: RFC768
    UDP = 17,

    /// IPv6 encapsulation
    /// ref: RFC2473
    IPv6 = 41,

    /// ICMP for IPv6
    /// ref: RFC8200
    IPv6ICMP = 58,
}

impl Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::ICMP => write!(f, "Internet Control Message Protocol"),
            Protocol::IGMP => write!(f, "Internet Group Management Protocol"),
            Protocol::TCP => write!(f, "Transmission Control Protocol"),
            Protocol::UDP => write!(f, "User Datagram Protocol"),
            Protocol::IPv6 => write!(f, "IPv6 encapsulation"),
            Protocol::IPv6ICMP => write!(f, "ICMP for IPv6"),
        }
    }
}

impl From<Protocol> for u8 {
    fn from(protocol: Protocol) -> Self {
        protocol as u8
    }
}

impl TryFrom<u8> for Protocol {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Protocol::ICMP),
            2 => Ok(Protocol::IGMP),
            6 => Ok(Protocol::TCP),
            17 => Ok(Protocol::UDP),
            41 => Ok(Protocol::IPv6),
            58 => Ok(Protocol::IPv6ICMP),
            other => Err(ProtocolError::UnsupportedProtocol(other)),
        }
    }
}
