mod protocol;

use std::net::Ipv4Addr;

use thiserror::Error;

pub use self::protocol::{Protocol, ProtocolError};
use crate::checksum::checksum;
use crate::header::{ChecksumHeader, put_checksum};

/// IPv4ヘッダー処理に関するエラー
///
/// IPv4ヘッダーのパース・検証で発生する可能性のあるエラーを定義します。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IPv4Error {
    #[error("Invalid IPv4 packet length: must be at least {0} bytes, but got {1} bytes")]
    InvalidPacketLength(usize, usize),

    #[error("Invalid IPv4 Version: must be 4 but {0}")]
    InvalidVersion(u8),

    #[error("Invalid IPv4 Header Length: must be at least 5 (20 bytes) but {0}")]
    InvalidHeaderLength(u8),
}

/// IPv4ヘッダー
///
/// オプションを含むヘッダー部分のビュー。
/// ヘッダーチェックサムはヘッダー部分のみを対象とする。
///
/// 参照:
/// - [RFC 791 - Internet Protocol](https://tools.ietf.org/rfc/rfc791.txt)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IPv4Header<T> {
    buffer: T,
}

impl<T: AsRef<[u8]>> IPv4Header<T> {
    /// バージョン
    /// 常に4
    pub const VERSION: u8 = 4;

    /// オプションなしのヘッダー長
    pub const MINIMUM_SIZE: usize = 20;

    pub fn try_from_bytes(buffer: T) -> Result<Self, IPv4Error> {
        let bytes = buffer.as_ref();
        if bytes.len() < Self::MINIMUM_SIZE {
            return Err(IPv4Error::InvalidPacketLength(
                Self::MINIMUM_SIZE,
                bytes.len(),
            ));
        }

        let version = bytes[0] >> 4;
        if version != Self::VERSION {
            return Err(IPv4Error::InvalidVersion(version));
        }
        // IPヘッダーの長さは4バイト単位
        let ihl = bytes[0] & 0x0F;
        if ihl < 5 {
            return Err(IPv4Error::InvalidHeaderLength(ihl));
        }
        let header_length = ihl as usize * 4;
        if bytes.len() < header_length {
            return Err(IPv4Error::InvalidPacketLength(header_length, bytes.len()));
        }

        Ok(Self { buffer })
    }

    /// オプションを含むヘッダー長(バイト)
    pub fn header_length(&self) -> usize {
        (self.buffer.as_ref()[0] & 0x0F) as usize * 4
    }

    /// Total Length
    pub fn total_length(&self) -> u16 {
        let bytes = self.buffer.as_ref();
        u16::from_be_bytes([bytes[2], bytes[3]])
    }

    pub fn time_to_live(&self) -> u8 {
        self.buffer.as_ref()[8]
    }

    pub fn protocol(&self) -> Result<Protocol, ProtocolError> {
        Protocol::try_from(self.buffer.as_ref()[9])
    }

    pub fn src(&self) -> Ipv4Addr {
        let bytes = self.buffer.as_ref();
        Ipv4Addr::new(bytes[12], bytes[13], bytes[14], bytes[15])
    }

    pub fn dst(&self) -> Ipv4Addr {
        let bytes = self.buffer.as_ref();
        Ipv4Addr::new(bytes[16], bytes[17], bytes[18], bytes[19])
    }

    /// ヘッダー以降のバイト列
    pub fn payload(&self) -> &[u8] {
        &self.buffer.as_ref()[self.header_length()..]
    }

    /// ヘッダーチェックサムを計算
    pub fn calculate_checksum(&self) -> u16 {
        !self.partial_checksum(0)
    }

    /// ヘッダーチェックサムを検証
    pub fn validate_checksum(&self) -> bool {
        checksum(self.as_bytes(), 0) == 0xFFFF
    }

    pub fn into_inner(self) -> T {
        self.buffer
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> IPv4Header<T> {
    pub fn set_time_to_live(&mut self, ttl: u8) {
        self.buffer.as_mut()[8] = ttl;
    }

    /// チェックサムフィールドに値を書き込む
    pub fn set_checksum(&mut self, checksum: u16) {
        put_checksum(self.buffer.as_mut(), Self::CHECKSUM_OFFSET, checksum);
    }
}

impl<T: AsRef<[u8]>> ChecksumHeader for IPv4Header<T> {
    const CHECKSUM_OFFSET: usize = 10;

    fn as_bytes(&self) -> &[u8] {
        &self.buffer.as_ref()[..self.header_length()]
    }
}
