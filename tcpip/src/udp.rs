use thiserror::Error;

use crate::buffer::Segments;
use crate::checksum::Checksum;
use crate::header::{ChecksumHeader, put_checksum};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UDPError {
    #[error("Invalid UDP header length. Expected {0} bytes, but got {1} bytes.")]
    InvalidHeaderLength(usize, usize),
}

/// UDPヘッダー
///
/// 参照:
/// - [RFC 768 - User Datagram Protocol](https://tools.ietf.org/rfc/rfc768.txt)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UDPHeader<T> {
    buffer: T,
}

impl<T: AsRef<[u8]>> UDPHeader<T> {
    pub const SIZE: usize = 8;

    /// 先頭8バイトをUDPヘッダーとして扱う
    pub fn try_from_bytes(buffer: T) -> Result<Self, UDPError> {
        let len = buffer.as_ref().len();
        if len < Self::SIZE {
            return Err(UDPError::InvalidHeaderLength(Self::SIZE, len));
        }
        Ok(Self { buffer })
    }

    pub fn src_port(&self) -> u16 {
        let bytes = self.buffer.as_ref();
        u16::from_be_bytes([bytes[0], bytes[1]])
    }

    pub fn dst_port(&self) -> u16 {
        let bytes = self.buffer.as_ref();
        u16::from_be_bytes([bytes[2], bytes[3]])
    }

    /// ヘッダーとデータを合わせた長さ
    pub fn length(&self) -> u16 {
        let bytes = self.buffer.as_ref();
        u16::from_be_bytes([bytes[4], bytes[5]])
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> UDPHeader<T> {
    /// チェックサムフィールドに値を書き込む
    pub fn set_checksum(&mut self, checksum: u16) {
        put_checksum(self.buffer.as_mut(), Self::CHECKSUM_OFFSET, checksum);
    }
}

impl<T: AsRef<[u8]>> ChecksumHeader for UDPHeader<T> {
    const CHECKSUM_OFFSET: usize = 6;

    fn as_bytes(&self) -> &[u8] {
        &self.buffer.as_ref()[..Self::SIZE]
    }
}

/// UDPのチェックサムを計算
///
/// `pseudo_header` には疑似ヘッダーの部分和を渡す。
/// 計算結果が0になる場合は、チェックサムなしと区別するため0xFFFFを返す。
pub fn udp_checksum<T, B>(header: &UDPHeader<T>, pseudo_header: u16, payload: &B) -> u16
where
    T: AsRef<[u8]>,
    B: Segments + ?Sized,
{
    let mut acc = Checksum::new(pseudo_header);
    header.add_to(&mut acc);
    for segment in payload.segments() {
        acc.add_bytes(segment);
    }
    match !acc.sum() {
        0 => 0xFFFF,
        checksum => checksum,
    }
}

/// UDPのチェックサムを検証
///
/// チェックサムフィールドが0のデータグラムは不正とみなす。
/// IPv6ではチェックサムの省略は許可されない([RFC 8200 8.1](https://tools.ietf.org/rfc/rfc8200.txt))。
pub fn verify_udp_checksum<T, B>(header: &UDPHeader<T>, pseudo_header: u16, payload: &B) -> bool
where
    T: AsRef<[u8]>,
    B: Segments + ?Sized,
{
    if header.checksum() == 0 {
        return false;
    }
    let mut acc = Checksum::new(pseudo_header);
    acc.add_bytes(header.as_bytes());
    for segment in payload.segments() {
        acc.add_bytes(segment);
    }
    acc.sum() == 0xFFFF
}

/// IPv4上のUDPのチェックサムを検証
///
/// チェックサムフィールドが0の場合はチェックサムなしとみなし、検証しない。
pub fn verify_udp_checksum_v4<T, B>(
    header: &UDPHeader<T>,
    pseudo_header: u16,
    payload: &B,
) -> bool
where
    T: AsRef<[u8]>,
    B: Segments + ?Sized,
{
    header.checksum() == 0 || verify_udp_checksum(header, pseudo_header, payload)
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr};

    use super::*;
    use crate::ipv4::Protocol;
    use crate::pseudo_header::{pseudo_header_checksum, pseudo_header_checksum_v4};

    #[test]
    fn test_udp_header_try_from_bytes() {
        // [正常系] ヘッダーのパース
        let bytes = [0x00, 0x35, 0xC3, 0x50, 0x00, 0x0C, 0x12, 0x34, 0xAA, 0xBB];
        let header = UDPHeader::try_from_bytes(&bytes[..]).unwrap();
        assert_eq!(header.src_port(), 53);
        assert_eq!(header.dst_port(), 50000);
        assert_eq!(header.length(), 12);
        assert_eq!(header.checksum(), 0x1234);
        assert_eq!(header.as_bytes().len(), 8);

        // [異常系] 長さが足りない
        assert_eq!(
            UDPHeader::try_from_bytes(&bytes[..6]).unwrap_err(),
            UDPError::InvalidHeaderLength(8, 6)
        );
    }

    #[test]
    fn test_udp_checksum_ipv4_round_trip() {
        // [正常系] IPv4疑似ヘッダーを用いた計算と検証
        let mut header = UDPHeader::try_from_bytes([0x30, 0x39, 0x00, 0x35, 0x00, 0x0D, 0, 0])
            .unwrap();
        let payload: [&[u8]; 2] = [b"he", b"llo"];
        let pseudo = pseudo_header_checksum_v4(
            Protocol::UDP,
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(10, 0, 0, 2),
            header.length(),
        );

        let checksum = udp_checksum(&header, pseudo, &payload);
        assert_ne!(checksum, 0);
        header.set_checksum(checksum);
        assert!(verify_udp_checksum_v4(&header, pseudo, &payload));
        assert!(verify_udp_checksum(&header, pseudo, &payload));

        // [異常系] 疑似ヘッダーが異なると検証に失敗する
        let other = pseudo_header_checksum_v4(
            Protocol::UDP,
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(10, 0, 0, 3),
            header.length(),
        );
        assert!(!verify_udp_checksum_v4(&header, other, &payload));
    }

    #[test]
    fn test_udp_checksum_ipv6_round_trip() {
        // [正常系] IPv6疑似ヘッダーを用いた計算と検証
        let mut header =
            UDPHeader::try_from_bytes(vec![0x30, 0x39, 0x00, 0x35, 0x00, 0x09, 0, 0]).unwrap();
        let payload = vec![vec![0x7Fu8]];
        let pseudo = pseudo_header_checksum(
            Protocol::UDP,
            Ipv6Addr::LOCALHOST,
            Ipv6Addr::LOCALHOST,
            header.length() as u32,
        );

        let checksum = udp_checksum(&header, pseudo, &payload);
        header.set_checksum(checksum);
        assert!(verify_udp_checksum(&header, pseudo, &payload));
    }

    #[test]
    fn test_udp_checksum_zero_is_transmitted_as_all_ones() {
        // [正常系] 和がすべて1になる場合、チェックサムは0ではなく0xFFFFになる
        // ヘッダー: 0xFFFF + 0x0000 + 0x0000 (チェックサムは0とみなす)
        let header = UDPHeader::try_from_bytes([0xFF, 0xFF, 0, 0, 0, 0, 0, 0]).unwrap();
        let payload: [&[u8]; 0] = [];
        assert_eq!(udp_checksum(&header, 0, &payload), 0xFFFF);
    }

    #[test]
    fn test_udp_checksum_disabled() {
        // [正常系] IPv4ではチェックサムが0の場合は検証しない
        let header = UDPHeader::try_from_bytes([0x12, 0x34, 0, 0, 0, 0x08, 0, 0]).unwrap();
        let payload: [&[u8]; 0] = [];
        assert!(verify_udp_checksum_v4(&header, 0xABCD, &payload));

        // [異常系] IPv6ではチェックサムが0のデータグラムは不正
        let pseudo = pseudo_header_checksum(
            Protocol::UDP,
            Ipv6Addr::LOCALHOST,
            Ipv6Addr::LOCALHOST,
            header.length() as u32,
        );
        assert!(!verify_udp_checksum(&header, pseudo, &payload));
    }

    #[test]
    fn test_udp_checksum_zero_rejected_even_when_sum_is_all_ones() {
        // [異常系] 計算上のチェックサムが0xFFFFになる場合でも、格納値0は受け付けない
        let header = UDPHeader::try_from_bytes([0xFF, 0xFF, 0, 0, 0, 0, 0, 0]).unwrap();
        let payload: [&[u8]; 0] = [];
        assert_eq!(udp_checksum(&header, 0, &payload), 0xFFFF);
        assert!(!verify_udp_checksum(&header, 0, &payload));
        assert!(verify_udp_checksum_v4(&header, 0, &payload));
    }
}
