//! 上位層チェックサムのための疑似ヘッダー
//!
//! 参照:
//! - [RFC 8200 Section 8.1 - Upper-Layer Checksums](https://tools.ietf.org/rfc/rfc8200.txt)
//! - [RFC 768 - User Datagram Protocol](https://tools.ietf.org/rfc/rfc768.txt)

use std::net::{Ipv4Addr, Ipv6Addr};

use bytes::{BufMut, BytesMut};

use crate::checksum::checksum;
use crate::ipv4::Protocol;

/// IPv6疑似ヘッダーの長さ
pub const IPV6_PSEUDO_HEADER_LENGTH: usize = 40;

/// IPv4疑似ヘッダーの長さ
pub const IPV4_PSEUDO_HEADER_LENGTH: usize = 12;

/// IPv6疑似ヘッダーの部分和を計算
///
/// 送信元アドレス(16)、宛先アドレス(16)、上位層パケット長(32bit)、
/// ゼロ(24bit)、Next Header(8bit)の順に並べたバイト列を初期値0から加算する。
pub fn pseudo_header_checksum(
    protocol: Protocol,
    src: Ipv6Addr,
    dst: Ipv6Addr,
    total_length: u32,
) -> u16 {
    let mut data = BytesMut::with_capacity(IPV6_PSEUDO_HEADER_LENGTH);
    data.extend_from_slice(&src.octets());
    data.extend_from_slice(&dst.octets());
    data.put_u32(total_length);
    data.extend_from_slice(&[0; 3]);
    data.put_u8(protocol.into());

    checksum(&data, 0)
}

/// IPv4疑似ヘッダーの部分和を計算
///
/// 送信元アドレス(4)、宛先アドレス(4)、ゼロ(8bit)、プロトコル(8bit)、
/// 上位層パケット長(16bit)の順に並べたバイト列を初期値0から加算する。
pub fn pseudo_header_checksum_v4(
    protocol: Protocol,
    src: Ipv4Addr,
    dst: Ipv4Addr,
    total_length: u16,
) -> u16 {
    let mut data = BytesMut::with_capacity(IPV4_PSEUDO_HEADER_LENGTH);
    data.extend_from_slice(&src.octets());
    data.extend_from_slice(&dst.octets());
    data.put_u8(0);
    data.put_u8(protocol.into());
    data.put_u16(total_length);

    checksum(&data, 0)
}
