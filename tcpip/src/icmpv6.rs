use std::net::Ipv6Addr;

use thiserror::Error;

use crate::buffer::Segments;
use crate::checksum::Checksum;
use crate::header::{ChecksumHeader, put_checksum};
use crate::ipv4::Protocol;
use crate::pseudo_header::pseudo_header_checksum;

/// ICMPv6ヘッダー処理に関するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ICMPv6Error {
    #[error("Invalid ICMPv6 packet length: must be at least {0} bytes, but got {1} bytes")]
    InvalidPacketLength(usize, usize),
}

/// ICMPv6ヘッダー
///
/// Type(1) + Code(1) + Checksum(2) + メッセージ固有の4バイトから成る
/// 固定長部分を持つバイト列のビュー。
///
/// 参照:
/// - [RFC 4443 - Internet Control Message Protocol (ICMPv6) for IPv6](https://tools.ietf.org/rfc/rfc4443.txt)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ICMPv6Header<T> {
    buffer: T,
}

impl<T: AsRef<[u8]>> ICMPv6Header<T> {
    /// ヘッダーの最小長
    pub const MINIMUM_SIZE: usize = 8;

    pub const ECHO_REQUEST: u8 = 128;
    pub const ECHO_REPLY: u8 = 129;

    pub fn try_from_bytes(buffer: T) -> Result<Self, ICMPv6Error> {
        let len = buffer.as_ref().len();
        if len < Self::MINIMUM_SIZE {
            return Err(ICMPv6Error::InvalidPacketLength(Self::MINIMUM_SIZE, len));
        }
        Ok(Self { buffer })
    }

    pub fn len(&self) -> usize {
        self.buffer.as_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn message_type(&self) -> u8 {
        self.buffer.as_ref()[0]
    }

    pub fn code(&self) -> u8 {
        self.buffer.as_ref()[1]
    }

    /// エラーメッセージ（0-127）かどうか
    pub fn is_error_message(&self) -> bool {
        self.message_type() < 128
    }

    /// Echoメッセージの識別子
    pub fn identifier(&self) -> u16 {
        let bytes = self.buffer.as_ref();
        u16::from_be_bytes([bytes[4], bytes[5]])
    }

    /// Echoメッセージのシーケンス番号
    pub fn sequence_number(&self) -> u16 {
        let bytes = self.buffer.as_ref();
        u16::from_be_bytes([bytes[6], bytes[7]])
    }

    pub fn into_inner(self) -> T {
        self.buffer
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> ICMPv6Header<T> {
    pub fn set_message_type(&mut self, message_type: u8) {
        self.buffer.as_mut()[0] = message_type;
    }

    pub fn set_code(&mut self, code: u8) {
        self.buffer.as_mut()[1] = code;
    }

    /// チェックサムフィールドに値を書き込む
    pub fn set_checksum(&mut self, checksum: u16) {
        put_checksum(self.buffer.as_mut(), Self::CHECKSUM_OFFSET, checksum);
    }
}

impl<T: AsRef<[u8]>> ChecksumHeader for ICMPv6Header<T> {
    const CHECKSUM_OFFSET: usize = 2;

    fn as_bytes(&self) -> &[u8] {
        self.buffer.as_ref()
    }
}

/// 疑似ヘッダーの部分和を初期値とするアキュムレータ
///
/// 上位層の長さは32ビットに収まらない場合 `u32::MAX` に飽和させる。
fn pseudo_header_accumulator<T, B>(
    header: &ICMPv6Header<T>,
    src: Ipv6Addr,
    dst: Ipv6Addr,
    payload: &B,
) -> Checksum
where
    T: AsRef<[u8]>,
    B: Segments + ?Sized,
{
    let length = u32::try_from(header.len() + payload.total_len()).unwrap_or(u32::MAX);
    Checksum::new(pseudo_header_checksum(Protocol::IPv6ICMP, src, dst, length))
}

/// ICMPv6のチェックサムを計算
///
/// 疑似ヘッダー・ヘッダー(チェックサムフィールドは0とみなす)・ペイロードの和の
/// 1の補数を返す。ヘッダーへの書き込みは行わない。
pub fn icmpv6_checksum<T, B>(
    header: &ICMPv6Header<T>,
    src: Ipv6Addr,
    dst: Ipv6Addr,
    payload: &B,
) -> u16
where
    T: AsRef<[u8]>,
    B: Segments + ?Sized,
{
    let mut acc = pseudo_header_accumulator(header, src, dst, payload);
    header.add_to(&mut acc);
    for segment in payload.segments() {
        acc.add_bytes(segment);
    }
    !acc.sum()
}

/// ICMPv6のチェックサムを検証
pub fn verify_icmpv6_checksum<T, B>(
    header: &ICMPv6Header<T>,
    src: Ipv6Addr,
    dst: Ipv6Addr,
    payload: &B,
) -> bool
where
    T: AsRef<[u8]>,
    B: Segments + ?Sized,
{
    let mut acc = pseudo_header_accumulator(header, src, dst, payload);
    acc.add_bytes(header.as_bytes());
    for segment in payload.segments() {
        acc.add_bytes(segment);
    }
    acc.sum() == 0xFFFF
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::thread;

    use bytes::Bytes;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    use super::*;
    use crate::buffer::SegmentedBuffer;
    use crate::checksum::{checksum, combine};

    // ICMPv6 Echo Request (::1 -> ::1, "Hello")
    const ICMPV6_ECHO_REQUEST_BYTES: [u8; 13] = [
        0x80, 0x00, // Type: Echo Request, Code: 0
        0x00, 0x00, // Checksum (placeholder)
        0x12, 0x34, // Identifier
        0x56, 0x78, // Sequence Number
        0x48, 0x65, 0x6C, 0x6C, 0x6F, // "Hello"
    ];

    fn random_message(rng: &mut StdRng) -> (ICMPv6Header<[u8; 8]>, SegmentedBuffer, Bytes) {
        let mut bytes = [0u8; 8];
        rng.fill_bytes(&mut bytes);
        let mut header = ICMPv6Header::try_from_bytes(bytes).unwrap();
        header.set_checksum(0);

        let mut buf = [0u8; 13];
        rng.fill_bytes(&mut buf);
        let payload = SegmentedBuffer::new([
            Bytes::copy_from_slice(&buf[..7]),
            Bytes::copy_from_slice(&buf[7..10]),
            Bytes::copy_from_slice(&buf[10..]),
        ]);
        (header, payload, Bytes::copy_from_slice(&buf))
    }

    #[test]
    fn test_icmpv6_header_try_from_bytes() {
        // [正常系] Echo Requestヘッダーのパース
        let header = ICMPv6Header::try_from_bytes(&ICMPV6_ECHO_REQUEST_BYTES[..8]).unwrap();
        assert_eq!(header.message_type(), ICMPv6Header::<&[u8]>::ECHO_REQUEST);
        assert_eq!(header.code(), 0);
        assert_eq!(header.identifier(), 0x1234);
        assert_eq!(header.sequence_number(), 0x5678);
        assert!(!header.is_error_message());

        // [異常系] 最小長に満たない
        assert_eq!(
            ICMPv6Header::try_from_bytes(&ICMPV6_ECHO_REQUEST_BYTES[..4]).unwrap_err(),
            ICMPv6Error::InvalidPacketLength(8, 4)
        );
    }

    #[test]
    fn test_icmpv6_checksum_known_message() {
        // [正常系] 疑似ヘッダーを含めた和と一致する
        let src = Ipv6Addr::LOCALHOST;
        let dst = Ipv6Addr::LOCALHOST;
        let header = ICMPv6Header::try_from_bytes(&ICMPV6_ECHO_REQUEST_BYTES[..8]).unwrap();
        let payload = [&ICMPV6_ECHO_REQUEST_BYTES[8..]];

        // 疑似ヘッダー: 0x0001 + 0x0001 + 長さ13 + 次ヘッダー58
        // ICMPv6: 0x8000 + 0x1234 + 0x5678 + "Hello"
        let want = !combine(&[
            0x0001,
            0x0001,
            13,
            58,
            0x8000,
            0x1234,
            0x5678,
            checksum(b"Hello", 0),
        ]);
        assert_eq!(icmpv6_checksum(&header, src, dst, &payload), want);
    }

    #[test]
    fn test_icmpv6_checksum_round_trip() {
        // [正常系] 計算したチェックサムを書き込むと検証に成功する
        let mut rng = StdRng::seed_from_u64(42);
        let (mut header, payload, flat) = random_message(&mut rng);
        let src = Ipv6Addr::LOCALHOST;
        let dst = Ipv6Addr::LOCALHOST;

        let mut want = pseudo_header_checksum(
            Protocol::IPv6ICMP,
            src,
            dst,
            (header.len() + payload.len()) as u32,
        );
        want = checksum(&flat, want);
        want = !checksum(header.as_bytes(), want);
        assert_eq!(icmpv6_checksum(&header, src, dst, &payload), want);

        header.set_checksum(want);
        assert_eq!(icmpv6_checksum(&header, src, dst, &payload), want);
        assert!(verify_icmpv6_checksum(&header, src, dst, &payload));

        // [異常系] 宛先アドレスが異なると検証に失敗する
        let wrong_dst = Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1);
        assert!(!verify_icmpv6_checksum(&header, src, wrong_dst, &payload));
    }

    #[test]
    fn test_icmpv6_checksum_odd_length_header() {
        // [正常系] ヘッダーが奇数長でも送信順に連結したバイト列のチェックサムと一致する
        let src = Ipv6Addr::LOCALHOST;
        let dst = Ipv6Addr::LOCALHOST;
        let header = ICMPv6Header::try_from_bytes([0x80u8, 0, 0, 0, 1, 2, 3, 4, 0xAB]).unwrap();
        let payload: [&[u8]; 2] = [&[0x11, 0x22], &[0x33]];

        let wire = [0x80u8, 0, 0, 0, 1, 2, 3, 4, 0xAB, 0x11, 0x22, 0x33];
        let pseudo = pseudo_header_checksum(Protocol::IPv6ICMP, src, dst, wire.len() as u32);
        let want = !checksum(&wire, pseudo);
        assert_eq!(icmpv6_checksum(&header, src, dst, &payload), want);

        let mut header = ICMPv6Header::try_from_bytes([0x80u8, 0, 0, 0, 1, 2, 3, 4, 0xAB]).unwrap();
        header.set_checksum(want);
        assert!(verify_icmpv6_checksum(&header, src, dst, &payload));
    }

    /// 長さだけを報告する断片の列
    struct OversizedPayload;

    impl Segments for OversizedPayload {
        fn segments(&self) -> impl Iterator<Item = &[u8]> {
            std::iter::empty()
        }

        fn total_len(&self) -> usize {
            u32::MAX as usize + 10
        }
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_icmpv6_checksum_length_saturates() {
        // [異常系] 上位層の長さが32ビットを超える場合は切り捨てずに飽和させる
        let src = Ipv6Addr::LOCALHOST;
        let dst = Ipv6Addr::LOCALHOST;
        let header = ICMPv6Header::try_from_bytes(&ICMPV6_ECHO_REQUEST_BYTES[..8]).unwrap();

        let pseudo = pseudo_header_checksum(Protocol::IPv6ICMP, src, dst, u32::MAX);
        let want = !header.partial_checksum(pseudo);
        assert_eq!(icmpv6_checksum(&header, src, dst, &OversizedPayload), want);

        let truncated = pseudo_header_checksum(Protocol::IPv6ICMP, src, dst, 17);
        assert_ne!(want, !header.partial_checksum(truncated));
    }

    #[test]
    fn test_icmpv6_checksum_concurrent() {
        // [正常系] 同じヘッダーとバッファに対して並行に計算しても結果は同じ
        const CONCURRENCY: usize = 5;

        let mut rng = StdRng::seed_from_u64(42);
        let (mut header, payload, _) = random_message(&mut rng);
        let src = Ipv6Addr::LOCALHOST;
        let dst = Ipv6Addr::LOCALHOST;
        let want = icmpv6_checksum(&header, src, dst, &payload);
        header.set_checksum(want);

        let header = &header;
        let payload = &payload;
        let start = Barrier::new(CONCURRENCY);
        thread::scope(|s| {
            let handles: Vec<_> = (0..CONCURRENCY)
                .map(|_| {
                    let start = &start;
                    s.spawn(move || {
                        start.wait();
                        (
                            header.checksum(),
                            icmpv6_checksum(header, src, dst, payload),
                        )
                    })
                })
                .collect();

            for handle in handles {
                assert_eq!(handle.join().unwrap(), (want, want));
            }
        });
    }
}
