use thiserror::Error;

use crate::buffer::Segments;
use crate::checksum::Checksum;
use crate::header::{ChecksumHeader, put_checksum};

/// ICMPヘッダー処理に関するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ICMPError {
    #[error("Invalid ICMP packet length. Expected at least {0} bytes, but got {1} bytes.")]
    InvalidPacketLength(usize, usize),
}

/// ICMPv4ヘッダー
///
/// Type(1) + Code(1) + Checksum(2) + メッセージ固有の4バイトから成る
/// 固定長部分を持つバイト列のビュー。
///
/// 参照:
/// - [RFC 792 - Internet Control Message Protocol](https://tools.ietf.org/rfc/rfc792.txt)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ICMPv4Header<T> {
    buffer: T,
}

impl<T: AsRef<[u8]>> ICMPv4Header<T> {
    /// ヘッダーの最小長
    pub const MINIMUM_SIZE: usize = 8;

    /// Echo Replyのメッセージタイプ
    pub const ECHO_REPLY: u8 = 0;

    /// Echo Requestのメッセージタイプ
    pub const ECHO_REQUEST: u8 = 8;

    pub fn try_from_bytes(buffer: T) -> Result<Self, ICMPError> {
        let len = buffer.as_ref().len();
        if len < Self::MINIMUM_SIZE {
            return Err(ICMPError::InvalidPacketLength(Self::MINIMUM_SIZE, len));
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

impl<T: AsRef<[u8]> + AsMut<[u8]>> ICMPv4Header<T> {
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

    pub fn set_identifier(&mut self, identifier: u16) {
        self.buffer.as_mut()[4..6].copy_from_slice(&identifier.to_be_bytes());
    }

    pub fn set_sequence_number(&mut self, sequence_number: u16) {
        self.buffer.as_mut()[6..8].copy_from_slice(&sequence_number.to_be_bytes());
    }
}

impl<T: AsRef<[u8]>> ChecksumHeader for ICMPv4Header<T> {
    const CHECKSUM_OFFSET: usize = 2;

    fn as_bytes(&self) -> &[u8] {
        self.buffer.as_ref()
    }
}

/// ICMPv4のチェックサムを計算
///
/// ヘッダーのチェックサムフィールドは0とみなし、ヘッダー・ペイロードの順に加算した
/// 和の1の補数を返す。ヘッダーへの書き込みは行わない。
///
/// 送信順に加算するため、ヘッダーが奇数長でもバイトの対は連結後のバイト列と一致する。
pub fn icmp_checksum<T, B>(header: &ICMPv4Header<T>, payload: &B) -> u16
where
    T: AsRef<[u8]>,
    B: Segments + ?Sized,
{
    let mut acc = Checksum::new(0);
    header.add_to(&mut acc);
    for segment in payload.segments() {
        acc.add_bytes(segment);
    }
    !acc.sum()
}

/// ICMPv4のチェックサムを検証
///
/// チェックサムフィールドを含めた全体の和がすべて1であれば正しい。
pub fn verify_icmp_checksum<T, B>(header: &ICMPv4Header<T>, payload: &B) -> bool
where
    T: AsRef<[u8]>,
    B: Segments + ?Sized,
{
    let mut acc = Checksum::new(0);
    acc.add_bytes(header.as_bytes());
    for segment in payload.segments() {
        acc.add_bytes(segment);
    }
    acc.sum() == 0xFFFF
}
