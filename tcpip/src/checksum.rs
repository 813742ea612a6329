//! Internet Checksum 計算モジュール
//!
//! RFC 1071に準拠したInternet Checksumの実装
//! IPv4ヘッダーチェックサムやICMP/ICMPv6/UDPチェックサムで使用される
//!
//! ここで扱う値は補数を取る前の16ビット部分和であり、
//! 戻り値をそのまま次の計算の初期値として渡すことで連鎖計算ができる。
use log::debug;

use crate::buffer::Segments;

/// 1の補数和のアキュムレータ
///
/// 断片化されたバイト列を順に加算するための状態を保持する。
/// 奇数長の断片を加算した場合、最後の1バイトは次の断片の先頭バイトと
/// 組み合わされるまで `pending` に保持される。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checksum {
    sum: u64,
    pending: Option<u8>,
}

impl Checksum {
    /// 初期値を指定してアキュムレータを作成
    pub fn new(initial: u16) -> Self {
        Self {
            sum: initial as u64,
            pending: None,
        }
    }

    /// 断片を加算
    ///
    /// 直前の断片が奇数長で終わっていた場合は、保留中のバイトを
    /// この断片の先頭バイトと組み合わせてから残りを加算する。
    pub fn add_bytes(&mut self, mut data: &[u8]) {
        if let Some(high) = self.pending {
            let Some((&low, rest)) = data.split_first() else {
                return;
            };
            self.sum += u16::from_be_bytes([high, low]) as u64;
            self.pending = None;
            data = rest;
        }

        // 32ビット単位で処理
        // 0x1_0000 ≡ 1 (mod 0xFFFF) なので、上位16ビットと下位16ビットの和と同値
        let mut words = data.chunks_exact(4);
        for word in &mut words {
            self.sum += u32::from_be_bytes([word[0], word[1], word[2], word[3]]) as u64;
        }

        let rest = words.remainder();
        let mut pairs = rest.chunks_exact(2);
        for pair in &mut pairs {
            self.sum += u16::from_be_bytes([pair[0], pair[1]]) as u64;
        }
        self.pending = pairs.remainder().first().copied();
    }

    /// 1バイトの保留があるかどうか
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// 現在までの部分和を取得
    ///
    /// 保留中のバイトは下位バイトを0とした16ビットワードとして扱う。
    pub fn sum(&self) -> u16 {
        let mut sum = self.sum;
        if let Some(high) = self.pending {
            sum += u16::from_be_bytes([high, 0]) as u64;
        }
        fold(sum)
    }
}

/// キャリーを畳み込む
fn fold(mut sum: u64) -> u16 {
    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    sum as u16
}

/// バイト列の1の補数和を計算
///
/// # Arguments
/// * `data` - チェックサムを計算するデータ
/// * `initial` - 初期値(以前の部分和)
///
/// # Returns
/// 補数を取る前の16ビットの部分和
///
/// # Example
/// ```
/// use tcpip::checksum::checksum;
///
/// assert_eq!(checksum(&[1, 9, 0, 5, 4], 0), 1294);
/// ```
pub fn checksum(data: &[u8], initial: u16) -> u16 {
    let mut acc = Checksum::new(initial);
    acc.add_bytes(data);
    acc.sum()
}

/// 複数の部分和を1の補数加算で結合
///
/// 加算は可換かつ結合的なので、順序は結果に影響しない。
pub fn combine(partials: &[u16]) -> u16 {
    fold(partials.iter().map(|&p| p as u64).sum())
}

/// 分割されたバッファの指定範囲の1の補数和を計算
///
/// `offset` から `size` バイトを、ひとつの連続したバイト列とみなして計算する。
/// 範囲の先頭は常に16ビットワードの先頭として扱われる。
///
/// 範囲がバッファの長さを超える場合は、存在するバイトまでに切り詰める。
/// `size` が0の場合は `initial` をそのまま返す。
pub fn checksum_segments<B>(buffer: &B, initial: u16, offset: usize, size: usize) -> u16
where
    B: Segments + ?Sized,
{
    if size == 0 {
        return initial;
    }

    let mut acc = Checksum::new(initial);
    let mut skip = offset;
    let mut remaining = size;
    for segment in buffer.segments() {
        if skip >= segment.len() {
            skip -= segment.len();
            continue;
        }
        let segment = &segment[skip..];
        skip = 0;

        let take = segment.len().min(remaining);
        acc.add_bytes(&segment[..take]);
        remaining -= take;
        if remaining == 0 {
            return acc.sum();
        }
    }

    debug!(
        "Checksum range {offset}+{size} exceeds buffer length {}, clamped",
        buffer.total_len()
    );
    acc.sum()
}

/// 分割されたバッファ全体の1の補数和を計算
pub fn checksum_buffer<B>(buffer: &B, initial: u16) -> u16
where
    B: Segments + ?Sized,
{
    let mut acc = Checksum::new(initial);
    for segment in buffer.segments() {
        acc.add_bytes(segment);
    }
    acc.sum()
}

/// Internet Checksumを計算
///
/// # Arguments
/// * `data` - チェックサムを計算するデータ
///
/// # Returns
/// 1の補数を取った16ビットのチェックサム値
///
/// # Example
/// ```
/// use tcpip::checksum::calculate_internet_checksum;
///
/// let data = vec![0x45, 0x00, 0x00, 0x3c];
/// let checksum = calculate_internet_checksum(&data);
/// ```
pub fn calculate_internet_checksum(data: &[u8]) -> u16 {
    !checksum(data, 0)
}
