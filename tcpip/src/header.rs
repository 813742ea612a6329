use crate::checksum::Checksum;

/// チェックサムフィールドを持つ固定レイアウトのヘッダー
///
/// チェックサムの計算はフィールドを0とみなして行い、ヘッダー自体は変更しない。
/// 計算結果の書き込みは呼び出し側が明示的に行う。
pub trait ChecksumHeader {
    /// チェックサムフィールドの先頭からのオフセット
    const CHECKSUM_OFFSET: usize;

    /// ヘッダーのバイト列
    fn as_bytes(&self) -> &[u8];

    /// チェックサムフィールドの値
    fn checksum(&self) -> u16 {
        let bytes = self.as_bytes();
        u16::from_be_bytes([
            bytes[Self::CHECKSUM_OFFSET],
            bytes[Self::CHECKSUM_OFFSET + 1],
        ])
    }

    /// チェックサムフィールドを0とみなしてヘッダーをアキュムレータに加算
    fn add_to(&self, acc: &mut Checksum) {
        let bytes = self.as_bytes();
        acc.add_bytes(&bytes[..Self::CHECKSUM_OFFSET]);
        acc.add_bytes(&[0, 0]);
        acc.add_bytes(&bytes[Self::CHECKSUM_OFFSET + 2..]);
    }

    /// チェックサムフィールドを0とみなしたヘッダーの部分和
    fn partial_checksum(&self, initial: u16) -> u16 {
        let mut acc = Checksum::new(initial);
        self.add_to(&mut acc);
        acc.sum()
    }
}

/// バイト列のチェックサムフィールドに値を書き込む
pub(crate) fn put_checksum(bytes: &mut [u8], offset: usize, checksum: u16) {
    bytes[offset..offset + 2].copy_from_slice(&checksum.to_be_bytes());
}
