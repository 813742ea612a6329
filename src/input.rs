use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::{fs, io};

use bytes::Bytes;
use tcpip::buffer::SegmentedBuffer;
use thiserror::Error;

use crate::config::InputFormat;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum InputError {
    #[error("Failed to read {0}. error: {1}")]
    ReadFileError(PathBuf, io::ErrorKind),
    #[error("Invalid hex digit {0:?} at position {1}")]
    InvalidHexDigit(char, usize),
    #[error("Hex input has an odd number of digits: {0}")]
    OddHexLength(usize),
}

/// 入力ファイルを読み込み、`segment_size` ごとの断片に分割する
pub(crate) fn load(
    path: impl AsRef<Path>,
    format: InputFormat,
    segment_size: NonZeroUsize,
) -> Result<SegmentedBuffer, InputError> {
    let path = path.as_ref();
    let content =
        fs::read(path).map_err(|e| InputError::ReadFileError(path.to_path_buf(), e.kind()))?;
    let data = match format {
        InputFormat::Binary => content,
        InputFormat::Hex => decode_hex(&content)?,
    };
    Ok(split(Bytes::from(data), segment_size))
}

/// 16進文字列をバイト列に変換
///
/// 空白文字は読み飛ばす。
pub(crate) fn decode_hex(input: &[u8]) -> Result<Vec<u8>, InputError> {
    let digits = input
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.is_ascii_whitespace())
        .map(|(i, &c)| {
            (c as char)
                .to_digit(16)
                .map(|d| d as u8)
                .ok_or(InputError::InvalidHexDigit(c as char, i))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if digits.len() % 2 != 0 {
        return Err(InputError::OddHexLength(digits.len()));
    }
    Ok(digits.chunks_exact(2).map(|d| (d[0] << 4) | d[1]).collect())
}

/// 参照カウントを共有したまま断片に分割
pub(crate) fn split(data: Bytes, segment_size: NonZeroUsize) -> SegmentedBuffer {
    let segment_size = segment_size.get();
    SegmentedBuffer::new(
        (0..data.len())
            .step_by(segment_size)
            .map(|start| data.slice(start..(start + segment_size).min(data.len()))),
    )
}
