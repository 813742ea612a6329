use std::net::Ipv6Addr;

use anyhow::{Context, Result};
use log::{debug, info};
use tcpip::buffer::{SegmentedBuffer, Segments};
use tcpip::checksum::checksum_segments;
use tcpip::header::ChecksumHeader;
use tcpip::icmp::{ICMPv4Header, icmp_checksum, verify_icmp_checksum};
use tcpip::icmpv6::{ICMPv6Header, icmpv6_checksum, verify_icmpv6_checksum};

/// 1の補数和の計算結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SumReport {
    pub(crate) sum: u16,
    pub(crate) checksum: u16,
}

/// チェックサム検証の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct VerifyReport {
    pub(crate) stored: u16,
    pub(crate) computed: u16,
    pub(crate) valid: bool,
}

pub(crate) fn sum(
    buffer: &SegmentedBuffer,
    offset: usize,
    size: Option<usize>,
    initial: u16,
) -> SumReport {
    let size = size.unwrap_or_else(|| buffer.len().saturating_sub(offset));
    debug!(
        "Summing {size} bytes at offset {offset} over {} segments",
        buffer.views().len()
    );
    let sum = checksum_segments(buffer, initial, offset, size);
    SumReport {
        sum,
        checksum: !sum,
    }
}

/// 先頭 `header_size` バイトをヘッダー、残りをペイロードとして分ける
fn split_header(buffer: &SegmentedBuffer, header_size: usize) -> (Vec<u8>, SegmentedBuffer) {
    let header = buffer.to_contiguous(0, header_size).to_vec();
    let mut payload = buffer.clone();
    payload.trim_front(header_size);
    (header, payload)
}

pub(crate) fn icmp(buffer: &SegmentedBuffer) -> Result<VerifyReport> {
    let (header, payload) = split_header(buffer, ICMPv4Header::<&[u8]>::MINIMUM_SIZE);
    let header = ICMPv4Header::try_from_bytes(header).context("Failed to parse ICMP header")?;
    info!(
        "ICMP type {} code {}, {} bytes of data",
        header.message_type(),
        header.code(),
        payload.len()
    );

    Ok(VerifyReport {
        stored: header.checksum(),
        computed: icmp_checksum(&header, &payload),
        valid: verify_icmp_checksum(&header, &payload),
    })
}

pub(crate) fn icmpv6(
    buffer: &SegmentedBuffer,
    src: Ipv6Addr,
    dst: Ipv6Addr,
) -> Result<VerifyReport> {
    let (header, payload) = split_header(buffer, ICMPv6Header::<&[u8]>::MINIMUM_SIZE);
    let header = ICMPv6Header::try_from_bytes(header).context("Failed to parse ICMPv6 header")?;
    info!(
        "ICMPv6 type {} code {} from {src} to {dst}, {} bytes of data",
        header.message_type(),
        header.code(),
        payload.len()
    );

    Ok(VerifyReport {
        stored: header.checksum(),
        computed: icmpv6_checksum(&header, src, dst, &payload),
        valid: verify_icmpv6_checksum(&header, src, dst, &payload),
    })
}
