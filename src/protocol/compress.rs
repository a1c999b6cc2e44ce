//! LZ4 payload compression for V4 frames

use crate::{Result, SdkError};

/// Upper bound accepted from a compressed payload's size prefix.
pub const MAX_DECOMPRESSED_LEN: usize = 1 << 20;

/// Compress with a 4-byte little-endian uncompressed-size prefix.
pub fn compress(data: &[u8]) -> Vec<u8> {
    lz4_flex::compress_prepend_size(data)
}

/// Compress `data` only when the result is strictly smaller.
pub fn compress_if_smaller(data: &[u8]) -> Option<Vec<u8>> {
    let compressed = compress(data);
    (compressed.len() < data.len()).then_some(compressed)
}

/// Decompress data produced by [`compress`].
///
/// The size prefix is checked against [`MAX_DECOMPRESSED_LEN`] before anything is
/// allocated.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < 4 {
        return Err(SdkError::Decompression {
            details: format!("payload of {} bytes has no size prefix", data.len()),
        });
    }
    let declared = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if declared > MAX_DECOMPRESSED_LEN {
        return Err(SdkError::Decompression {
            details: format!("declared size {declared} exceeds {MAX_DECOMPRESSED_LEN}"),
        });
    }
    lz4_flex::decompress_size_prepended(data)
        .map_err(|e| SdkError::Decompression { details: e.to_string() })
}
