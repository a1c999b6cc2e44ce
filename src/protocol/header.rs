//! Frame header structures
//!
//! ```text
//! legacy (5 bytes):  [marker][process][seq u8][total_len u16]
//! V4    (11 bytes):  [0x04][process][flags][total_len u16][seq u16][crc32 u32]
//! ```
//!
//! All multi-byte fields are little-endian. `total_len` counts the header.

use serde::{Deserialize, Serialize};

use super::{LEGACY_HEADER_LEN, LENGTH_OFFSET, ProtocolVersion, V4_HEADER_LEN};
use crate::{Result, SdkError};

/// V4 header flag bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameFlags(u8);

impl FrameFlags {
    pub const NONE: FrameFlags = FrameFlags(0);
    /// Payload is LZ4 compressed with a 4-byte size prefix.
    pub const COMPRESSED: FrameFlags = FrameFlags(0x01);
    /// Sender wants an acknowledgement for this frame.
    pub const ACK_REQUESTED: FrameFlags = FrameFlags(0x02);
    /// Frame acknowledges a previously sent frame.
    pub const ACK: FrameFlags = FrameFlags(0x04);

    pub fn from_bits(bits: u8) -> Self {
        FrameFlags(bits)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: FrameFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn with(self, other: FrameFlags) -> Self {
        FrameFlags(self.0 | other.0)
    }
}

/// Header shared by V2, V3 and V3.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyHeader {
    pub marker: u8,
    pub process: u8,
    pub sequence: u8,
    pub total_len: u16,
}

impl LegacyHeader {
    pub const LEN: usize = LEGACY_HEADER_LEN;

    pub fn parse(data: &[u8]) -> Result<Self> {
        require_len(data, Self::LEN, "legacy header")?;
        Ok(Self {
            marker: data[0],
            process: data[1],
            sequence: data[2],
            total_len: parse_u16_le(data, LENGTH_OFFSET)?,
        })
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&[self.marker, self.process, self.sequence]);
        out.extend_from_slice(&self.total_len.to_le_bytes());
    }
}

/// V4 header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct V4Header {
    pub process: u8,
    pub flags: FrameFlags,
    pub total_len: u16,
    pub sequence: u16,
    pub crc32: u32,
}

impl V4Header {
    pub const LEN: usize = V4_HEADER_LEN;

    pub fn parse(data: &[u8]) -> Result<Self> {
        require_len(data, Self::LEN, "V4 header")?;
        let marker = data[0];
        if marker != ProtocolVersion::V4.marker() {
            return Err(SdkError::VersionMismatch {
                expected: ProtocolVersion::V4.to_string(),
                found: marker,
            });
        }
        Ok(Self {
            process: data[1],
            flags: FrameFlags::from_bits(data[2]),
            total_len: parse_u16_le(data, LENGTH_OFFSET)?,
            sequence: parse_u16_le(data, 5)?,
            crc32: parse_u32_le(data, 7)?,
        })
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&[ProtocolVersion::V4.marker(), self.process, self.flags.bits()]);
        out.extend_from_slice(&self.total_len.to_le_bytes());
        out.extend_from_slice(&self.sequence.to_le_bytes());
        out.extend_from_slice(&self.crc32.to_le_bytes());
    }
}

/// Total frame length declared by a buffered frame start, once enough bytes are present.
pub fn peek_total_len(data: &[u8]) -> Option<usize> {
    if data.len() < LENGTH_OFFSET + 2 {
        return None;
    }
    Some(usize::from(u16::from_le_bytes([data[LENGTH_OFFSET], data[LENGTH_OFFSET + 1]])))
}

fn require_len(data: &[u8], len: usize, what: &str) -> Result<()> {
    if data.len() < len {
        return Err(SdkError::malformed_header(format!(
            "{} needs {} bytes, have {}",
            what,
            len,
            data.len()
        )));
    }
    Ok(())
}

/// Safe byte parsing helpers with bounds checking
fn parse_u16_le(data: &[u8], offset: usize) -> Result<u16> {
    if offset + 2 > data.len() {
        return Err(SdkError::malformed_header(format!(
            "Insufficient data for u16 at offset {} (need 2 bytes, have {})",
            offset,
            data.len().saturating_sub(offset)
        )));
    }
    Ok(u16::from_le_bytes([data[offset], data[offset + 1]]))
}

fn parse_u32_le(data: &[u8], offset: usize) -> Result<u32> {
    if offset + 4 > data.len() {
        return Err(SdkError::malformed_header(format!(
            "Insufficient data for u32 at offset {} (need 4 bytes, have {})",
            offset,
            data.len().saturating_sub(offset)
        )));
    }
    Ok(u32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]]))
}
