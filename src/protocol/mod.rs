//! Wire protocol: version detection, framing, integrity and reassembly.
//!
//! ## Protocol Generations
//!
//! | Version | Firmware        | Framing                                   |
//! |---------|-----------------|-------------------------------------------|
//! | V1      | `< 3.0.0`       | none, one chunk is one package            |
//! | V2      | `3.0 ..< 3.6`   | 5-byte legacy header, marker `0x02`       |
//! | V3      | `3.6 ..< 3.7`   | 5-byte legacy header, marker `0x03`       |
//! | V3.1    | `3.7 ..< 4.0`   | 5-byte legacy header, marker `0x31`       |
//! | V4      | `>= 4.0`        | 11-byte header with flags, sequence, CRC32 |
//!
//! Every framed format stores the total frame length (header included) as a
//! little-endian `u16` at offset 3, which is what the [`Reassembler`] keys on.

mod compress;
mod detector;
mod frame;
mod header;
mod reassembly;

pub use compress::{MAX_DECOMPRESSED_LEN, compress, compress_if_smaller, decompress};
pub use detector::{Detection, ProtocolDetector};
pub use frame::{Frame, decode_frame, encode_frame};
pub use header::{FrameFlags, LegacyHeader, V4Header, peek_total_len};
pub use reassembly::{Extracted, Reassembler};

use serde::{Deserialize, Serialize};

use crate::types::FirmwareVersion;

/// Length of the V2/V3/V3.1 header.
pub const LEGACY_HEADER_LEN: usize = 5;
/// Length of the V4 header.
pub const V4_HEADER_LEN: usize = 11;
/// Offset of the little-endian total-length field in every framed format.
pub const LENGTH_OFFSET: usize = 3;
/// Marker used when framing outbound V1 payloads.
pub const V1_OUTBOUND_MARKER: u8 = 0x01;

/// Protocol generation spoken by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProtocolVersion {
    V1,
    V2,
    V3,
    V3_1,
    V4,
}

impl ProtocolVersion {
    /// Version byte that opens every frame of this generation.
    pub fn marker(self) -> u8 {
        match self {
            ProtocolVersion::V1 => V1_OUTBOUND_MARKER,
            ProtocolVersion::V2 => 0x02,
            ProtocolVersion::V3 => 0x03,
            ProtocolVersion::V3_1 => 0x31,
            ProtocolVersion::V4 => 0x04,
        }
    }

    /// Classify an inbound version marker. V1 has no marker and is never returned.
    pub fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            0x02 => Some(ProtocolVersion::V2),
            0x03 => Some(ProtocolVersion::V3),
            0x31 => Some(ProtocolVersion::V3_1),
            0x04 => Some(ProtocolVersion::V4),
            _ => None,
        }
    }

    /// Generation a device with this firmware is expected to speak.
    pub fn for_firmware(firmware: FirmwareVersion) -> Self {
        if firmware < FirmwareVersion::new(3, 0, 0) {
            ProtocolVersion::V1
        } else if firmware < FirmwareVersion::new(3, 6, 0) {
            ProtocolVersion::V2
        } else if firmware < FirmwareVersion::new(3, 7, 0) {
            ProtocolVersion::V3
        } else if firmware < FirmwareVersion::new(4, 0, 0) {
            ProtocolVersion::V3_1
        } else {
            ProtocolVersion::V4
        }
    }

    /// Header length for inbound frames. V1 frames are unframed.
    pub fn header_len(self) -> usize {
        match self {
            ProtocolVersion::V1 => 0,
            ProtocolVersion::V2 | ProtocolVersion::V3 | ProtocolVersion::V3_1 => LEGACY_HEADER_LEN,
            ProtocolVersion::V4 => V4_HEADER_LEN,
        }
    }

    /// Whether `Transport::ready` follows every outbound frame immediately.
    pub fn is_legacy(self) -> bool {
        self != ProtocolVersion::V4
    }

    /// Record timestamps are `u32` seconds before V3 and `u64` milliseconds from V3 on.
    pub fn timestamp_len(self) -> usize {
        match self {
            ProtocolVersion::V1 => 0,
            ProtocolVersion::V2 => 4,
            ProtocolVersion::V3 | ProtocolVersion::V3_1 | ProtocolVersion::V4 => 8,
        }
    }

    /// Pressure bodies carry an array instead of a single sample.
    pub fn has_pressure_array(self) -> bool {
        matches!(self, ProtocolVersion::V3_1 | ProtocolVersion::V4)
    }
}

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProtocolVersion::V1 => "V1",
            ProtocolVersion::V2 => "V2",
            ProtocolVersion::V3 => "V3",
            ProtocolVersion::V3_1 => "V3.1",
            ProtocolVersion::V4 => "V4",
        };
        f.write_str(name)
    }
}
