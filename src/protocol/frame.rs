//! Frame decoding and encoding per protocol version

use crc32fast::Hasher;
use tracing::trace;

use super::compress;
use super::header::{FrameFlags, LegacyHeader, V4Header};
use super::{LEGACY_HEADER_LEN, ProtocolVersion, V4_HEADER_LEN};
use crate::config::MAX_WIRE_FRAME_LEN;
use crate::records::Process;
use crate::{Result, SdkError};

/// A reassembled, header-stripped protocol unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub version: ProtocolVersion,
    pub process: u8,
    /// Sequence number. Legacy frames carry 8 bits, V4 frames 16.
    pub sequence: u16,
    /// Payload after decompression.
    pub payload: Vec<u8>,
    pub compressed: bool,
    /// `Some(true)` for V4 frames whose CRC verified, `None` where the format has no CRC.
    pub crc_valid: Option<bool>,
    pub flags: FrameFlags,
}

impl Frame {
    /// Transport acknowledgement rather than device data.
    pub fn is_ack(&self) -> bool {
        self.flags.contains(FrameFlags::ACK)
    }

    pub fn wants_ack(&self) -> bool {
        self.flags.contains(FrameFlags::ACK_REQUESTED)
    }
}

/// Decode one complete frame.
///
/// V1 packages have no header; they are ECG data and decode to an [`Process::Ecg`]
/// frame carrying the whole chunk.
pub fn decode_frame(version: ProtocolVersion, bytes: &[u8]) -> Result<Frame> {
    match version {
        ProtocolVersion::V1 => Ok(Frame {
            version,
            process: Process::Ecg.id(),
            sequence: 0,
            payload: bytes.to_vec(),
            compressed: false,
            crc_valid: None,
            flags: FrameFlags::NONE,
        }),
        ProtocolVersion::V2 | ProtocolVersion::V3 | ProtocolVersion::V3_1 => {
            let header = LegacyHeader::parse(bytes)?;
            if header.marker != version.marker() {
                return Err(SdkError::VersionMismatch {
                    expected: version.to_string(),
                    found: header.marker,
                });
            }
            check_total_len(usize::from(header.total_len), bytes.len(), LEGACY_HEADER_LEN)?;
            Ok(Frame {
                version,
                process: header.process,
                sequence: u16::from(header.sequence),
                payload: bytes[LEGACY_HEADER_LEN..].to_vec(),
                compressed: false,
                crc_valid: None,
                flags: FrameFlags::NONE,
            })
        }
        ProtocolVersion::V4 => {
            let header = V4Header::parse(bytes)?;
            check_total_len(usize::from(header.total_len), bytes.len(), V4_HEADER_LEN)?;

            let wire_payload = &bytes[V4_HEADER_LEN..];
            let actual = crc32(wire_payload);
            if actual != header.crc32 {
                return Err(SdkError::CrcMismatch { expected: header.crc32, actual });
            }

            let compressed = header.flags.contains(FrameFlags::COMPRESSED);
            let payload =
                if compressed { compress::decompress(wire_payload)? } else { wire_payload.to_vec() };

            trace!(
                process = header.process,
                sequence = header.sequence,
                compressed,
                payload_len = payload.len(),
                "Decoded V4 frame"
            );

            Ok(Frame {
                version,
                process: header.process,
                sequence: header.sequence,
                payload,
                compressed,
                crc_valid: Some(true),
                flags: header.flags,
            })
        }
    }
}

/// Frame an outbound payload.
///
/// `payload` is written as given; compression is the caller's decision and is
/// signalled through `flags`. V1 devices accept the legacy header with marker `0x01`.
pub fn encode_frame(
    version: ProtocolVersion,
    process: u8,
    sequence: u16,
    flags: FrameFlags,
    payload: &[u8],
    max_frame_len: usize,
) -> Result<Vec<u8>> {
    let header_len = match version {
        ProtocolVersion::V4 => V4_HEADER_LEN,
        _ => LEGACY_HEADER_LEN,
    };
    let total = header_len + payload.len();
    let limit = max_frame_len.min(MAX_WIRE_FRAME_LEN);
    if total > limit {
        return Err(SdkError::PayloadTooLarge { len: total, max: limit });
    }
    // Bounded by MAX_WIRE_FRAME_LEN above.
    let total_len = total as u16;

    let mut out = Vec::with_capacity(total);
    match version {
        ProtocolVersion::V4 => {
            V4Header { process, flags, total_len, sequence, crc32: crc32(payload) }
                .write_to(&mut out);
        }
        _ => {
            LegacyHeader { marker: version.marker(), process, sequence: sequence as u8, total_len }
                .write_to(&mut out);
        }
    }
    out.extend_from_slice(payload);
    Ok(out)
}

pub(crate) fn crc32(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

fn check_total_len(declared: usize, actual: usize, header_len: usize) -> Result<()> {
    if declared < header_len || declared != actual {
        return Err(SdkError::malformed_header(format!(
            "declared length {declared} does not match frame of {actual} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn legacy_round_trip() {
        let payload = [1u8, 2, 3, 4];
        let bytes =
            encode_frame(ProtocolVersion::V3, 0x19, 9, FrameFlags::NONE, &payload, 8192).unwrap();
        assert_eq!(bytes.len(), 9);
        assert_eq!(&bytes[..5], &[0x03, 0x19, 9, 9, 0]);

        let frame = decode_frame(ProtocolVersion::V3, &bytes).unwrap();
        assert_eq!(frame.process, 0x19);
        assert_eq!(frame.sequence, 9);
        assert_eq!(frame.payload, payload);
        assert_eq!(frame.crc_valid, None);
    }

    #[test]
    fn legacy_frame_with_wrong_marker_is_rejected() {
        let bytes =
            encode_frame(ProtocolVersion::V2, 0x10, 0, FrameFlags::NONE, &[0; 4], 8192).unwrap();
        assert!(matches!(
            decode_frame(ProtocolVersion::V3_1, &bytes),
            Err(SdkError::VersionMismatch { found: 0x02, .. })
        ));
    }

    #[test]
    fn v4_compressed_frame_decodes_to_original() {
        let original = vec![0x5Au8; 300];
        let wire = compress::compress(&original);
        let bytes =
            encode_frame(ProtocolVersion::V4, 0x10, 513, FrameFlags::COMPRESSED, &wire, 8192)
                .unwrap();
        let frame = decode_frame(ProtocolVersion::V4, &bytes).unwrap();
        assert!(frame.compressed);
        assert_eq!(frame.sequence, 513);
        assert_eq!(frame.crc_valid, Some(true));
        assert_eq!(frame.payload, original);
    }

    #[test]
    fn v4_bad_compressed_payload_is_a_decompression_error() {
        let bytes = encode_frame(
            ProtocolVersion::V4,
            0x10,
            1,
            FrameFlags::COMPRESSED,
            &[0x10, 0, 0, 0, 0xFF, 0xFF],
            8192,
        )
        .unwrap();
        assert!(matches!(
            decode_frame(ProtocolVersion::V4, &bytes),
            Err(SdkError::Decompression { .. })
        ));
    }

    #[test]
    fn v1_chunk_is_an_ecg_package() {
        let frame = decode_frame(ProtocolVersion::V1, &[1, 2, 3]).unwrap();
        assert_eq!(frame.process, Process::Ecg.id());
        assert_eq!(frame.payload, vec![1, 2, 3]);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let payload = vec![0u8; 100];
        assert!(matches!(
            encode_frame(ProtocolVersion::V4, 0x50, 0, FrameFlags::NONE, &payload, 64),
            Err(SdkError::PayloadTooLarge { len: 111, max: 64 })
        ));
    }

    proptest! {
        #[test]
        fn prop_crc_rejects_single_bit_flips(
            payload in prop::collection::vec(any::<u8>(), 1..256),
            bit in any::<prop::sample::Index>(),
            sequence in any::<u16>()
        ) {
            let bytes = encode_frame(
                ProtocolVersion::V4, 0x10, sequence, FrameFlags::NONE, &payload, 8192,
            ).unwrap();
            prop_assert!(decode_frame(ProtocolVersion::V4, &bytes).is_ok());

            let mut corrupted = bytes.clone();
            let bit = bit.index(payload.len() * 8);
            corrupted[V4_HEADER_LEN + bit / 8] ^= 1 << (bit % 8);
            let is_crc_mismatch = matches!(
                decode_frame(ProtocolVersion::V4, &corrupted),
                Err(SdkError::CrcMismatch { .. })
            );
            prop_assert!(is_crc_mismatch);
        }
    }
}
