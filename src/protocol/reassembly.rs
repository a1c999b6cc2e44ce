//! Chunk reassembly
//!
//! BLE notifications are bounded by the negotiated MTU, so a frame may span several
//! chunks and one chunk may hold the end of one frame and the start of the next. The
//! reassembler buffers bytes per stream until the length field at offset 3 is
//! readable, then until that many bytes are present, and extracts every complete
//! frame the buffer holds.

use tracing::trace;

use super::frame::crc32;
use super::header::peek_total_len;
use super::{FrameFlags, LENGTH_OFFSET, ProtocolVersion};
use crate::SdkError;

/// One unit produced by [`Reassembler::push`].
#[derive(Debug)]
pub enum Extracted {
    /// Complete frame bytes, header included.
    Frame(Vec<u8>),
    /// Same sequence and contents as the previous frame on this stream.
    ///
    /// `ack_requested` is set when the repeat is a V4 frame asking to be acknowledged;
    /// the device resends those until an ACK gets through.
    Duplicate { sequence: u16, ack_requested: bool },
    /// Buffered data was discarded.
    Rejected(SdkError),
}

/// Reassembly state for one stream.
#[derive(Debug, Default)]
pub struct Reassembler {
    buffer: Vec<u8>,
    last_frame: Option<(u16, u32)>,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes buffered towards an incomplete frame.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    /// Drop partial data and duplicate history.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.last_frame = None;
    }

    /// Absorb a chunk and return everything it completed.
    pub fn push(
        &mut self,
        version: ProtocolVersion,
        chunk: &[u8],
        max_frame_len: usize,
    ) -> Vec<Extracted> {
        if version == ProtocolVersion::V1 {
            return vec![Extracted::Frame(chunk.to_vec())];
        }

        self.buffer.extend_from_slice(chunk);
        let mut out = Vec::new();

        while let Some(total) = peek_total_len(&self.buffer) {
            let marker = self.buffer[0];
            if marker != version.marker() {
                self.buffer.clear();
                out.push(Extracted::Rejected(SdkError::VersionMismatch {
                    expected: version.to_string(),
                    found: marker,
                }));
                break;
            }
            if total < version.header_len() || total > max_frame_len {
                self.buffer.clear();
                out.push(Extracted::Rejected(SdkError::malformed_header(format!(
                    "declared length {} outside {}..={}",
                    total,
                    version.header_len(),
                    max_frame_len
                ))));
                break;
            }
            if self.buffer.len() < total {
                trace!(buffered = self.buffer.len(), total, "Waiting for more chunks");
                break;
            }

            let frame: Vec<u8> = self.buffer.drain(..total).collect();
            let sequence = match version {
                ProtocolVersion::V4 => {
                    u16::from_le_bytes([frame[LENGTH_OFFSET + 2], frame[LENGTH_OFFSET + 3]])
                }
                _ => u16::from(frame[2]),
            };
            let fingerprint = (sequence, crc32(&frame));
            if self.last_frame == Some(fingerprint) {
                let ack_requested = version == ProtocolVersion::V4
                    && FrameFlags::from_bits(frame[2]).contains(FrameFlags::ACK_REQUESTED);
                out.push(Extracted::Duplicate { sequence, ack_requested });
                continue;
            }
            self.last_frame = Some(fingerprint);
            out.push(Extracted::Frame(frame));
        }

        out
    }
}
