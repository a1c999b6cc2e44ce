//! Capture file structures and parsing
//!
//! ## Layout
//!
//! All multi-byte fields are little-endian.
//!
//! 1. **Header**: magic `ACAP`, format version `u8` (currently 1), then the hardware
//!    and firmware revision strings, each as `[len u8][utf-8 bytes]`
//! 2. **Records** until end of file: `[stream u8][delay_ms u32][len u16][bytes]`,
//!    where `stream` is 0 for live and 1 for sync, and `delay_ms` is the time since
//!    the previous record was received

use tracing::trace;

use crate::types::Stream;
use crate::{Result, SdkError};

pub const CAPTURE_MAGIC: [u8; 4] = *b"ACAP";
pub const CAPTURE_VERSION: u8 = 1;
/// Bytes before the payload of every record.
pub const RECORD_HEADER_LEN: usize = 7;

/// Revisions of the device the capture was taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureHeader {
    pub hardware: String,
    pub firmware: String,
}

impl CaptureHeader {
    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&CAPTURE_MAGIC);
        out.push(CAPTURE_VERSION);
        write_short_str(out, "hardware", &self.hardware)?;
        write_short_str(out, "firmware", &self.firmware)
    }

    /// Parse the header, returning it and the offset of the first record.
    pub fn parse(data: &[u8]) -> Result<(Self, usize)> {
        if data.len() < 5 {
            return Err(SdkError::capture(
                "header",
                format!("need at least 5 bytes, file has {}", data.len()),
            ));
        }
        if data[..4] != CAPTURE_MAGIC {
            return Err(SdkError::capture("header", format!("bad magic {:02x?}", &data[..4])));
        }
        if data[4] != CAPTURE_VERSION {
            return Err(SdkError::capture("header", format!("unsupported version {}", data[4])));
        }

        let (hardware, offset) = read_short_str(data, 5, "hardware")?;
        let (firmware, offset) = read_short_str(data, offset, "firmware")?;
        trace!(%hardware, %firmware, records_at = offset, "Parsed capture header");
        Ok((Self { hardware, firmware }, offset))
    }
}

/// One recorded chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRecord {
    pub stream: Stream,
    pub delay_ms: u32,
    pub data: Vec<u8>,
}

impl CaptureRecord {
    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        let len = u16::try_from(self.data.len()).map_err(|_| SdkError::PayloadTooLarge {
            len: self.data.len(),
            max: usize::from(u16::MAX),
        })?;
        out.push(self.stream.to_byte());
        out.extend_from_slice(&self.delay_ms.to_le_bytes());
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(&self.data);
        Ok(())
    }

    /// Parse the record at `offset`, returning it and the offset after it.
    pub fn parse_at(data: &[u8], offset: usize) -> Result<(Self, usize)> {
        let header = data.get(offset..offset + RECORD_HEADER_LEN).ok_or_else(|| {
            SdkError::capture(
                "record",
                format!("truncated record header at offset {offset}"),
            )
        })?;
        let stream = Stream::from_byte(header[0]).ok_or_else(|| {
            SdkError::capture("record", format!("unknown stream {} at offset {offset}", header[0]))
        })?;
        let delay_ms = u32::from_le_bytes([header[1], header[2], header[3], header[4]]);
        let len = usize::from(u16::from_le_bytes([header[5], header[6]]));

        let start = offset + RECORD_HEADER_LEN;
        let bytes = data.get(start..start + len).ok_or_else(|| {
            SdkError::capture(
                "record",
                format!("record at offset {offset} declares {len} bytes past end of file"),
            )
        })?;
        Ok((Self { stream, delay_ms, data: bytes.to_vec() }, start + len))
    }
}

fn write_short_str(out: &mut Vec<u8>, field: &str, value: &str) -> Result<()> {
    let len = u8::try_from(value.len()).map_err(|_| {
        SdkError::capture("header", format!("{field} revision longer than 255 bytes"))
    })?;
    out.push(len);
    out.extend_from_slice(value.as_bytes());
    Ok(())
}

fn read_short_str(data: &[u8], offset: usize, field: &str) -> Result<(String, usize)> {
    let truncated = || SdkError::capture("header", format!("truncated {field} revision"));
    let len = usize::from(*data.get(offset).ok_or_else(truncated)?);
    let bytes = data.get(offset + 1..offset + 1 + len).ok_or_else(truncated)?;
    let value = std::str::from_utf8(bytes)
        .map_err(|e| SdkError::capture("header", format!("{field} revision is not utf-8: {e}")))?;
    Ok((value.to_owned(), offset + 1 + len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {
        let header = CaptureHeader { hardware: "Aidlab".into(), firmware: "4.1.0".into() };
        let mut out = Vec::new();
        header.write_to(&mut out).unwrap();
        assert_eq!(&out[..5], b"ACAP\x01");
        assert_eq!(out[5], 6);
        let (parsed, offset) = CaptureHeader::parse(&out).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(offset, out.len());
    }

    #[test]
    fn bad_magic_and_version_are_rejected() {
        assert!(matches!(
            CaptureHeader::parse(b"ACAQ\x01\x00\x00"),
            Err(SdkError::Capture { .. })
        ));
        assert!(matches!(
            CaptureHeader::parse(b"ACAP\x02\x00\x00"),
            Err(SdkError::Capture { .. })
        ));
        assert!(CaptureHeader::parse(b"ACAP\x01\x05Aid").is_err());
    }

    #[test]
    fn record_layout() {
        let record = CaptureRecord { stream: Stream::Sync, delay_ms: 0x0102, data: vec![9, 8] };
        let mut out = Vec::new();
        record.write_to(&mut out).unwrap();
        assert_eq!(out, vec![1, 0x02, 0x01, 0, 0, 2, 0, 9, 8]);
        let (parsed, next) = CaptureRecord::parse_at(&out, 0).unwrap();
        assert_eq!(parsed, record);
        assert_eq!(next, out.len());
    }

    #[test]
    fn truncated_records_are_rejected() {
        assert!(CaptureRecord::parse_at(&[0, 0, 0, 0, 0, 5, 0, 1], 0).is_err());
        assert!(CaptureRecord::parse_at(&[0, 0, 0], 0).is_err());
        assert!(CaptureRecord::parse_at(&[7, 0, 0, 0, 0, 0, 0], 0).is_err());
    }
}
