//! Capture writer

use std::path::Path;

use tracing::debug;

use super::format::{CaptureHeader, CaptureRecord};
use crate::types::Stream;
use crate::{Result, SdkError};

/// Accumulates a capture in memory.
#[derive(Debug, Clone)]
pub struct CaptureWriter {
    header: CaptureHeader,
    records: Vec<u8>,
    count: usize,
}

impl CaptureWriter {
    pub fn new(hardware: impl Into<String>, firmware: impl Into<String>) -> Self {
        Self {
            header: CaptureHeader { hardware: hardware.into(), firmware: firmware.into() },
            records: Vec::new(),
            count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Append a chunk received `delay_ms` after the previous one.
    pub fn push(&mut self, stream: Stream, delay_ms: u32, data: &[u8]) -> Result<()> {
        CaptureRecord { stream, delay_ms, data: data.to_vec() }.write_to(&mut self.records)?;
        self.count += 1;
        Ok(())
    }

    /// Header and records as one buffer.
    ///
    /// Revisions longer than 255 bytes cannot be stored; they are cut at the last
    /// character boundary that fits.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        let header = CaptureHeader {
            hardware: clip(&self.header.hardware).to_owned(),
            firmware: clip(&self.header.firmware).to_owned(),
        };
        let mut out = Vec::with_capacity(4 + 3 + 255 * 2 + self.records.len());
        header.write_to(&mut out)?;
        out.extend_from_slice(&self.records);
        Ok(out)
    }

    pub fn write_to_file<P: AsRef<Path>>(self, path: P) -> Result<()> {
        let path = path.as_ref();
        let count = self.count;
        std::fs::write(path, self.into_bytes()?)
            .map_err(|e| SdkError::file_error(path.to_path_buf(), e))?;
        debug!(path = %path.display(), records = count, "Wrote capture");
        Ok(())
    }
}

fn clip(value: &str) -> &str {
    let mut end = value.len().min(usize::from(u8::MAX));
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}
