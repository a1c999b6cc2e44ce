//! Sequential capture reader

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::format::{CaptureHeader, CaptureRecord};
use crate::{Result, SdkError};

/// Reads records from an in-memory capture.
///
/// ```rust
/// use aidlab_sdk::capture::{CaptureReader, CaptureWriter};
/// use aidlab_sdk::types::Stream;
///
/// let mut writer = CaptureWriter::new("Aidlab", "4.0.0");
/// writer.push(Stream::Live, 0, &[0x04, 0x17]).unwrap();
/// let mut reader = CaptureReader::from_bytes(writer.into_bytes().unwrap()).unwrap();
/// assert_eq!(reader.header().firmware, "4.0.0");
/// assert_eq!(reader.next_record().unwrap().unwrap().data, vec![0x04, 0x17]);
/// assert!(reader.next_record().unwrap().is_none());
/// ```
#[derive(Debug)]
pub struct CaptureReader {
    data: Vec<u8>,
    header: CaptureHeader,
    first_record: usize,
    offset: usize,
    records_read: usize,
    path: Option<PathBuf>,
}

impl CaptureReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| SdkError::file_error(path.to_path_buf(), e))?;
        let mut reader = Self::from_bytes(data)?;
        info!(
            path = %path.display(),
            hardware = %reader.header.hardware,
            firmware = %reader.header.firmware,
            "Opened capture"
        );
        reader.path = Some(path.to_path_buf());
        Ok(reader)
    }

    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Result<Self> {
        let data = data.into();
        let (header, first_record) = CaptureHeader::parse(&data)?;
        Ok(Self { data, header, first_record, offset: first_record, records_read: 0, path: None })
    }

    pub fn header(&self) -> &CaptureHeader {
        &self.header
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Records returned so far.
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    pub fn is_finished(&self) -> bool {
        self.offset >= self.data.len()
    }

    /// Start over from the first record.
    pub fn rewind(&mut self) {
        debug!(records_read = self.records_read, "Rewinding capture");
        self.offset = self.first_record;
        self.records_read = 0;
    }

    pub fn next_record(&mut self) -> Result<Option<CaptureRecord>> {
        if self.is_finished() {
            return Ok(None);
        }
        let (record, next) = CaptureRecord::parse_at(&self.data, self.offset)?;
        self.offset = next;
        self.records_read += 1;
        Ok(Some(record))
    }
}
