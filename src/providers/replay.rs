//! Replay provider for capture files

use std::path::Path;

use tokio::time::{Duration, sleep};
use tracing::{debug, info, trace};

use crate::Result;
use crate::capture::CaptureReader;
use crate::provider::{Chunk, Provider};
use crate::session::Session;

/// Slowest and fastest accepted playback speed.
pub const SPEED_RANGE: (f64, f64) = (0.1, 10.0);

/// Plays a capture back, sleeping for each record's delay scaled by the playback speed.
#[derive(Debug)]
pub struct ReplayProvider {
    reader: CaptureReader,
    /// Playback speed multiplier (1.0 = as recorded, 2.0 = twice as fast)
    speed: f64,
    paced: bool,
}

impl ReplayProvider {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_reader(CaptureReader::open(path)?))
    }

    pub fn from_reader(reader: CaptureReader) -> Self {
        info!(
            hardware = %reader.header().hardware,
            firmware = %reader.header().firmware,
            "Replay provider ready"
        );
        Self { reader, speed: 1.0, paced: true }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.clamp(SPEED_RANGE.0, SPEED_RANGE.1);
        debug!("Playback speed set to {}x", self.speed);
    }

    /// Skip the recorded delays and return chunks as fast as they are requested.
    pub fn unpaced(mut self) -> Self {
        self.paced = false;
        self
    }

    /// Apply the recorded revisions to `session`.
    pub fn configure(&self, session: &mut Session) -> Result<()> {
        let header = self.reader.header();
        session.set_hardware_revision(header.hardware.as_bytes())?;
        session.set_firmware_revision(header.firmware.as_bytes())
    }

    pub fn rewind(&mut self) {
        self.reader.rewind();
    }

    fn scaled_delay(&self, delay_ms: u32) -> Duration {
        Duration::from_secs_f64(f64::from(delay_ms) / 1000.0 / self.speed)
    }
}

#[async_trait::async_trait]
impl Provider for ReplayProvider {
    async fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        let Some(record) = self.reader.next_record()? else {
            debug!(records = self.reader.records_read(), "Reached end of replay");
            return Ok(None);
        };

        if self.paced && record.delay_ms > 0 {
            sleep(self.scaled_delay(record.delay_ms)).await;
        }

        trace!(
            record = self.reader.records_read(),
            stream = %record.stream,
            len = record.data.len(),
            "Replayed chunk"
        );
        Ok(Some(Chunk { stream: record.stream, data: record.data }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureWriter;
    use crate::types::Stream;

    fn provider() -> ReplayProvider {
        let mut writer = CaptureWriter::new("Aidlab", "4.0.0");
        writer.push(Stream::Live, 0, &[1]).unwrap();
        writer.push(Stream::Sync, 1_000, &[2]).unwrap();
        let bytes = writer.into_bytes().unwrap();
        ReplayProvider::from_reader(CaptureReader::from_bytes(bytes).unwrap())
    }

    #[test]
    fn speed_is_clamped() {
        let mut provider = provider();
        provider.set_speed(100.0);
        assert_eq!(provider.speed(), 10.0);
        provider.set_speed(0.0);
        assert_eq!(provider.speed(), 0.1);
        provider.set_speed(2.0);
        assert_eq!(provider.scaled_delay(1_000), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn chunks_are_paced_by_recorded_delay() {
        let mut provider = provider();
        let start = tokio::time::Instant::now();

        assert_eq!(provider.next_chunk().await.unwrap(), Some(Chunk::live(vec![1])));
        assert_eq!(start.elapsed(), Duration::ZERO);

        let second = provider.next_chunk().await.unwrap().unwrap();
        assert_eq!(second, Chunk::new(Stream::Sync, vec![2]));
        assert!(start.elapsed() >= Duration::from_secs(1));
        assert!(provider.next_chunk().await.unwrap().is_none());
    }

    #[test]
    fn configure_sets_revisions() {
        let provider = provider();
        let mut session = Session::new();
        provider.configure(&mut session).unwrap();
        assert_eq!(session.firmware_revision().map(|f| f.to_string()), Some("4.0.0".into()));
        assert!(session.hardware_revision().is_some());
    }
}
