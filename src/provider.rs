//! Provider trait for chunk sources

use crate::Result;
use crate::types::Stream;

/// One BLE notification as it arrived from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub stream: Stream,
    pub data: Vec<u8>,
}

impl Chunk {
    pub fn new(stream: Stream, data: impl Into<Vec<u8>>) -> Self {
        Self { stream, data: data.into() }
    }

    pub fn live(data: impl Into<Vec<u8>>) -> Self {
        Self::new(Stream::Live, data)
    }
}

/// Source of inbound chunks for a [`Driver`](crate::driver::Driver).
///
/// Providers handle their own pacing: a live provider waits for the host's BLE
/// callbacks, a replay provider sleeps between recorded chunks.
#[async_trait::async_trait]
pub trait Provider: Send + 'static {
    /// Next chunk.
    ///
    /// - `Ok(Some(chunk))`: a chunk is available
    /// - `Ok(None)`: the source ended normally
    /// - `Err(e)`: the source failed; the driver may retry
    async fn next_chunk(&mut self) -> Result<Option<Chunk>>;
}
