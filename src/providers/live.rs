//! Live provider fed from the host's BLE notification callbacks

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::provider::{Chunk, Provider};
use crate::types::Stream;
use crate::{Result, SdkError};

/// Cloneable handle the host's BLE callbacks push chunks through.
#[derive(Debug, Clone)]
pub struct ChunkSender {
    tx: mpsc::Sender<Chunk>,
}

impl ChunkSender {
    /// Queue a chunk, waiting while the provider is backed up.
    pub async fn send(&self, stream: Stream, data: impl Into<Vec<u8>>) -> Result<()> {
        self.tx
            .send(Chunk::new(stream, data))
            .await
            .map_err(|_| SdkError::invalid_state("live provider dropped"))
    }

    /// Queue a chunk from a synchronous callback. Fails when the queue is full.
    pub fn try_send(&self, stream: Stream, data: impl Into<Vec<u8>>) -> Result<()> {
        self.tx.try_send(Chunk::new(stream, data)).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => {
                SdkError::invalid_state("live provider queue is full")
            }
            mpsc::error::TrySendError::Closed(_) => {
                SdkError::invalid_state("live provider dropped")
            }
        })
    }
}

/// Provider that yields chunks as the host delivers them. Ends when every
/// [`ChunkSender`] is dropped.
#[derive(Debug)]
pub struct LiveProvider {
    rx: mpsc::Receiver<Chunk>,
    received: u64,
}

impl LiveProvider {
    /// Provider and its sender, buffering up to `capacity` chunks.
    pub fn channel(capacity: usize) -> (ChunkSender, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (ChunkSender { tx }, Self { rx, received: 0 })
    }
}

#[async_trait::async_trait]
impl Provider for LiveProvider {
    async fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        match self.rx.recv().await {
            Some(chunk) => {
                self.received += 1;
                trace!(
                    received = self.received,
                    stream = %chunk.stream,
                    len = chunk.data.len(),
                    "Live chunk"
                );
                Ok(Some(chunk))
            }
            None => {
                debug!(received = self.received, "All chunk senders dropped");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn chunks_arrive_in_order_until_senders_drop() {
        let (sender, mut provider) = LiveProvider::channel(4);
        sender.send(Stream::Live, vec![1]).await.unwrap();
        sender.try_send(Stream::Sync, vec![2]).unwrap();
        drop(sender);

        assert_eq!(provider.next_chunk().await.unwrap(), Some(Chunk::live(vec![1])));
        assert_eq!(provider.next_chunk().await.unwrap(), Some(Chunk::new(Stream::Sync, vec![2])));
        assert_eq!(provider.next_chunk().await.unwrap(), None);
    }

    #[test]
    fn full_queue_is_reported() {
        let (sender, _provider) = LiveProvider::channel(1);
        sender.try_send(Stream::Live, vec![1]).unwrap();
        assert!(matches!(
            sender.try_send(Stream::Live, vec![2]),
            Err(SdkError::InvalidState { .. })
        ));
    }
}
