//! Driver feeds a session from a provider on a tokio task

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::provider::Provider;
use crate::session::Session;
use crate::{Result, SdkError};

/// Consecutive provider errors tolerated before the driver gives up.
pub const MAX_PROVIDER_ERRORS: u32 = 10;

/// Handle to a running driver task.
#[derive(Debug)]
pub struct DriverHandle {
    /// Cancels the task; the session is returned from [`DriverHandle::join`].
    pub cancel: CancellationToken,
    task: JoinHandle<Session>,
}

impl DriverHandle {
    /// Wait for the task to finish and take the session back.
    pub async fn join(self) -> Result<Session> {
        self.task.await.map_err(|e| SdkError::invalid_state(format!("driver task failed: {e}")))
    }

    /// Cancel the task and take the session back.
    pub async fn shutdown(self) -> Result<Session> {
        self.cancel.cancel();
        self.join().await
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawns the task that moves chunks from a [`Provider`] into a [`Session`].
///
/// The session is owned by the task while it runs, so all session calls stay on one
/// task; delegates and transports registered beforehand keep receiving callbacks.
pub struct Driver;

impl Driver {
    pub fn spawn<P>(session: Session, provider: P) -> DriverHandle
    where
        P: Provider,
    {
        let cancel = CancellationToken::new();
        let cancel_task = cancel.clone();
        let task = tokio::spawn(Self::feed_task(session, provider, cancel_task));
        DriverHandle { cancel, task }
    }

    async fn feed_task<P>(
        mut session: Session,
        mut provider: P,
        cancel: CancellationToken,
    ) -> Session
    where
        P: Provider,
    {
        info!(session = %session.id(), "Driver task started");
        let mut chunk_count = 0u64;
        let mut error_count = 0u32;

        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Driver cancelled");
                    break;
                }
                result = provider.next_chunk() => result,
            };

            match result {
                Ok(Some(chunk)) => {
                    chunk_count += 1;
                    error_count = 0;
                    trace!(
                        chunk = chunk_count,
                        stream = %chunk.stream,
                        len = chunk.data.len(),
                        "Feeding chunk"
                    );
                    if let Err(e) = session.process_chunk(chunk.stream, &chunk.data) {
                        error!("Session refused chunk {}: {}", chunk_count, e);
                        break;
                    }
                }
                Ok(None) => {
                    info!("Provider ended after {} chunks", chunk_count);
                    break;
                }
                Err(e) => {
                    error_count += 1;
                    warn!("Provider error ({}/{}): {}", error_count, MAX_PROVIDER_ERRORS, e);

                    if error_count >= MAX_PROVIDER_ERRORS {
                        error!("Too many provider errors, shutting down");
                        break;
                    }

                    // 50ms, 100ms, 200ms, ... capped at 1.6s
                    let backoff = Duration::from_millis(50 * (1 << error_count.min(5)));
                    debug!(?backoff, "Backing off");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
            }
        }

        info!("Driver task ended (processed {} chunks)", chunk_count);
        session
    }
}
