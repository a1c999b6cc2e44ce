//! Delivered records as an async stream
//!
//! [`RecordChannel`] is a [`Delegate`] that forwards every record into an unbounded
//! channel, so the session never blocks on a slow consumer. The receiving side is a
//! [`futures::Stream`] of [`RecordEvent`]s:
//!
//! ```rust,no_run
//! use aidlab_sdk::stream::{RecordChannel, SampleExt};
//! use futures::StreamExt;
//! use std::time::Duration;
//!
//! # async fn run(mut session: aidlab_sdk::Session) {
//! let (channel, records) = RecordChannel::channel();
//! session.register(channel);
//! let mut sampled = records.sample_every(Duration::from_millis(250));
//! while let Some(event) = sampled.next().await {
//!     println!("{} {:?}", event.stream, event.record);
//! }
//! # }
//! ```

mod sample;

pub use sample::{SampleEvery, SampleExt};

use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::trace;

use crate::dispatch::{Capabilities, Delegate};
use crate::types::{Record, SessionId, Stream};

/// One record as delivered by a session.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordEvent {
    pub session: SessionId,
    pub stream: Stream,
    pub record: Record,
}

/// Receiving side of a [`RecordChannel`].
pub type RecordStream = UnboundedReceiverStream<RecordEvent>;

/// Delegate that forwards records into a channel.
#[derive(Debug, Clone)]
pub struct RecordChannel {
    tx: mpsc::UnboundedSender<RecordEvent>,
    capabilities: Capabilities,
}

impl RecordChannel {
    /// Channel accepting every record.
    pub fn channel() -> (Self, RecordStream) {
        Self::channel_with_capabilities(Capabilities::all())
    }

    pub fn channel_with_capabilities(capabilities: Capabilities) -> (Self, RecordStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, capabilities }, UnboundedReceiverStream::new(rx))
    }
}

impl Delegate for RecordChannel {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn on_record(&mut self, session: SessionId, stream: Stream, record: &Record) {
        let event = RecordEvent { session, stream, record: record.clone() };
        if self.tx.send(event).is_err() {
            trace!(%session, "Record stream dropped, discarding record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ProtocolVersion;
    use crate::test_utils::{framed, session_for};
    use crate::types::RecordKind;
    use futures::StreamExt;

    #[tokio::test]
    async fn session_records_reach_the_stream() {
        let (mut session, _clock) = session_for("4.0.0");
        let (channel, records) = RecordChannel::channel();
        session.register(channel);

        session.process_ble_chunk(&framed(ProtocolVersion::V4, 0x17, 1, 0, &[64])).unwrap();
        session.process_ble_chunk(&framed(ProtocolVersion::V4, 0x19, 2, 10, &[3, 0, 0, 0])).unwrap();
        let id = session.id();
        session.destroy();

        let events: Vec<RecordEvent> = records.collect().await;
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.session == id && e.stream == Stream::Live));
        assert_eq!(events[0].record.kind(), RecordKind::Battery);
        assert_eq!(events[1].record, Record::Steps { timestamp_ms: 10, steps: 3 });
    }

    #[tokio::test]
    async fn capabilities_limit_what_reaches_the_stream() {
        let (mut session, _clock) = session_for("4.0.0");
        let capabilities = Capabilities::none().with(RecordKind::Steps, Stream::Live);
        let (channel, records) = RecordChannel::channel_with_capabilities(capabilities);
        session.register(channel);

        session.process_ble_chunk(&framed(ProtocolVersion::V4, 0x17, 1, 0, &[64])).unwrap();
        session.process_ble_chunk(&framed(ProtocolVersion::V4, 0x19, 2, 10, &[3, 0, 0, 0])).unwrap();
        session.destroy();

        let events: Vec<RecordEvent> = records.collect().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].record, Record::Steps { timestamp_ms: 10, steps: 3 });
    }

    #[test]
    fn dropped_stream_does_not_panic() {
        let (mut channel, records) = RecordChannel::channel();
        drop(records);
        channel.on_record(SessionId(1), Stream::Live, &Record::Battery { level: 5 });
    }
}
