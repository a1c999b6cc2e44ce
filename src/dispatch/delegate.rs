//! Delegate trait and capability sets

use crate::types::{Record, RecordKind, SessionId, Stream};

/// Set of `(record kind, stream)` slots a delegate accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Capabilities {
    bits: u64,
}

impl Capabilities {
    /// No slots.
    pub const fn none() -> Self {
        Self { bits: 0 }
    }

    /// Every slot that exists for some kind.
    pub fn all() -> Self {
        RecordKind::ALL.iter().fold(Self::none(), |caps, &kind| {
            Stream::ALL.iter().fold(caps, |caps, &stream| caps.with(kind, stream))
        })
    }

    /// Every existing slot of the given kinds, on both streams.
    pub fn of_kinds(kinds: &[RecordKind]) -> Self {
        kinds.iter().fold(Self::none(), |caps, &kind| {
            caps.with(kind, Stream::Live).with(kind, Stream::Sync)
        })
    }

    /// Add a slot. Slots that do not exist (battery on the sync stream, for
    /// example) are ignored.
    pub fn with(mut self, kind: RecordKind, stream: Stream) -> Self {
        if kind.has_slot(stream) {
            self.bits |= Self::bit(kind, stream);
        }
        self
    }

    pub fn without(mut self, kind: RecordKind, stream: Stream) -> Self {
        self.bits &= !Self::bit(kind, stream);
        self
    }

    pub fn contains(&self, kind: RecordKind, stream: Stream) -> bool {
        self.bits & Self::bit(kind, stream) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    fn bit(kind: RecordKind, stream: Stream) -> u64 {
        1u64 << (kind as u64 * 2 + stream.index() as u64)
    }
}

/// Receives decoded data from a session.
///
/// The capability set is read once when the delegate is registered; records outside
/// it are dropped without calling the delegate.
pub trait Delegate: Send {
    /// Slots this delegate accepts.
    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }

    fn on_record(&mut self, session: SessionId, stream: Stream, record: &Record);

    /// Raw `(process, payload)` of every decoded frame, before typed parsing.
    fn on_payload(&mut self, _session: SessionId, _process: u8, _payload: &[u8]) {}
}
