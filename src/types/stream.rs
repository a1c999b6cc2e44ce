//! Stream tags and session handles

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Logical channel a chunk or record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stream {
    /// Real-time data as it is measured.
    Live,
    /// Previously recorded data replayed during synchronization.
    Sync,
}

impl Stream {
    /// Both streams, live first.
    pub const ALL: [Stream; 2] = [Stream::Live, Stream::Sync];

    /// Index into per-stream state arrays.
    pub(crate) fn index(self) -> usize {
        match self {
            Stream::Live => 0,
            Stream::Sync => 1,
        }
    }

    /// Wire tag used in capture files.
    pub fn to_byte(self) -> u8 {
        match self {
            Stream::Live => 0,
            Stream::Sync => 1,
        }
    }

    /// Inverse of [`Stream::to_byte`].
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Stream::Live),
            1 => Some(Stream::Sync),
            _ => None,
        }
    }
}

impl std::fmt::Display for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stream::Live => f.write_str("live"),
            Stream::Sync => f.write_str("sync"),
        }
    }
}

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies a session in every delegate, transport and log callback.
///
/// Assigned automatically on creation; hosts can replace it with their own
/// identifier through `Session::set_context`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl SessionId {
    /// Allocate a process-unique identifier.
    pub fn next() -> Self {
        SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}
