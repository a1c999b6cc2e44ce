//! Host-side sinks: the BLE transport proxy and the structured log channel

use crate::types::{LogLevel, SessionId};

/// Outbound side of the BLE link, owned by the host.
///
/// `send` receives complete frames; splitting them to the negotiated MTU is the
/// host's job. `ready` is a level notification that the next payload may be sent.
pub trait Transport: Send {
    fn send(&mut self, session: SessionId, frame: &[u8]);

    fn ready(&mut self, session: SessionId);
}

/// Receives every message the session logs.
pub trait LogSink: Send {
    fn log(&mut self, session: SessionId, level: LogLevel, message: &str);
}

impl<F> LogSink for F
where
    F: FnMut(SessionId, LogLevel, &str) + Send,
{
    fn log(&mut self, session: SessionId, level: LogLevel, message: &str) {
        self(session, level, message)
    }
}
