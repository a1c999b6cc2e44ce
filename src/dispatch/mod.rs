//! Routing decoded records to the registered delegate.

mod delegate;
mod transport;

pub use delegate::{Capabilities, Delegate};
pub use transport::{LogSink, Transport};

use crate::types::{Record, SessionId, Stream};
use crate::{Result, SdkError};

/// Lifecycle of a session's dispatch layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchState {
    /// No delegate registered.
    Uninitialized,
    /// Delegate registered, revisions still missing.
    CallbacksRegistered,
    /// Delegate registered and revisions set; records are delivered.
    Active,
}

/// The registered delegate and the capability snapshot taken at registration.
#[derive(Default)]
pub struct CallbackRegistry {
    delegate: Option<Box<dyn Delegate>>,
    capabilities: Capabilities,
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("registered", &self.delegate.is_some())
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

impl CallbackRegistry {
    /// Replace the delegate wholesale.
    pub fn register(&mut self, delegate: Box<dyn Delegate>) {
        self.capabilities = delegate.capabilities();
        self.delegate = Some(delegate);
    }

    pub fn unregister(&mut self) -> Option<Box<dyn Delegate>> {
        self.capabilities = Capabilities::none();
        self.delegate.take()
    }

    pub fn is_registered(&self) -> bool {
        self.delegate.is_some()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn deliver_payload(&mut self, session: SessionId, process: u8, payload: &[u8]) {
        if let Some(delegate) = self.delegate.as_mut() {
            delegate.on_payload(session, process, payload);
        }
    }

    /// Hand a record to the delegate if its slot is registered.
    pub fn deliver(&mut self, session: SessionId, stream: Stream, record: &Record) -> Result<()> {
        let kind = record.kind();
        match self.delegate.as_mut() {
            Some(delegate) if self.capabilities.contains(kind, stream) => {
                delegate.on_record(session, stream, record);
                Ok(())
            }
            _ => Err(SdkError::UnregisteredCallback {
                kind: kind.to_string(),
                stream: stream.to_string(),
            }),
        }
    }
}
