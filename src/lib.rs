//! Host-side protocol engine for Aidlab and Aidmed One wearable biosensors.
//!
//! The SDK sits between a BLE stack the host owns and the application. It detects
//! which protocol generation the device speaks, reassembles notification chunks into
//! frames, verifies and decompresses V4 frames, parses payloads into typed
//! [`Record`]s and delivers them to a registered [`Delegate`]. Outbound, it frames
//! commands and hands them to the host's [`Transport`].
//!
//! # Features
//!
//! - **All protocol generations**: V1 through V4, detected from firmware and traffic
//! - **Owned sessions**: one [`Session`] per device, no global state
//! - **Typed records**: ECG, motion, heart rate, pressure, GPS and more
//! - **Async helpers**: providers, a tokio driver and record streams
//!
//! # Quick Start
//!
//! ```rust
//! use aidlab_sdk::{Aidlab, Delegate, Record, SessionId, Stream};
//!
//! struct Printer;
//!
//! impl Delegate for Printer {
//!     fn on_record(&mut self, _session: SessionId, stream: Stream, record: &Record) {
//!         println!("{stream}: {record:?}");
//!     }
//! }
//!
//! # fn main() -> aidlab_sdk::Result<()> {
//! let mut session = Aidlab::create();
//! session.register(Printer);
//! session.set_hardware_revision(b"Aidlab 1.2")?;
//! session.set_firmware_revision(b"4.1.0")?;
//!
//! // Bytes from the data characteristic's notifications.
//! session.process_ble_chunk(&[0x04, 0x17, 0x00, 0x14, 0x00])?;
//!
//! // A command the host writes to the command characteristic.
//! let command = session.get_command("sync start")?;
//! assert_eq!(command.len() % 20, 0);
//! # Ok(())
//! # }
//! ```

// Core types and error handling
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Protocol engine
pub mod clock;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod protocol;
pub mod records;
pub mod session;

// Async host helpers
pub mod capture;
pub mod driver;
pub mod provider;
pub mod providers;
pub mod stream;

// Core exports
pub use error::*;
pub use types::*;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SessionConfig;
pub use dispatch::{Capabilities, Delegate, DispatchState, LogSink, Transport};
pub use protocol::ProtocolVersion;
pub use records::Characteristic;
pub use session::Session;

pub use driver::{Driver, DriverHandle};
pub use provider::{Chunk, Provider};

/// Entry point for creating sessions.
///
/// # Examples
///
/// ```rust
/// use aidlab_sdk::{Aidlab, SessionConfig};
///
/// let config = SessionConfig { aggressive_ecg_filtration: true, ..SessionConfig::default() };
/// let session = Aidlab::create_with_config(config).unwrap();
/// assert!(session.config().aggressive_ecg_filtration);
/// ```
pub struct Aidlab;

impl Aidlab {
    /// Session with the default configuration.
    ///
    /// Hardware and firmware revisions must be set before any chunk is processed.
    pub fn create() -> Session {
        Session::new()
    }

    /// Session with a configuration, validated first.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Config`] if a limit in `config` is out of range.
    pub fn create_with_config(config: SessionConfig) -> Result<Session> {
        Session::with_config(config)
    }

    /// Session configured from a YAML file.
    ///
    /// ```rust,no_run
    /// use aidlab_sdk::Aidlab;
    ///
    /// # fn main() -> aidlab_sdk::Result<()> {
    /// let session = Aidlab::create_from_yaml("aidlab.yaml")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn create_from_yaml<P: AsRef<std::path::Path>>(path: P) -> Result<Session> {
        Session::with_config(SessionConfig::from_yaml_file(path)?)
    }
}
