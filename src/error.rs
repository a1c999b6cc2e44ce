//! Error types for the protocol engine.
//!
//! Every failure the SDK can observe is a variant of [`SdkError`]. The variants fall
//! into three groups with different delivery paths:
//!
//! ## Error Categories
//!
//! - **Per-frame errors**: malformed headers, version mismatches, CRC failures,
//!   decompression failures, unknown processes, malformed records and undelivered
//!   records. These are absorbed by the session: the offending frame or record is
//!   dropped and the error is reported only through the structured log channel.
//! - **Caller-contract errors**: decoding before revisions are set, unknown command
//!   keywords, unknown signal ids, oversized payloads. These are returned
//!   synchronously from the offending call.
//! - **Ambient errors**: configuration loading, capture files and I/O.
//!
//! ## Log Levels
//!
//! [`SdkError::log_level`] decides how a per-frame error is surfaced:
//!
//! ```rust
//! use aidlab_sdk::{LogLevel, SdkError};
//!
//! let crc = SdkError::CrcMismatch { expected: 0xDEAD_BEEF, actual: 0 };
//! assert_eq!(crc.log_level(), LogLevel::Error);
//! assert!(crc.is_frame_local());
//!
//! let unknown = SdkError::unknown_command("sync restart");
//! assert!(!unknown.is_frame_local());
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::types::LogLevel;

/// Result type alias for SDK operations.
pub type Result<T, E = SdkError> = std::result::Result<T, E>;

/// Main error type for SDK operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SdkError {
    #[error("Malformed frame header: {reason}")]
    MalformedHeader { reason: String },

    #[error("Protocol version mismatch: session speaks {expected}, frame marker is {found:#04x}")]
    VersionMismatch { expected: String, found: u8 },

    #[error("CRC mismatch: header carries {expected:#010x}, payload hashes to {actual:#010x}")]
    CrcMismatch { expected: u32, actual: u32 },

    #[error("Payload decompression failed: {details}")]
    Decompression { details: String },

    #[error("Unknown process id {process:#04x}")]
    UnknownProcess { process: u8 },

    #[error("Malformed {process} record: {details}")]
    MalformedRecord { process: String, details: String },

    #[error("No delegate slot registered for {kind} on the {stream} stream")]
    UnregisteredCallback { kind: String, stream: String },

    #[error("Invalid session state: {reason}")]
    InvalidState { reason: String },

    #[error("Invalid {field} revision: {value:?}")]
    InvalidRevision { field: &'static str, value: String },

    #[error("Unknown command keyword '{command}'")]
    UnknownCommand { command: String },

    #[error("Unknown signal id {id}")]
    UnknownSignal { id: u8 },

    #[error("Payload of {len} bytes exceeds the {max} byte frame limit")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("Configuration error: {details}")]
    Config {
        details: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Capture error in {context}: {details}")]
    Capture { context: String, details: String },

    #[error("File error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SdkError {
    /// Returns whether this error is absorbed per frame rather than returned to the caller.
    pub fn is_frame_local(&self) -> bool {
        match self {
            SdkError::MalformedHeader { .. }
            | SdkError::VersionMismatch { .. }
            | SdkError::CrcMismatch { .. }
            | SdkError::Decompression { .. }
            | SdkError::UnknownProcess { .. }
            | SdkError::MalformedRecord { .. }
            | SdkError::UnregisteredCallback { .. } => true,
            SdkError::InvalidState { .. }
            | SdkError::InvalidRevision { .. }
            | SdkError::UnknownCommand { .. }
            | SdkError::UnknownSignal { .. }
            | SdkError::PayloadTooLarge { .. }
            | SdkError::Config { .. }
            | SdkError::Capture { .. }
            | SdkError::File { .. } => false,
        }
    }

    /// Log level used when this error is surfaced through the log channel.
    pub fn log_level(&self) -> LogLevel {
        match self {
            SdkError::UnknownProcess { .. } | SdkError::UnregisteredCallback { .. } => {
                LogLevel::Debug
            }
            SdkError::MalformedHeader { .. }
            | SdkError::VersionMismatch { .. }
            | SdkError::MalformedRecord { .. } => LogLevel::Warn,
            SdkError::CrcMismatch { .. }
            | SdkError::Decompression { .. }
            | SdkError::InvalidState { .. }
            | SdkError::InvalidRevision { .. }
            | SdkError::UnknownCommand { .. }
            | SdkError::UnknownSignal { .. }
            | SdkError::PayloadTooLarge { .. }
            | SdkError::Config { .. }
            | SdkError::Capture { .. }
            | SdkError::File { .. } => LogLevel::Error,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            SdkError::MalformedHeader { .. } | SdkError::VersionMismatch { .. } => vec![
                "Check that chunks are fed in arrival order",
                "Verify the firmware revision reported by the device",
            ],
            SdkError::CrcMismatch { .. } | SdkError::Decompression { .. } => vec![
                "Check the BLE link quality",
                "Request the data again if it was part of a synchronization",
            ],
            SdkError::UnknownProcess { .. } | SdkError::MalformedRecord { .. } => vec![
                "Update the SDK to match the device firmware",
                "Use the payload callback to inspect raw data",
            ],
            SdkError::UnregisteredCallback { .. } => {
                vec!["Register a delegate whose capabilities include this record kind"]
            }
            SdkError::InvalidState { .. } | SdkError::InvalidRevision { .. } => vec![
                "Set the hardware and firmware revisions right after creating the session",
                "Read revisions from the Device Information service before streaming",
            ],
            SdkError::UnknownCommand { .. } | SdkError::UnknownSignal { .. } => {
                vec!["Check the command keyword or signal id against the supported table"]
            }
            SdkError::PayloadTooLarge { .. } => {
                vec!["Split the payload or raise max_frame_len in the session config"]
            }
            SdkError::Config { .. } => vec![
                "Check the YAML syntax of the configuration",
                "Verify numeric limits are positive",
            ],
            SdkError::Capture { .. } | SdkError::File { .. } => vec![
                "Check the capture file exists and is readable",
                "Verify the capture was written by a compatible recorder",
            ],
        }
    }

    /// Helper constructor for malformed headers.
    pub fn malformed_header(reason: impl Into<String>) -> Self {
        SdkError::MalformedHeader { reason: reason.into() }
    }

    /// Helper constructor for malformed records.
    pub fn malformed_record(process: impl Into<String>, details: impl Into<String>) -> Self {
        SdkError::MalformedRecord { process: process.into(), details: details.into() }
    }

    /// Helper constructor for state errors.
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        SdkError::InvalidState { reason: reason.into() }
    }

    /// Helper constructor for unknown command keywords.
    pub fn unknown_command(command: impl Into<String>) -> Self {
        SdkError::UnknownCommand { command: command.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config(details: impl Into<String>) -> Self {
        SdkError::Config { details: details.into(), source: None }
    }

    /// Helper constructor for configuration errors with source.
    pub fn config_with_source(
        details: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        SdkError::Config { details: details.into(), source: Some(source) }
    }

    /// Helper constructor for capture format errors.
    pub fn capture(context: impl Into<String>, details: impl Into<String>) -> Self {
        SdkError::Capture { context: context.into(), details: details.into() }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        SdkError::File { path, source }
    }
}

impl From<std::io::Error> for SdkError {
    fn from(err: std::io::Error) -> Self {
        SdkError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

impl From<serde_yaml_ng::Error> for SdkError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        SdkError::config_with_source("YAML deserialization failed", Box::new(err))
    }
}
