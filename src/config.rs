//! Session configuration
//!
//! Every field has a default, so an empty YAML document is a valid configuration:
//!
//! ```rust
//! use aidlab_sdk::SessionConfig;
//!
//! let config = SessionConfig::from_yaml_str("ack_gate: false\nmax_frame_len: 4096\n").unwrap();
//! assert!(!config.ack_gate);
//! assert_eq!(config.max_frame_len, 4096);
//! assert_eq!(config.command_padding, 20);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::{Result, SdkError};

/// Largest frame representable by the 16-bit length field.
pub const MAX_WIRE_FRAME_LEN: usize = u16::MAX as usize;

/// Tunables for a single session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Apply the moving-average stage on top of DC removal for ECG samples.
    pub aggressive_ecg_filtration: bool,
    /// On V4, hold `Transport::ready` until the device acknowledges the last frame.
    pub ack_gate: bool,
    /// Outbound V4 payloads at least this long are offered to the compressor.
    pub compression_threshold: usize,
    /// Frames declaring a larger total length are rejected as malformed.
    pub max_frame_len: usize,
    /// Command buffers are zero-padded to a multiple of this many bytes.
    pub command_padding: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            aggressive_ecg_filtration: false,
            ack_gate: true,
            compression_threshold: 64,
            max_frame_len: 8192,
            command_padding: 20,
        }
    }
}

impl SessionConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: SessionConfig = if yaml.trim().is_empty() {
            SessionConfig::default()
        } else {
            serde_yaml_ng::from_str(yaml)?
        };
        config.validate()?;
        debug!(?config, "Loaded session configuration");
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| SdkError::file_error(path.to_path_buf(), e))?;
        Self::from_yaml_str(&yaml)
    }

    /// Check numeric limits.
    pub fn validate(&self) -> Result<()> {
        if self.command_padding == 0 {
            return Err(SdkError::config("command_padding must be positive"));
        }
        if self.max_frame_len < crate::protocol::V4_HEADER_LEN
            || self.max_frame_len > MAX_WIRE_FRAME_LEN
        {
            return Err(SdkError::config(format!(
                "max_frame_len must be between {} and {}, got {}",
                crate::protocol::V4_HEADER_LEN,
                MAX_WIRE_FRAME_LEN,
                self.max_frame_len
            )));
        }
        Ok(())
    }
}
