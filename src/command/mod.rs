//! Outbound command encoding
//!
//! Text commands and the collect command are sent as ordinary frames: process
//! [`COMMAND_PROCESS`] with `[opcode][args]`, or process [`COLLECT_PROCESS`] with
//!
//! ```text
//! [entries_len u16][real_count u8][sync_count u8] { [signal id][0x00 live | 0x01 sync] }*
//! ```
//!
//! where `entries_len` counts the bytes after the 4-byte collect header. Built frames
//! live in a session-owned [`CommandBuffer`], zero-padded to the command chunk size,
//! so hosts read the logical length at offset 3 before forwarding:
//!
//! ```rust
//! use aidlab_sdk::command::{framed_len, logical_frame};
//!
//! let padded = [0x04, 0x50, 0x00, 12, 0, 0, 0, 0, 0, 0, 0, 0x04, 0, 0, 0, 0, 0, 0, 0, 0];
//! assert_eq!(framed_len(&padded), Some(12));
//! assert_eq!(logical_frame(&padded).map(<[u8]>::len), Some(12));
//! ```

use std::str::FromStr;

use crate::protocol::peek_total_len;
use crate::types::Signal;
use crate::{Result, SdkError};

/// Process id of text-keyed commands.
pub const COMMAND_PROCESS: u8 = 0x50;
/// Process id of the collect command.
pub const COLLECT_PROCESS: u8 = 0x51;
/// Process id of V4 acknowledgement frames.
pub const ACK_PROCESS: u8 = 0x00;
/// Length of the collect body header.
pub const COLLECT_HEADER_LEN: usize = 4;
/// Most signals a single collect list can carry.
pub const MAX_COLLECT_SIGNALS: usize = u8::MAX as usize;

/// A text-keyed device command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SyncStart,
    SyncStop,
    SyncErase,
    Ping,
    Reboot,
    /// Set the device clock to unix seconds.
    SetTime(u32),
}

impl Command {
    pub fn opcode(self) -> u8 {
        match self {
            Command::SyncStart => 0x01,
            Command::SyncStop => 0x02,
            Command::SyncErase => 0x03,
            Command::Ping => 0x04,
            Command::Reboot => 0x05,
            Command::SetTime(_) => 0x06,
        }
    }

    /// `[opcode][args]`.
    pub fn payload(self) -> Vec<u8> {
        let mut payload = vec![self.opcode()];
        if let Command::SetTime(seconds) = self {
            payload.extend_from_slice(&seconds.to_le_bytes());
        }
        payload
    }
}

impl FromStr for Command {
    type Err = SdkError;

    /// Keywords are case-insensitive and runs of whitespace count as one space.
    fn from_str(text: &str) -> Result<Self> {
        let lowered = text.to_ascii_lowercase();
        let words: Vec<&str> = lowered.split_whitespace().collect();
        let command = match words.as_slice() {
            ["sync", "start"] => Command::SyncStart,
            ["sync", "stop"] => Command::SyncStop,
            ["sync", "erase"] => Command::SyncErase,
            ["ping"] => Command::Ping,
            ["reboot"] => Command::Reboot,
            ["time", seconds] => {
                Command::SetTime(seconds.parse().map_err(|_| SdkError::unknown_command(text))?)
            }
            _ => return Err(SdkError::unknown_command(text)),
        };
        Ok(command)
    }
}

/// Collect command body for the given live and synchronized signals.
pub fn collect_payload(real: &[Signal], sync: &[Signal]) -> Result<Vec<u8>> {
    for list in [real, sync] {
        if list.len() > MAX_COLLECT_SIGNALS {
            return Err(SdkError::PayloadTooLarge { len: list.len(), max: MAX_COLLECT_SIGNALS });
        }
    }
    let entries_len = 2 * (real.len() + sync.len());
    let mut payload = Vec::with_capacity(COLLECT_HEADER_LEN + entries_len);
    // Both lists are at most 255 long, so this fits.
    payload.extend_from_slice(&(entries_len as u16).to_le_bytes());
    payload.push(real.len() as u8);
    payload.push(sync.len() as u8);
    for signal in real {
        payload.extend_from_slice(&[signal.id(), 0x00]);
    }
    for signal in sync {
        payload.extend_from_slice(&[signal.id(), 0x01]);
    }
    Ok(payload)
}

/// Validate raw signal ids.
pub fn signals_from_ids(ids: &[u8]) -> Result<Vec<Signal>> {
    ids.iter().map(|&id| Signal::from_id(id)).collect()
}

/// Inverse of [`collect_payload`]: `(real, sync)` signal lists.
pub fn decode_collect_payload(payload: &[u8]) -> Result<(Vec<Signal>, Vec<Signal>)> {
    let malformed = |details: String| SdkError::malformed_record("Collect", details);
    if payload.len() < COLLECT_HEADER_LEN {
        return Err(malformed(format!("header needs 4 bytes, have {}", payload.len())));
    }
    let entries_len = usize::from(u16::from_le_bytes([payload[0], payload[1]]));
    let real_count = usize::from(payload[2]);
    let sync_count = usize::from(payload[3]);
    let entries = &payload[COLLECT_HEADER_LEN..];
    if entries.len() < entries_len || entries_len != 2 * (real_count + sync_count) {
        return Err(malformed(format!(
            "entries_len {} disagrees with {} live + {} sync entries in {} bytes",
            entries_len,
            real_count,
            sync_count,
            entries.len()
        )));
    }

    let mut real = Vec::with_capacity(real_count);
    let mut sync = Vec::with_capacity(sync_count);
    for (index, entry) in entries[..entries_len].chunks_exact(2).enumerate() {
        let signal = Signal::from_id(entry[0])?;
        let expected_tag = if index < real_count { 0x00 } else { 0x01 };
        if entry[1] != expected_tag {
            return Err(malformed(format!("entry {index} has stream tag {:#04x}", entry[1])));
        }
        if index < real_count { real.push(signal) } else { sync.push(signal) }
    }
    Ok((real, sync))
}

/// Logical frame length stored at offset 3 of a command buffer.
pub fn framed_len(buffer: &[u8]) -> Option<usize> {
    peek_total_len(buffer)
}

/// The logical frame at the start of a padded command buffer.
pub fn logical_frame(buffer: &[u8]) -> Option<&[u8]> {
    let len = framed_len(buffer)?;
    buffer.get(..len)
}

/// Single reusable buffer holding the most recently built command.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    bytes: Vec<u8>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with `frame`, zero-padded to a multiple of `padding`.
    pub fn fill(&mut self, frame: &[u8], padding: usize) -> &[u8] {
        let padding = padding.max(1);
        let padded = frame.len().div_ceil(padding) * padding;
        self.bytes.clear();
        self.bytes.extend_from_slice(frame);
        self.bytes.resize(padded, 0);
        &self.bytes
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
