//! Frame builders and recording sinks shared by unit tests and benches

#![cfg(any(test, feature = "benchmark"))]

use std::sync::{Arc, Mutex, MutexGuard};

use crate::clock::ManualClock;
use crate::config::MAX_WIRE_FRAME_LEN;
use crate::dispatch::{Capabilities, Delegate, LogSink, Transport};
use crate::protocol::{FrameFlags, ProtocolVersion, encode_frame};
use crate::session::Session;
use crate::types::{LogLevel, Record, SessionId, Stream};

/// Clock start used by [`session_for`].
pub const TEST_CLOCK_START_MS: u64 = 1_700_000_000_000;

/// `[timestamp][body]` for a framed protocol.
pub fn timed_payload(version: ProtocolVersion, timestamp_ms: u64, body: &[u8]) -> Vec<u8> {
    let mut payload = match version.timestamp_len() {
        4 => ((timestamp_ms / 1000) as u32).to_le_bytes().to_vec(),
        8 => timestamp_ms.to_le_bytes().to_vec(),
        _ => Vec::new(),
    };
    payload.extend_from_slice(body);
    payload
}

/// Packed 24-bit little-endian samples.
pub fn i24_samples(samples: &[i32]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes().into_iter().take(3)).collect()
}

/// A complete frame with a timestamped payload.
pub fn framed(
    version: ProtocolVersion,
    process: u8,
    sequence: u16,
    timestamp_ms: u64,
    body: &[u8],
) -> Vec<u8> {
    let payload = timed_payload(version, timestamp_ms, body);
    raw_frame(version, process, sequence, FrameFlags::NONE, &payload)
}

/// A complete frame around `payload` as given.
pub fn raw_frame(
    version: ProtocolVersion,
    process: u8,
    sequence: u16,
    flags: FrameFlags,
    payload: &[u8],
) -> Vec<u8> {
    match encode_frame(version, process, sequence, flags, payload, MAX_WIRE_FRAME_LEN) {
        Ok(frame) => frame,
        Err(err) => panic!("test frame does not fit: {err}"),
    }
}

/// Session with an Aidlab hardware revision, the given firmware and a manual clock.
pub fn session_for(firmware: &str) -> (Session, ManualClock) {
    let clock = ManualClock::new(TEST_CLOCK_START_MS);
    let mut session = Session::new().with_clock(clock.clone());
    if let Err(err) = session.set_hardware_revision(b"Aidlab 1.2") {
        panic!("hardware revision rejected: {err}");
    }
    if let Err(err) = session.set_firmware_revision(firmware.as_bytes()) {
        panic!("firmware revision {firmware} rejected: {err}");
    }
    (session, clock)
}

/// Delegate that stores everything it receives.
#[derive(Clone, Default)]
pub struct RecordingDelegate {
    capabilities: Option<Capabilities>,
    records: Arc<Mutex<Vec<(Stream, Record)>>>,
    payloads: Arc<Mutex<Vec<(u8, Vec<u8>)>>>,
}

impl RecordingDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self { capabilities: Some(capabilities), ..Self::default() }
    }

    pub fn records(&self) -> Vec<(Stream, Record)> {
        lock(&self.records).clone()
    }

    pub fn payloads(&self) -> Vec<(u8, Vec<u8>)> {
        lock(&self.payloads).clone()
    }
}

impl Delegate for RecordingDelegate {
    fn capabilities(&self) -> Capabilities {
        self.capabilities.unwrap_or_else(Capabilities::all)
    }

    fn on_record(&mut self, _session: SessionId, stream: Stream, record: &Record) {
        lock(&self.records).push((stream, record.clone()));
    }

    fn on_payload(&mut self, _session: SessionId, process: u8, payload: &[u8]) {
        lock(&self.payloads).push((process, payload.to_vec()));
    }
}

/// Transport that stores sent frames and counts readiness notifications.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    ready: Arc<Mutex<usize>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        lock(&self.sent).clone()
    }

    pub fn ready_count(&self) -> usize {
        *lock(&self.ready)
    }
}

impl Transport for RecordingTransport {
    fn send(&mut self, _session: SessionId, frame: &[u8]) {
        lock(&self.sent).push(frame.to_vec());
    }

    fn ready(&mut self, _session: SessionId) {
        *lock(&self.ready) += 1;
    }
}

/// Log sink that keeps every message.
#[derive(Clone, Default)]
pub struct RecordingLog {
    entries: Arc<Mutex<Vec<(LogLevel, String)>>>,
}

impl RecordingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        lock(&self.entries).clone()
    }

    pub fn count_at(&self, level: LogLevel) -> usize {
        lock(&self.entries).iter().filter(|(l, _)| *l == level).count()
    }
}

impl LogSink for RecordingLog {
    fn log(&mut self, _session: SessionId, level: LogLevel, message: &str) {
        lock(&self.entries).push((level, message.to_owned()));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
