//! Per-device protocol session
//!
//! A [`Session`] owns everything one connected device needs: revisions, protocol
//! detection, per-stream reassembly and filtration, the callback registry, the
//! outbound sequence counter and the command buffer. All methods take `&mut self`;
//! sessions share nothing and may be moved between threads.
//!
//! Frame-local failures never surface as `Err`. They are logged through `tracing`
//! and the session's [`LogSink`] at the level [`SdkError::log_level`] assigns, and the
//! session carries on with the next frame.

use tracing::{debug, error, info, trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::command::{
    ACK_PROCESS, COLLECT_PROCESS, COMMAND_PROCESS, Command, CommandBuffer, collect_payload,
    signals_from_ids,
};
use crate::config::SessionConfig;
use crate::dispatch::{CallbackRegistry, Delegate, DispatchState, LogSink, Transport};
use crate::protocol::{
    Detection, Extracted, FrameFlags, ProtocolDetector, ProtocolVersion, Reassembler,
    compress_if_smaller, decode_frame, encode_frame,
};
use crate::records::{Characteristic, EcgFilter, Process, Timelines, parse_legacy, parse_payload};
use crate::types::{
    DeviceModel, FirmwareVersion, HardwareRevision, LogLevel, Record, SessionId, Signal, Stream,
};
use crate::{Result, SdkError};

/// Protocol engine for one connected device.
pub struct Session {
    id: SessionId,
    config: SessionConfig,
    clock: Box<dyn Clock>,
    hardware: Option<HardwareRevision>,
    firmware: Option<FirmwareVersion>,
    detector: ProtocolDetector,
    reassemblers: [Reassembler; 2],
    filters: [EcgFilter; 2],
    timelines: Timelines,
    registry: CallbackRegistry,
    transport: Option<Box<dyn Transport>>,
    log_sink: Option<Box<dyn LogSink>>,
    next_sequence: u16,
    /// Sequence of the gated outbound frame the device has yet to acknowledge.
    awaiting_ack: Option<u16>,
    commands: CommandBuffer,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("hardware", &self.hardware)
            .field("firmware", &self.firmware)
            .field("detector", &self.detector)
            .field("registry", &self.registry)
            .field("next_sequence", &self.next_sequence)
            .field("awaiting_ack", &self.awaiting_ack)
            .finish_non_exhaustive()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Session with the default configuration and the system clock.
    pub fn new() -> Self {
        Self::build(SessionConfig::default())
    }

    /// Session with a validated configuration.
    pub fn with_config(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: SessionConfig) -> Self {
        let aggressive = config.aggressive_ecg_filtration;
        let id = SessionId::next();
        debug!(session = %id, ?config, "Created session");
        Self {
            id,
            config,
            clock: Box::new(SystemClock),
            hardware: None,
            firmware: None,
            detector: ProtocolDetector::new(),
            reassemblers: [Reassembler::new(), Reassembler::new()],
            filters: [EcgFilter::new(aggressive), EcgFilter::new(aggressive)],
            timelines: Timelines::default(),
            registry: CallbackRegistry::default(),
            transport: None,
            log_sink: None,
            next_sequence: 0,
            awaiting_ack: None,
            commands: CommandBuffer::new(),
        }
    }

    /// Replace the clock used to stamp packages without a device timestamp.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Replace the handle passed back in every callback.
    pub fn set_context(&mut self, id: SessionId) {
        self.id = id;
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn hardware_revision(&self) -> Option<&HardwareRevision> {
        self.hardware.as_ref()
    }

    pub fn firmware_revision(&self) -> Option<FirmwareVersion> {
        self.firmware
    }

    /// Protocol version decided so far, if any.
    pub fn protocol_version(&self) -> Option<ProtocolVersion> {
        self.detector.detected()
    }

    pub fn state(&self) -> DispatchState {
        match (self.registry.is_registered(), self.revisions_set()) {
            (false, _) => DispatchState::Uninitialized,
            (true, false) => DispatchState::CallbacksRegistered,
            (true, true) => DispatchState::Active,
        }
    }

    /// Whether outbound traffic is held until the device acknowledges.
    pub fn is_awaiting_ack(&self) -> bool {
        self.awaiting_ack.is_some()
    }

    pub fn set_hardware_revision(&mut self, raw: &[u8]) -> Result<()> {
        let hardware = HardwareRevision::parse(raw)?;
        info!(
            session = %self.id,
            hardware = hardware.as_str(),
            model = ?hardware.model(),
            "Hardware revision set"
        );
        self.hardware = Some(hardware);
        Ok(())
    }

    pub fn set_firmware_revision(&mut self, raw: &[u8]) -> Result<()> {
        let firmware = FirmwareVersion::parse(raw)?;
        self.detector.set_firmware(firmware);
        info!(
            session = %self.id,
            %firmware,
            expected = ?self.detector.expected(),
            "Firmware revision set"
        );
        self.firmware = Some(firmware);
        Ok(())
    }

    /// Toggle the smoothing stage. Filter state on both streams restarts.
    pub fn set_aggressive_ecg_filtration(&mut self, aggressive: bool) {
        self.config.aggressive_ecg_filtration = aggressive;
        for filter in &mut self.filters {
            filter.set_aggressive(aggressive);
        }
    }

    /// Install the delegate, replacing any previous one.
    pub fn register(&mut self, delegate: impl Delegate + 'static) {
        self.registry.register(Box::new(delegate));
        debug!(
            session = %self.id,
            capabilities = ?self.registry.capabilities(),
            "Delegate registered"
        );
    }

    pub fn set_transport(&mut self, transport: impl Transport + 'static) {
        self.transport = Some(Box::new(transport));
    }

    pub fn set_log_sink(&mut self, sink: impl LogSink + 'static) {
        self.log_sink = Some(Box::new(sink));
    }

    /// Feed a chunk received on the live characteristic.
    pub fn process_ble_chunk(&mut self, bytes: &[u8]) -> Result<()> {
        self.process_chunk(Stream::Live, bytes)
    }

    /// Feed a chunk of `stream`.
    ///
    /// Returns `Err` only when revisions are missing; everything wrong with the bytes
    /// themselves is logged and absorbed.
    pub fn process_chunk(&mut self, stream: Stream, bytes: &[u8]) -> Result<()> {
        let model = self.require_revisions()?;
        if bytes.is_empty() {
            return Ok(());
        }

        let version = match self.detector.observe(bytes) {
            Detection::Decided(version) => version,
            Detection::Detected { version, expected } => {
                if version == expected {
                    self.log(LogLevel::Debug, &format!("Detected protocol {version}"));
                } else {
                    self.log(
                        LogLevel::Debug,
                        &format!("Detected protocol {version}, firmware suggested {expected}"),
                    );
                }
                version
            }
            Detection::Unrecognized(marker) => {
                self.log(
                    LogLevel::Warn,
                    &format!("Unrecognized protocol marker {marker:#04x}, chunk discarded"),
                );
                return Ok(());
            }
            Detection::Empty => return Ok(()),
        };

        let extracted =
            self.reassemblers[stream.index()].push(version, bytes, self.config.max_frame_len);
        for item in extracted {
            match item {
                Extracted::Frame(raw) => self.handle_frame(stream, version, model, &raw),
                Extracted::Duplicate { sequence, ack_requested } => {
                    self.log(
                        LogLevel::Debug,
                        &format!("Dropped duplicate frame {sequence} on {stream}"),
                    );
                    if ack_requested {
                        self.acknowledge(sequence);
                    }
                }
                Extracted::Rejected(err) => self.absorb(err),
            }
        }
        Ok(())
    }

    /// Feed a package read from a pre-framing characteristic. Delivered on the live
    /// stream and stamped with the session clock.
    pub fn process_legacy_package(
        &mut self,
        characteristic: Characteristic,
        data: &[u8],
    ) -> Result<()> {
        let model = self.require_revisions()?;
        let now_ms = self.clock.now_ms();
        match parse_legacy(characteristic, data, model, now_ms, &mut self.timelines) {
            Ok(records) => self.deliver_all(Stream::Live, records),
            Err(err) => self.absorb(err),
        }
        Ok(())
    }

    /// Build a text-keyed command into the command buffer.
    ///
    /// The returned buffer is zero-padded; its logical length is at offset 3.
    pub fn get_command(&mut self, text: &str) -> Result<&[u8]> {
        let command: Command = text.parse()?;
        let (_, frame) = self.frame_outbound(COMMAND_PROCESS, &command.payload())?;
        let padding = self.command_padding();
        Ok(self.commands.fill(&frame, padding))
    }

    /// Build the collect command into the command buffer.
    pub fn get_collect_command(&mut self, real: &[Signal], sync: &[Signal]) -> Result<&[u8]> {
        let payload = collect_payload(real, sync)?;
        let (_, frame) = self.frame_outbound(COLLECT_PROCESS, &payload)?;
        let padding = self.command_padding();
        Ok(self.commands.fill(&frame, padding))
    }

    /// [`get_collect_command`](Self::get_collect_command) from raw signal ids.
    pub fn get_collect_command_ids(&mut self, real: &[u8], sync: &[u8]) -> Result<&[u8]> {
        let real = signals_from_ids(real)?;
        let sync = signals_from_ids(sync)?;
        self.get_collect_command(&real, &sync)
    }

    /// Frame `payload` for `process` and hand it to the transport.
    pub fn send(&mut self, payload: &[u8], process: u8) -> Result<()> {
        let (sequence, frame) = self.frame_outbound(process, payload)?;
        self.transmit(sequence, &frame)
    }

    pub fn send_command(&mut self, text: &str) -> Result<()> {
        let command: Command = text.parse()?;
        self.send(&command.payload(), COMMAND_PROCESS)
    }

    pub fn send_collect_command(&mut self, real: &[Signal], sync: &[Signal]) -> Result<()> {
        let payload = collect_payload(real, sync)?;
        self.send(&payload, COLLECT_PROCESS)
    }

    /// End the session. Pending reassembly state is dropped.
    pub fn destroy(self) {
        let pending: usize = self.reassemblers.iter().map(Reassembler::pending_len).sum();
        debug!(session = %self.id, pending, "Session destroyed");
    }

    fn revisions_set(&self) -> bool {
        self.hardware.is_some() && self.firmware.is_some()
    }

    fn require_revisions(&self) -> Result<DeviceModel> {
        match (&self.hardware, self.firmware) {
            (Some(hardware), Some(_)) => Ok(hardware.model()),
            (None, _) => Err(SdkError::invalid_state("hardware revision not set")),
            (_, None) => Err(SdkError::invalid_state("firmware revision not set")),
        }
    }

    fn handle_frame(
        &mut self,
        stream: Stream,
        version: ProtocolVersion,
        model: DeviceModel,
        raw: &[u8],
    ) {
        let frame = match decode_frame(version, raw) {
            Ok(frame) => frame,
            Err(err) => return self.absorb(err),
        };

        if frame.is_ack() {
            self.release_gate(&frame.payload);
            return;
        }
        if frame.wants_ack() {
            self.acknowledge(frame.sequence);
        }

        self.registry.deliver_payload(self.id, frame.process, &frame.payload);

        let Some(process) = Process::from_id(frame.process) else {
            return self.absorb(SdkError::UnknownProcess { process: frame.process });
        };
        let parsed = if version == ProtocolVersion::V1 {
            let now_ms = self.clock.now_ms();
            parse_legacy(Characteristic::Ecg, &frame.payload, model, now_ms, &mut self.timelines)
        } else {
            parse_payload(process, version, &frame.payload, model)
        };
        match parsed {
            Ok(records) => self.deliver_all(stream, records),
            Err(err) => self.absorb(err),
        }
    }

    fn deliver_all(&mut self, carried_on: Stream, records: Vec<Record>) {
        let filter = &mut self.filters[carried_on.index()];
        for mut record in records {
            if let Record::Ecg { value, .. } = &mut record {
                *value = filter.apply(*value);
            }
            let stream = record.kind().delivery_stream(carried_on);
            if let Err(err) = self.registry.deliver(self.id, stream, &record) {
                emit(self.id, self.log_sink.as_deref_mut(), err.log_level(), &err.to_string());
            }
        }
    }

    /// ACK payloads carry the acknowledged sequence; only the gated frame's ACK opens
    /// the gate.
    fn release_gate(&mut self, payload: &[u8]) {
        let &[lo, hi, ..] = payload else {
            self.log(LogLevel::Debug, "ACK frame without an acknowledged sequence");
            return;
        };
        let sequence = u16::from_le_bytes([lo, hi]);
        match self.awaiting_ack {
            Some(pending) if pending == sequence => {
                self.awaiting_ack = None;
                trace!(session = %self.id, sequence, "ACK received, transport ready");
                if let Some(transport) = self.transport.as_mut() {
                    transport.ready(self.id);
                }
            }
            Some(pending) => self.log(
                LogLevel::Debug,
                &format!("Stale ACK for frame {sequence}, waiting on {pending}"),
            ),
            None => self.log(LogLevel::Debug, &format!("Unsolicited ACK for frame {sequence}")),
        }
    }

    fn acknowledge(&mut self, sequence: u16) {
        let sequence_out = self.take_sequence();
        let ack = encode_frame(
            ProtocolVersion::V4,
            ACK_PROCESS,
            sequence_out,
            FrameFlags::ACK,
            &sequence.to_le_bytes(),
            self.config.max_frame_len,
        );
        match (ack, self.transport.as_mut()) {
            (Ok(frame), Some(transport)) => transport.send(self.id, &frame),
            (Ok(_), None) => {
                self.log(LogLevel::Debug, &format!("No transport to acknowledge frame {sequence}"))
            }
            (Err(err), _) => self.absorb(err),
        }
    }

    fn frame_outbound(&mut self, process: u8, payload: &[u8]) -> Result<(u16, Vec<u8>)> {
        let version = self
            .detector
            .outbound()
            .ok_or_else(|| SdkError::invalid_state("firmware revision not set"))?;

        let compressed = if version == ProtocolVersion::V4
            && payload.len() >= self.config.compression_threshold
        {
            compress_if_smaller(payload)
        } else {
            None
        };
        let (flags, body) = match &compressed {
            Some(smaller) => (FrameFlags::COMPRESSED, smaller.as_slice()),
            None => (FrameFlags::NONE, payload),
        };

        let sequence = self.take_sequence();
        let frame = encode_frame(version, process, sequence, flags, body, self.config.max_frame_len)?;
        trace!(
            session = %self.id,
            %version,
            process,
            sequence,
            compressed = compressed.is_some(),
            len = frame.len(),
            "Framed outbound payload"
        );
        Ok((sequence, frame))
    }

    fn transmit(&mut self, sequence: u16, frame: &[u8]) -> Result<()> {
        let gated = self.detector.outbound() == Some(ProtocolVersion::V4) && self.config.ack_gate;
        let id = self.id;
        let transport = self
            .transport
            .as_mut()
            .ok_or_else(|| SdkError::invalid_state("no transport registered"))?;
        transport.send(id, frame);
        if gated {
            self.awaiting_ack = Some(sequence);
        } else {
            transport.ready(id);
        }
        Ok(())
    }

    fn take_sequence(&mut self) -> u16 {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        sequence
    }

    fn command_padding(&self) -> usize {
        match self.firmware {
            Some(firmware) if firmware.has_short_commands() => firmware.command_chunk_len(),
            _ => self.config.command_padding,
        }
    }

    fn absorb(&mut self, err: SdkError) {
        self.log(err.log_level(), &err.to_string());
    }

    fn log(&mut self, level: LogLevel, message: &str) {
        emit(self.id, self.log_sink.as_deref_mut(), level, message);
    }
}

fn emit(id: SessionId, sink: Option<&mut (dyn LogSink + 'static)>, level: LogLevel, message: &str) {
    match level {
        LogLevel::Debug => debug!(session = %id, "{message}"),
        LogLevel::Info => info!(session = %id, "{message}"),
        LogLevel::Warn => warn!(session = %id, "{message}"),
        LogLevel::Error => error!(session = %id, "{message}"),
    }
    if let Some(sink) = sink {
        sink.log(id, level, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{decode_collect_payload, logical_frame};
    use crate::protocol::{V4_HEADER_LEN, decode_frame};
    use crate::test_utils::{
        RecordingDelegate, RecordingLog, RecordingTransport, TEST_CLOCK_START_MS, framed,
        i24_samples, raw_frame, session_for, timed_payload,
    };
    use crate::dispatch::Capabilities;
    use crate::types::RecordKind;

    fn wired(firmware: &str) -> (Session, RecordingDelegate, RecordingLog) {
        let (mut session, _clock) = session_for(firmware);
        let delegate = RecordingDelegate::new();
        let log = RecordingLog::new();
        session.register(delegate.clone());
        session.set_log_sink(log.clone());
        (session, delegate, log)
    }

    #[test]
    fn chunks_before_revisions_are_refused() {
        let mut session = Session::new();
        assert!(matches!(
            session.process_ble_chunk(&[0x04, 0x10]),
            Err(SdkError::InvalidState { .. })
        ));
        session.set_hardware_revision(b"Aidlab").unwrap();
        assert!(matches!(
            session.process_ble_chunk(&[0x04, 0x10]),
            Err(SdkError::InvalidState { .. })
        ));
    }

    #[test]
    fn dispatch_state_follows_setup() {
        let mut session = Session::new();
        assert_eq!(session.state(), DispatchState::Uninitialized);
        session.register(RecordingDelegate::new());
        assert_eq!(session.state(), DispatchState::CallbacksRegistered);
        session.set_hardware_revision(b"Aidlab").unwrap();
        session.set_firmware_revision(b"4.0.0").unwrap();
        assert_eq!(session.state(), DispatchState::Active);
    }

    #[test]
    fn v4_steps_are_delivered_live() {
        let (mut session, delegate, _log) = wired("4.1.0");
        let frame = framed(ProtocolVersion::V4, 0x19, 1, 5_000, &42u32.to_le_bytes());
        session.process_ble_chunk(&frame).unwrap();

        assert_eq!(session.protocol_version(), Some(ProtocolVersion::V4));
        assert_eq!(
            delegate.records(),
            vec![(Stream::Live, Record::Steps { timestamp_ms: 5_000, steps: 42 })]
        );
        assert_eq!(delegate.payloads()[0].0, 0x19);
    }

    #[test]
    fn sync_control_records_always_arrive_on_sync() {
        let (mut session, delegate, _log) = wired("4.1.0");
        let frame = framed(ProtocolVersion::V4, 0x30, 1, 0, &[2]);
        session.process_chunk(Stream::Live, &frame).unwrap();
        assert_eq!(delegate.records()[0].0, Stream::Sync);
    }

    #[test]
    fn frames_split_across_chunks_dispatch_once() {
        let (mut session, delegate, _log) = wired("3.6.0");
        let frame = framed(ProtocolVersion::V3, 0x17, 3, 9_000, &[87]);
        for byte in &frame {
            session.process_chunk(Stream::Live, std::slice::from_ref(byte)).unwrap();
        }
        assert_eq!(delegate.records(), vec![(Stream::Live, Record::Battery { level: 87 })]);
    }

    #[test]
    fn corrupted_crc_logs_one_error_and_session_recovers() {
        let (mut session, delegate, log) = wired("4.0.0");
        let mut bad = framed(ProtocolVersion::V4, 0x19, 1, 0, &1u32.to_le_bytes());
        let last = bad.len() - 1;
        bad[last] ^= 0x01;
        session.process_ble_chunk(&bad).unwrap();
        assert_eq!(log.count_at(LogLevel::Error), 1);
        assert!(delegate.records().is_empty());

        let good = framed(ProtocolVersion::V4, 0x19, 2, 0, &2u32.to_le_bytes());
        session.process_ble_chunk(&good).unwrap();
        assert_eq!(delegate.records().len(), 1);
    }

    #[test]
    fn duplicate_frames_are_dropped() {
        let (mut session, delegate, log) = wired("4.0.0");
        let frame = framed(ProtocolVersion::V4, 0x1B, 7, 0, &[1]);
        session.process_ble_chunk(&frame).unwrap();
        session.process_ble_chunk(&frame).unwrap();
        assert_eq!(delegate.records().len(), 1);
        assert!(log.entries().iter().any(|(l, m)| *l == LogLevel::Debug && m.contains("duplicate")));
    }

    #[test]
    fn unknown_process_is_a_debug_drop() {
        let (mut session, delegate, log) = wired("4.0.0");
        session.process_ble_chunk(&framed(ProtocolVersion::V4, 0x7F, 1, 0, &[])).unwrap();
        assert!(delegate.records().is_empty());
        assert_eq!(log.count_at(LogLevel::Debug), 2);
        assert_eq!(log.count_at(LogLevel::Warn), 0);
    }

    #[test]
    fn unrecognized_marker_keeps_detection_pending() {
        let (mut session, delegate, log) = wired("4.0.0");
        session.process_ble_chunk(&[0x7E, 1, 2, 3, 4]).unwrap();
        assert_eq!(session.protocol_version(), None);
        assert_eq!(log.count_at(LogLevel::Warn), 1);

        session.process_ble_chunk(&framed(ProtocolVersion::V4, 0x17, 1, 0, &[50])).unwrap();
        assert_eq!(delegate.records().len(), 1);
    }

    #[test]
    fn v1_ecg_is_stamped_from_the_clock() {
        let (mut session, clock) = session_for("2.5.0");
        let delegate = RecordingDelegate::new();
        session.register(delegate.clone());

        session.process_ble_chunk(&i24_samples(&[100, 200, 300])).unwrap();
        clock.advance(4);
        session.process_ble_chunk(&i24_samples(&[400])).unwrap();

        let stamps: Vec<u64> =
            delegate.records().iter().filter_map(|(_, r)| r.timestamp_ms()).collect();
        let start = TEST_CLOCK_START_MS;
        assert_eq!(stamps, vec![start, start + 4, start + 8, start + 12]);
        assert!(delegate.records().iter().all(|(_, r)| r.kind() == RecordKind::Ecg));
    }

    #[test]
    fn records_outside_capabilities_are_dropped_quietly() {
        let (mut session, _clock) = session_for("4.0.0");
        let delegate = RecordingDelegate::with_capabilities(
            Capabilities::none().with(RecordKind::Battery, Stream::Live),
        );
        let log = RecordingLog::new();
        session.register(delegate.clone());
        session.set_log_sink(log.clone());

        session.process_ble_chunk(&framed(ProtocolVersion::V4, 0x19, 1, 0, &[1, 0, 0, 0])).unwrap();
        assert!(delegate.records().is_empty());
        assert!(log.entries().iter().all(|(level, _)| *level == LogLevel::Debug));
    }

    #[test]
    fn legacy_pressure_is_single_element() {
        let (mut session, delegate, _log) = wired("3.5.0");
        let frame = framed(ProtocolVersion::V2, 0x20, 1, 3_000, &(-12i32).to_le_bytes());
        session.process_ble_chunk(&frame).unwrap();
        assert_eq!(
            delegate.records(),
            vec![(Stream::Live, Record::Pressure { timestamp_ms: 3_000, values: vec![-12] })]
        );
    }

    #[test]
    fn ack_requested_frames_are_acknowledged() {
        let (mut session, delegate, _log) = wired("4.0.0");
        let transport = RecordingTransport::new();
        session.set_transport(transport.clone());

        let payload = timed_payload(ProtocolVersion::V4, 0, &[60]);
        let frame = raw_frame(ProtocolVersion::V4, 0x17, 0x0102, FrameFlags::ACK_REQUESTED, &payload);
        session.process_ble_chunk(&frame).unwrap();

        assert_eq!(delegate.records().len(), 1);
        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        let ack = decode_frame(ProtocolVersion::V4, &sent[0]).unwrap();
        assert!(ack.is_ack());
        assert_eq!(ack.process, ACK_PROCESS);
        assert_eq!(ack.payload, vec![0x02, 0x01]);
    }

    #[test]
    fn retransmitted_ack_request_is_acknowledged_again() {
        let (mut session, delegate, _log) = wired("4.0.0");
        let transport = RecordingTransport::new();
        session.set_transport(transport.clone());

        let payload = timed_payload(ProtocolVersion::V4, 0, &[60]);
        let frame = raw_frame(ProtocolVersion::V4, 0x17, 0x0102, FrameFlags::ACK_REQUESTED, &payload);
        session.process_ble_chunk(&frame).unwrap();
        session.process_ble_chunk(&frame).unwrap();

        assert_eq!(delegate.records().len(), 1);
        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        for bytes in &sent {
            let ack = decode_frame(ProtocolVersion::V4, bytes).unwrap();
            assert!(ack.is_ack());
            assert_eq!(ack.payload, vec![0x02, 0x01]);
        }
    }

    #[test]
    fn duplicate_without_ack_request_sends_nothing() {
        let (mut session, delegate, _log) = wired("4.0.0");
        let transport = RecordingTransport::new();
        session.set_transport(transport.clone());

        let frame = framed(ProtocolVersion::V4, 0x17, 4, 0, &[60]);
        session.process_ble_chunk(&frame).unwrap();
        session.process_ble_chunk(&frame).unwrap();

        assert_eq!(delegate.records().len(), 1);
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn ack_gate_holds_ready_until_acknowledged() {
        let (mut session, _delegate, _log) = wired("4.0.0");
        let transport = RecordingTransport::new();
        session.set_transport(transport.clone());

        session.send_command("ping").unwrap();
        assert_eq!(transport.sent().len(), 1);
        assert_eq!(transport.ready_count(), 0);
        assert!(session.is_awaiting_ack());

        let ack = raw_frame(ProtocolVersion::V4, ACK_PROCESS, 9, FrameFlags::ACK, &0u16.to_le_bytes());
        session.process_ble_chunk(&ack).unwrap();
        assert_eq!(transport.ready_count(), 1);
        assert!(!session.is_awaiting_ack());
    }

    #[test]
    fn ack_for_another_frame_keeps_the_gate_closed() {
        let (mut session, _delegate, log) = wired("4.0.0");
        let transport = RecordingTransport::new();
        session.set_transport(transport.clone());

        session.send_command("ping").unwrap();
        session.send_command("reboot").unwrap();
        assert!(session.is_awaiting_ack());

        let stale =
            raw_frame(ProtocolVersion::V4, ACK_PROCESS, 20, FrameFlags::ACK, &0u16.to_le_bytes());
        session.process_ble_chunk(&stale).unwrap();
        assert_eq!(transport.ready_count(), 0);
        assert!(session.is_awaiting_ack());
        assert!(log.entries().iter().any(|(level, message)| {
            *level == LogLevel::Debug && message.contains("Stale ACK for frame 0")
        }));

        let empty = raw_frame(ProtocolVersion::V4, ACK_PROCESS, 21, FrameFlags::ACK, &[]);
        session.process_ble_chunk(&empty).unwrap();
        assert!(session.is_awaiting_ack());

        let current =
            raw_frame(ProtocolVersion::V4, ACK_PROCESS, 22, FrameFlags::ACK, &1u16.to_le_bytes());
        session.process_ble_chunk(&current).unwrap();
        assert_eq!(transport.ready_count(), 1);
        assert!(!session.is_awaiting_ack());
    }

    #[test]
    fn ungated_sessions_signal_ready_immediately() {
        let config = SessionConfig { ack_gate: false, ..SessionConfig::default() };
        let mut session = Session::with_config(config).unwrap();
        session.set_hardware_revision(b"Aidlab").unwrap();
        session.set_firmware_revision(b"4.0.0").unwrap();
        let transport = RecordingTransport::new();
        session.set_transport(transport.clone());

        session.send(&[1, 2, 3], 0x50).unwrap();
        assert_eq!(transport.ready_count(), 1);

        let (mut legacy, _clock) = session_for("3.6.0");
        let legacy_transport = RecordingTransport::new();
        legacy.set_transport(legacy_transport.clone());
        legacy.send_command("sync start").unwrap();
        assert_eq!(legacy_transport.ready_count(), 1);
    }

    #[test]
    fn send_without_transport_is_a_caller_error() {
        let (mut session, _clock) = session_for("4.0.0");
        assert!(matches!(session.send(&[1], 0x50), Err(SdkError::InvalidState { .. })));
    }

    #[test]
    fn large_v4_payloads_are_compressed() {
        let (mut session, _clock) = session_for("4.0.0");
        let transport = RecordingTransport::new();
        session.set_transport(transport.clone());

        let payload = vec![7u8; 512];
        session.send(&payload, 0x60).unwrap();
        let sent = transport.sent();
        assert!(sent[0].len() < V4_HEADER_LEN + payload.len());
        let frame = decode_frame(ProtocolVersion::V4, &sent[0]).unwrap();
        assert!(frame.compressed);
        assert_eq!(frame.payload, payload);
    }

    #[test]
    fn collect_command_is_padded_and_framed() {
        let (mut session, _clock) = session_for("4.0.0");
        let buffer =
            session.get_collect_command(&[Signal::Ecg, Signal::Motion], &[Signal::Steps]).unwrap();
        assert_eq!(buffer.len() % 20, 0);
        let frame = logical_frame(buffer).unwrap();
        let decoded = decode_frame(ProtocolVersion::V4, frame).unwrap();
        assert_eq!(decoded.process, COLLECT_PROCESS);
        assert_eq!(&decoded.payload[..2], &6u16.to_le_bytes());
        let (real, sync) = decode_collect_payload(&decoded.payload).unwrap();
        assert_eq!(real, vec![Signal::Ecg, Signal::Motion]);
        assert_eq!(sync, vec![Signal::Steps]);
    }

    #[test]
    fn configured_padding_applies_unless_firmware_is_short() {
        let config = SessionConfig { command_padding: 40, ..SessionConfig::default() };
        let mut session = Session::with_config(config.clone()).unwrap();
        session.set_hardware_revision(b"Aidlab").unwrap();
        session.set_firmware_revision(b"4.0.0").unwrap();
        assert_eq!(session.get_command("ping").unwrap().len(), 40);

        let mut old = Session::with_config(config).unwrap();
        old.set_hardware_revision(b"Aidlab").unwrap();
        old.set_firmware_revision(b"2.2.1").unwrap();
        assert_eq!(old.get_command("ping").unwrap().len(), 18);
    }

    #[test]
    fn old_firmware_pads_commands_to_18() {
        let (mut session, _clock) = session_for("2.1.0");
        let buffer = session.get_command("ping").unwrap();
        assert_eq!(buffer.len(), 18);
        assert_eq!(buffer[0], crate::protocol::V1_OUTBOUND_MARKER);
    }

    #[test]
    fn unknown_commands_and_signals_are_errors() {
        let (mut session, _clock) = session_for("4.0.0");
        assert!(matches!(session.get_command("launch"), Err(SdkError::UnknownCommand { .. })));
        assert!(matches!(
            session.get_collect_command_ids(&[0, 99], &[]),
            Err(SdkError::UnknownSignal { id: 99 })
        ));
    }

    #[test]
    fn toggling_filtration_updates_config() {
        let (mut session, _clock) = session_for("4.0.0");
        session.set_aggressive_ecg_filtration(true);
        assert!(session.config().aggressive_ecg_filtration);
    }

    #[test]
    fn context_replaces_session_id() {
        let mut session = Session::new();
        session.set_context(SessionId(77));
        assert_eq!(session.id(), SessionId(77));
        session.destroy();
    }
}
