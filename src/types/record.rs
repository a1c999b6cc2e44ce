//! Typed records delivered to delegates

use serde::{Deserialize, Serialize};

use super::states::{ActivityType, BodyPosition, Exercise, SyncState, WearState};
use super::stream::Stream;

/// Discriminant of a [`Record`], used for capability sets and sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordKind {
    Ecg,
    Respiration,
    SkinTemperature,
    Accelerometer,
    Gyroscope,
    Magnetometer,
    Orientation,
    Quaternion,
    BodyPosition,
    Battery,
    Activity,
    Steps,
    RespirationRate,
    WearState,
    HeartRate,
    Rr,
    SoundVolume,
    Exercise,
    UserEvent,
    Pressure,
    PressureWearState,
    SignalQuality,
    Eda,
    Gps,
    SoundFeatures,
    SyncState,
    UnsynchronizedSize,
}

impl RecordKind {
    pub const ALL: [RecordKind; 27] = [
        RecordKind::Ecg,
        RecordKind::Respiration,
        RecordKind::SkinTemperature,
        RecordKind::Accelerometer,
        RecordKind::Gyroscope,
        RecordKind::Magnetometer,
        RecordKind::Orientation,
        RecordKind::Quaternion,
        RecordKind::BodyPosition,
        RecordKind::Battery,
        RecordKind::Activity,
        RecordKind::Steps,
        RecordKind::RespirationRate,
        RecordKind::WearState,
        RecordKind::HeartRate,
        RecordKind::Rr,
        RecordKind::SoundVolume,
        RecordKind::Exercise,
        RecordKind::UserEvent,
        RecordKind::Pressure,
        RecordKind::PressureWearState,
        RecordKind::SignalQuality,
        RecordKind::Eda,
        RecordKind::Gps,
        RecordKind::SoundFeatures,
        RecordKind::SyncState,
        RecordKind::UnsynchronizedSize,
    ];

    /// Kinds the device only ever reports in real time.
    pub fn is_live_only(self) -> bool {
        matches!(
            self,
            RecordKind::Battery
                | RecordKind::WearState
                | RecordKind::Exercise
                | RecordKind::PressureWearState
                | RecordKind::SoundFeatures
        )
    }

    /// Kinds that describe the synchronization itself.
    pub fn is_sync_control(self) -> bool {
        matches!(self, RecordKind::SyncState | RecordKind::UnsynchronizedSize)
    }

    /// Whether a delegate slot for this kind exists on `stream`.
    pub fn has_slot(self, stream: Stream) -> bool {
        match stream {
            Stream::Live => !self.is_sync_control(),
            Stream::Sync => !self.is_live_only(),
        }
    }

    /// Stream a record of this kind is delivered on when it arrived on `carried_on`.
    pub fn delivery_stream(self, carried_on: Stream) -> Stream {
        if self.is_sync_control() { Stream::Sync } else { carried_on }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// A single GPS fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    pub latitude: f32,
    pub longitude: f32,
    pub altitude: f32,
    pub speed: f32,
    pub heading: f32,
    pub hdop: f32,
}

/// A decoded sensor sample or device event.
///
/// Timestamps are unix milliseconds. Records that the device reports as pure state
/// (battery, wear state, exercise, synchronization progress) carry none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Record {
    /// ECG sample in millivolts.
    Ecg { timestamp_ms: u64, value: f32 },
    Respiration { timestamp_ms: u64, value: f32 },
    SkinTemperature { timestamp_ms: u64, celsius: f32 },
    /// Acceleration in g.
    Accelerometer { timestamp_ms: u64, x: f32, y: f32, z: f32 },
    /// Angular rate in degrees per second.
    Gyroscope { timestamp_ms: u64, x: f32, y: f32, z: f32 },
    /// Magnetic field in microtesla.
    Magnetometer { timestamp_ms: u64, x: f32, y: f32, z: f32 },
    /// Euler angles in degrees.
    Orientation { timestamp_ms: u64, roll: f32, pitch: f32, yaw: f32 },
    Quaternion { timestamp_ms: u64, w: f32, x: f32, y: f32, z: f32 },
    BodyPosition { timestamp_ms: u64, position: BodyPosition },
    /// Battery charge in percent.
    Battery { level: u8 },
    Activity { timestamp_ms: u64, activity: ActivityType },
    Steps { timestamp_ms: u64, steps: u64 },
    /// Breaths per minute.
    RespirationRate { timestamp_ms: u64, rate: u32 },
    WearState { state: WearState },
    HeartRate { timestamp_ms: u64, bpm: i32 },
    /// Interval between consecutive beats.
    Rr { timestamp_ms: u64, interval_ms: i32 },
    SoundVolume { timestamp_ms: u64, volume: u16 },
    Exercise { exercise: Exercise },
    UserEvent { timestamp_ms: u64 },
    /// Nasal cannula pressure samples. Older firmware reports exactly one value.
    Pressure { timestamp_ms: u64, values: Vec<i32> },
    PressureWearState { state: WearState },
    SignalQuality { timestamp_ms: u64, quality: u8 },
    /// Electrodermal activity, conductance in microsiemens.
    Eda { timestamp_ms: u64, conductance: f32 },
    Gps { timestamp_ms: u64, fix: GpsFix },
    SoundFeatures { timestamp_ms: u64, features: Vec<f32> },
    SyncState { state: SyncState },
    /// Data still waiting to be synchronized and the current transfer rate.
    UnsynchronizedSize { bytes: u32, bytes_per_second: f32 },
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Ecg { .. } => RecordKind::Ecg,
            Record::Respiration { .. } => RecordKind::Respiration,
            Record::SkinTemperature { .. } => RecordKind::SkinTemperature,
            Record::Accelerometer { .. } => RecordKind::Accelerometer,
            Record::Gyroscope { .. } => RecordKind::Gyroscope,
            Record::Magnetometer { .. } => RecordKind::Magnetometer,
            Record::Orientation { .. } => RecordKind::Orientation,
            Record::Quaternion { .. } => RecordKind::Quaternion,
            Record::BodyPosition { .. } => RecordKind::BodyPosition,
            Record::Battery { .. } => RecordKind::Battery,
            Record::Activity { .. } => RecordKind::Activity,
            Record::Steps { .. } => RecordKind::Steps,
            Record::RespirationRate { .. } => RecordKind::RespirationRate,
            Record::WearState { .. } => RecordKind::WearState,
            Record::HeartRate { .. } => RecordKind::HeartRate,
            Record::Rr { .. } => RecordKind::Rr,
            Record::SoundVolume { .. } => RecordKind::SoundVolume,
            Record::Exercise { .. } => RecordKind::Exercise,
            Record::UserEvent { .. } => RecordKind::UserEvent,
            Record::Pressure { .. } => RecordKind::Pressure,
            Record::PressureWearState { .. } => RecordKind::PressureWearState,
            Record::SignalQuality { .. } => RecordKind::SignalQuality,
            Record::Eda { .. } => RecordKind::Eda,
            Record::Gps { .. } => RecordKind::Gps,
            Record::SoundFeatures { .. } => RecordKind::SoundFeatures,
            Record::SyncState { .. } => RecordKind::SyncState,
            Record::UnsynchronizedSize { .. } => RecordKind::UnsynchronizedSize,
        }
    }

    pub fn timestamp_ms(&self) -> Option<u64> {
        match self {
            Record::Ecg { timestamp_ms, .. }
            | Record::Respiration { timestamp_ms, .. }
            | Record::SkinTemperature { timestamp_ms, .. }
            | Record::Accelerometer { timestamp_ms, .. }
            | Record::Gyroscope { timestamp_ms, .. }
            | Record::Magnetometer { timestamp_ms, .. }
            | Record::Orientation { timestamp_ms, .. }
            | Record::Quaternion { timestamp_ms, .. }
            | Record::BodyPosition { timestamp_ms, .. }
            | Record::Activity { timestamp_ms, .. }
            | Record::Steps { timestamp_ms, .. }
            | Record::RespirationRate { timestamp_ms, .. }
            | Record::HeartRate { timestamp_ms, .. }
            | Record::Rr { timestamp_ms, .. }
            | Record::SoundVolume { timestamp_ms, .. }
            | Record::UserEvent { timestamp_ms }
            | Record::Pressure { timestamp_ms, .. }
            | Record::SignalQuality { timestamp_ms, .. }
            | Record::Eda { timestamp_ms, .. }
            | Record::Gps { timestamp_ms, .. }
            | Record::SoundFeatures { timestamp_ms, .. } => Some(*timestamp_ms),
            Record::Battery { .. }
            | Record::WearState { .. }
            | Record::Exercise { .. }
            | Record::PressureWearState { .. }
            | Record::SyncState { .. }
            | Record::UnsynchronizedSize { .. } => None,
        }
    }
}
