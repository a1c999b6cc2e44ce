//! Device process identifiers

use serde::{Deserialize, Serialize};

/// On-device subsystem that produced a framed payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Process {
    Ecg,
    Respiration,
    SkinTemperature,
    Motion,
    Orientation,
    Quaternion,
    BodyPosition,
    Battery,
    Activity,
    Steps,
    RespirationRate,
    WearState,
    HeartRate,
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

impl Process {
    pub fn id(self) -> u8 {
        match self {
            Process::Ecg => 0x10,
            Process::Respiration => 0x11,
            Process::SkinTemperature => 0x12,
            Process::Motion => 0x13,
            Process::Orientation => 0x14,
            Process::Quaternion => 0x15,
            Process::BodyPosition => 0x16,
            Process::Battery => 0x17,
            Process::Activity => 0x18,
            Process::Steps => 0x19,
            Process::RespirationRate => 0x1A,
            Process::WearState => 0x1B,
            Process::HeartRate => 0x1C,
            Process::SoundVolume => 0x1D,
            Process::Exercise => 0x1E,
            Process::UserEvent => 0x1F,
            Process::Pressure => 0x20,
            Process::PressureWearState => 0x21,
            Process::SignalQuality => 0x22,
            Process::Eda => 0x23,
            Process::Gps => 0x24,
            Process::SoundFeatures => 0x25,
            Process::SyncState => 0x30,
            Process::UnsynchronizedSize => 0x31,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        let process = match id {
            0x10 => Process::Ecg,
            0x11 => Process::Respiration,
            0x12 => Process::SkinTemperature,
            0x13 => Process::Motion,
            0x14 => Process::Orientation,
            0x15 => Process::Quaternion,
            0x16 => Process::BodyPosition,
            0x17 => Process::Battery,
            0x18 => Process::Activity,
            0x19 => Process::Steps,
            0x1A => Process::RespirationRate,
            0x1B => Process::WearState,
            0x1C => Process::HeartRate,
            0x1D => Process::SoundVolume,
            0x1E => Process::Exercise,
            0x1F => Process::UserEvent,
            0x20 => Process::Pressure,
            0x21 => Process::PressureWearState,
            0x22 => Process::SignalQuality,
            0x23 => Process::Eda,
            0x24 => Process::Gps,
            0x25 => Process::SoundFeatures,
            0x30 => Process::SyncState,
            0x31 => Process::UnsynchronizedSize,
            _ => return None,
        };
        Some(process)
    }

    pub fn name(self) -> &'static str {
        match self {
            Process::Ecg => "Ecg",
            Process::Respiration => "Respiration",
            Process::SkinTemperature => "SkinTemperature",
            Process::Motion => "Motion",
            Process::Orientation => "Orientation",
            Process::Quaternion => "Quaternion",
            Process::BodyPosition => "BodyPosition",
            Process::Battery => "Battery",
            Process::Activity => "Activity",
            Process::Steps => "Steps",
            Process::RespirationRate => "RespirationRate",
            Process::WearState => "WearState",
            Process::HeartRate => "HeartRate",
            Process::SoundVolume => "SoundVolume",
            Process::Exercise => "Exercise",
            Process::UserEvent => "UserEvent",
            Process::Pressure => "Pressure",
            Process::PressureWearState => "PressureWearState",
            Process::SignalQuality => "SignalQuality",
            Process::Eda => "Eda",
            Process::Gps => "Gps",
            Process::SoundFeatures => "SoundFeatures",
            Process::SyncState => "SyncState",
            Process::UnsynchronizedSize => "UnsynchronizedSize",
        }
    }

    /// Interval between consecutive samples of a batched process.
    pub fn sample_interval_ms(self) -> Option<u64> {
        match self {
            Process::Ecg => Some(4),
            Process::Respiration => Some(40),
            _ => None,
        }
    }
}

impl std::fmt::Display for Process {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for id in 0..=u8::MAX {
            if let Some(process) = Process::from_id(id) {
                assert_eq!(process.id(), id);
            }
        }
        assert_eq!(Process::from_id(0x50), None);
        assert_eq!(Process::from_id(0x00), None);
    }
}
