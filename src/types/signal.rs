//! Signal identifiers accepted by the collect command

use serde::{Deserialize, Serialize};

use crate::{Result, SdkError};

/// A measurable signal the device can stream live or record for synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Signal {
    Ecg,
    Respiration,
    SkinTemperature,
    Motion,
    Battery,
    Activity,
    Orientation,
    Steps,
    HeartRate,
    HealthThermometer,
    SoundVolume,
    Rr,
    Pressure,
    SoundFeatures,
    RespirationRate,
    BodyPosition,
    Eda,
    Gps,
}

impl Signal {
    pub const ALL: [Signal; 18] = [
        Signal::Ecg,
        Signal::Respiration,
        Signal::SkinTemperature,
        Signal::Motion,
        Signal::Battery,
        Signal::Activity,
        Signal::Orientation,
        Signal::Steps,
        Signal::HeartRate,
        Signal::HealthThermometer,
        Signal::SoundVolume,
        Signal::Rr,
        Signal::Pressure,
        Signal::SoundFeatures,
        Signal::RespirationRate,
        Signal::BodyPosition,
        Signal::Eda,
        Signal::Gps,
    ];

    /// Wire identifier.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Validate a raw identifier.
    pub fn from_id(id: u8) -> Result<Self> {
        Signal::ALL.get(usize::from(id)).copied().ok_or(SdkError::UnknownSignal { id })
    }
}

impl TryFrom<u8> for Signal {
    type Error = SdkError;

    fn try_from(id: u8) -> Result<Self> {
        Signal::from_id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_match_positions() {
        for (index, signal) in Signal::ALL.iter().enumerate() {
            assert_eq!(usize::from(signal.id()), index);
            assert_eq!(Signal::from_id(signal.id()).unwrap(), *signal);
        }
        assert_eq!(Signal::Ecg.id(), 0);
        assert_eq!(Signal::BodyPosition.id(), 15);
        assert_eq!(Signal::Gps.id(), 17);
    }

    #[test]
    fn unknown_ids_are_rejected() {
        assert!(matches!(Signal::from_id(18), Err(SdkError::UnknownSignal { id: 18 })));
        assert!(Signal::try_from(255).is_err());
    }
}
