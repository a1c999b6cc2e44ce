//! Device state enumerations carried by event records
//!
//! Raw values match the device firmware. Values the firmware may add later decode to
//! the enum's catch-all member instead of failing the record.

use serde::{Deserialize, Serialize};

/// How the chest strap is placed on the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WearState {
    PlacedProperly,
    PlacedUpsideDown,
    Loose,
    Detached,
    Unknown,
    Unsettled,
}

impl WearState {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => WearState::PlacedProperly,
            1 => WearState::PlacedUpsideDown,
            2 => WearState::Loose,
            3 => WearState::Detached,
            5 => WearState::Unsettled,
            _ => WearState::Unknown,
        }
    }
}

/// Exercise repetition recognized on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exercise {
    None,
    PushUp,
    Jump,
    SitUp,
    Burpee,
    PullUp,
    Squat,
    PlankStart,
    PlankEnd,
}

impl Exercise {
    pub fn from_raw(raw: i8) -> Self {
        match raw {
            0 => Exercise::PushUp,
            1 => Exercise::Jump,
            2 => Exercise::SitUp,
            3 => Exercise::Burpee,
            4 => Exercise::PullUp,
            5 => Exercise::Squat,
            6 => Exercise::PlankStart,
            7 => Exercise::PlankEnd,
            _ => Exercise::None,
        }
    }
}

/// Activity classification. Raw values are single bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    Unspecific,
    Automotive,
    Walking,
    Running,
    Cycling,
    Still,
}

impl ActivityType {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => ActivityType::Automotive,
            2 => ActivityType::Walking,
            4 => ActivityType::Running,
            8 => ActivityType::Cycling,
            16 => ActivityType::Still,
            _ => ActivityType::Unspecific,
        }
    }
}

/// Progress of a historical data synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncState {
    Start,
    End,
    Stop,
    Empty,
    Unavailable,
}

impl SyncState {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => SyncState::Start,
            1 => SyncState::End,
            2 => SyncState::Stop,
            3 => SyncState::Empty,
            _ => SyncState::Unavailable,
        }
    }
}

/// Sleeping or lying position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyPosition {
    Undefined,
    /// Lying on the front.
    Prone,
    /// Lying on the back.
    Supine,
    LeftSide,
    RightSide,
}

impl BodyPosition {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => BodyPosition::Prone,
            2 => BodyPosition::Supine,
            3 => BodyPosition::LeftSide,
            4 => BodyPosition::RightSide,
            _ => BodyPosition::Undefined,
        }
    }
}
