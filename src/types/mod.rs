//! Core types shared by the decoder, encoder and dispatch layers.
//!
//! ## Overview
//!
//! - [`Record`] is a decoded sensor sample or device event; [`RecordKind`] is its
//!   discriminant and carries the live/sync slot rules.
//! - [`Stream`] tags chunks and records as live or synchronization data.
//! - [`FirmwareVersion`] and [`HardwareRevision`] parse the Device Information strings
//!   that select protocol version and sensor scaling.
//! - [`Signal`] enumerates the identifiers accepted by the collect command.
//! - State enums ([`WearState`], [`SyncState`], ...) map raw device values with a
//!   catch-all member for values newer firmware may introduce.
//!
//! ## Usage Example
//!
//! ```rust
//! use aidlab_sdk::types::{FirmwareVersion, RecordKind, Stream};
//!
//! let firmware = FirmwareVersion::parse(b"3.7.69\0").unwrap();
//! assert_eq!(firmware, FirmwareVersion::new(3, 7, 69));
//!
//! assert!(RecordKind::Ecg.has_slot(Stream::Sync));
//! assert!(!RecordKind::Battery.has_slot(Stream::Sync));
//! assert_eq!(RecordKind::SyncState.delivery_stream(Stream::Live), Stream::Sync);
//! ```

mod log_level;
mod record;
mod revision;
mod signal;
mod states;
mod stream;

// Re-export all public types
pub use log_level::LogLevel;
pub use record::{GpsFix, Record, RecordKind};
pub use revision::{DeviceModel, FirmwareVersion, HardwareRevision};
pub use signal::Signal;
pub use states::{ActivityType, BodyPosition, Exercise, SyncState, WearState};
pub use stream::{SessionId, Stream};

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    prop_compose! {
        fn arb_firmware()(major in 0u16..100, minor in 0u16..100, patch in 0u16..1000)
            -> FirmwareVersion {
            FirmwareVersion::new(major, minor, patch)
        }
    }

    proptest! {
        #[test]
        fn prop_firmware_display_parses_back(version in arb_firmware(), padding in 0usize..8) {
            let mut raw = version.to_string().into_bytes();
            raw.extend(std::iter::repeat_n(0u8, padding));
            prop_assert_eq!(FirmwareVersion::parse(&raw).unwrap(), version);
        }

        #[test]
        fn prop_firmware_ordering_matches_tuple_ordering(a in arb_firmware(), b in arb_firmware()) {
            prop_assert_eq!(
                a.cmp(&b),
                (a.major, a.minor, a.patch).cmp(&(b.major, b.minor, b.patch))
            );
        }

        #[test]
        fn prop_signal_ids_validate(id in any::<u8>()) {
            let decoded = Signal::from_id(id);
            prop_assert_eq!(decoded.is_ok(), id < 18);
            if let Ok(signal) = decoded {
                prop_assert_eq!(signal.id(), id);
            }
        }
    }

    #[test]
    fn every_kind_has_a_delivery_slot() {
        for kind in RecordKind::ALL {
            let live = kind.delivery_stream(Stream::Live);
            assert!(kind.has_slot(live), "{kind} has no slot for live data");
            if !kind.is_live_only() {
                let sync = kind.delivery_stream(Stream::Sync);
                assert!(kind.has_slot(sync), "{kind} has no slot for sync data");
            }
        }
    }

    #[test]
    fn live_only_kinds_have_no_historical_slot() {
        let live_only: Vec<_> = RecordKind::ALL.into_iter().filter(|k| k.is_live_only()).collect();
        assert_eq!(
            live_only,
            vec![
                RecordKind::Battery,
                RecordKind::WearState,
                RecordKind::Exercise,
                RecordKind::PressureWearState,
                RecordKind::SoundFeatures
            ]
        );
        for kind in live_only {
            assert!(!kind.has_slot(Stream::Sync));
        }
    }

    #[test]
    fn record_kind_and_timestamp_accessors() {
        let ecg = Record::Ecg { timestamp_ms: 1_700_000_000_000, value: 0.5 };
        assert_eq!(ecg.kind(), RecordKind::Ecg);
        assert_eq!(ecg.timestamp_ms(), Some(1_700_000_000_000));

        let battery = Record::Battery { level: 87 };
        assert_eq!(battery.kind(), RecordKind::Battery);
        assert_eq!(battery.timestamp_ms(), None);
    }

    #[test]
    fn stream_bytes_round_trip() {
        for stream in Stream::ALL {
            assert_eq!(Stream::from_byte(stream.to_byte()), Some(stream));
        }
        assert_eq!(Stream::from_byte(2), None);
        assert!(SessionId::next() != SessionId::next());
    }
}
