//! Sticky protocol version detection

use super::ProtocolVersion;
use crate::types::FirmwareVersion;

/// Outcome of inspecting an inbound chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// Version was already decided before this chunk.
    Decided(ProtocolVersion),
    /// This chunk decided the version.
    Detected { version: ProtocolVersion, expected: ProtocolVersion },
    /// The chunk does not start with a known marker; detection stays pending.
    Unrecognized(u8),
    /// Nothing to inspect.
    Empty,
}

/// Decides once which protocol generation a session speaks.
#[derive(Debug, Clone, Default)]
pub struct ProtocolDetector {
    expected: Option<ProtocolVersion>,
    detected: Option<ProtocolVersion>,
}

impl ProtocolDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the firmware expectation. Firmware older than 3.0 speaks V1, which has no
    /// marker to wait for, so the version is decided immediately.
    pub fn set_firmware(&mut self, firmware: FirmwareVersion) {
        let expected = ProtocolVersion::for_firmware(firmware);
        self.expected = Some(expected);
        if expected == ProtocolVersion::V1 && self.detected.is_none() {
            self.detected = Some(ProtocolVersion::V1);
        }
    }

    pub fn expected(&self) -> Option<ProtocolVersion> {
        self.expected
    }

    pub fn detected(&self) -> Option<ProtocolVersion> {
        self.detected
    }

    /// Version used to frame outbound payloads.
    pub fn outbound(&self) -> Option<ProtocolVersion> {
        self.detected.or(self.expected)
    }

    /// Inspect the first byte of a chunk. Must only be called once firmware is known.
    pub fn observe(&mut self, chunk: &[u8]) -> Detection {
        if let Some(version) = self.detected {
            return Detection::Decided(version);
        }
        let Some(&marker) = chunk.first() else {
            return Detection::Empty;
        };
        match ProtocolVersion::from_marker(marker) {
            Some(version) => {
                self.detected = Some(version);
                Detection::Detected { version, expected: self.expected.unwrap_or(version) }
            }
            None => Detection::Unrecognized(marker),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn old_firmware_is_v1_without_inspection() {
        let mut detector = ProtocolDetector::new();
        detector.set_firmware(FirmwareVersion::new(2, 4, 0));
        assert_eq!(detector.observe(&[0x04, 0x10]), Detection::Decided(ProtocolVersion::V1));
    }

    #[test]
    fn marker_wins_over_firmware() {
        let mut detector = ProtocolDetector::new();
        detector.set_firmware(FirmwareVersion::new(3, 7, 1));
        assert_eq!(detector.outbound(), Some(ProtocolVersion::V3_1));
        assert_eq!(
            detector.observe(&[0x04, 0x10, 0x00]),
            Detection::Detected { version: ProtocolVersion::V4, expected: ProtocolVersion::V3_1 }
        );
        assert_eq!(detector.outbound(), Some(ProtocolVersion::V4));
    }

    #[test]
    fn detection_is_sticky() {
        let mut detector = ProtocolDetector::new();
        detector.set_firmware(FirmwareVersion::new(3, 6, 62));
        detector.observe(&[0x03]);
        assert_eq!(detector.observe(&[0x31]), Detection::Decided(ProtocolVersion::V3));
        detector.set_firmware(FirmwareVersion::new(4, 0, 0));
        assert_eq!(detector.detected(), Some(ProtocolVersion::V3));
    }

    #[test]
    fn unrecognized_marker_keeps_detection_pending() {
        let mut detector = ProtocolDetector::new();
        detector.set_firmware(FirmwareVersion::new(4, 2, 0));
        assert_eq!(detector.observe(&[0xAB, 0x00]), Detection::Unrecognized(0xAB));
        assert_eq!(detector.observe(&[]), Detection::Empty);
        assert_eq!(detector.detected(), None);
        assert!(matches!(detector.observe(&[0x04]), Detection::Detected { .. }));
    }
}
