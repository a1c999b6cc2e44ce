//! Hardware and firmware revision handling

use serde::{Deserialize, Serialize};

use crate::{Result, SdkError};

/// Firmware revision as reported by the Device Information service (0x2A26).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FirmwareVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl FirmwareVersion {
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self { major, minor, patch }
    }

    /// Parse a raw revision buffer such as `b"3.7.69\0\0"`.
    ///
    /// Missing components default to zero and anything after the leading digits of a
    /// component is ignored, so `"4.1-rc2"` parses as `4.1.0`.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let text = revision_text(raw);
        let invalid = || SdkError::InvalidRevision { field: "firmware", value: text.clone() };

        let trimmed = text.strip_prefix(['v', 'V']).unwrap_or(&text);
        let mut parts = [0u16; 3];
        for (index, component) in trimmed.split('.').take(3).enumerate() {
            let digits: &str = {
                let end = component.find(|c: char| !c.is_ascii_digit()).unwrap_or(component.len());
                &component[..end]
            };
            if digits.is_empty() {
                if index == 0 {
                    return Err(invalid());
                }
                break;
            }
            parts[index] = digits.parse().map_err(|_| invalid())?;
            if digits.len() != component.len() {
                break;
            }
        }

        Ok(Self::new(parts[0], parts[1], parts[2]))
    }

    /// Firmware before 2.2.2 exposes an 18-byte command characteristic.
    pub fn has_short_commands(&self) -> bool {
        *self < FirmwareVersion::new(2, 2, 2)
    }

    /// Chunk size the device's command characteristic accepts.
    pub fn command_chunk_len(&self) -> usize {
        if self.has_short_commands() { 18 } else { 20 }
    }
}

impl std::fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Device family, which determines sensor front-end scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceModel {
    Aidlab,
    AidmedOne,
}

/// Hardware revision as reported by the Device Information service (0x2A27).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HardwareRevision {
    raw: String,
}

impl HardwareRevision {
    /// Parse a raw revision buffer. Empty revisions are rejected.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let text = revision_text(raw);
        if text.is_empty() {
            return Err(SdkError::InvalidRevision { field: "hardware", value: text });
        }
        Ok(Self { raw: text })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Aidmed One units report a revision mentioning "aidmed"; everything else is an Aidlab.
    pub fn model(&self) -> DeviceModel {
        if self.raw.to_ascii_lowercase().contains("aidmed") {
            DeviceModel::AidmedOne
        } else {
            DeviceModel::Aidlab
        }
    }
}

/// Strip NUL padding and surrounding whitespace from a fixed-size revision buffer.
fn revision_text(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn firmware_parses_padded_buffers() {
        let version = FirmwareVersion::parse(b"3.7.69\0\0\0\0").unwrap();
        assert_eq!(version, FirmwareVersion::new(3, 7, 69));
        assert_eq!(version.to_string(), "3.7.69");
    }

    #[test]
    fn firmware_defaults_missing_components() {
        assert_eq!(FirmwareVersion::parse(b"4").unwrap(), FirmwareVersion::new(4, 0, 0));
        assert_eq!(FirmwareVersion::parse(b"3.6").unwrap(), FirmwareVersion::new(3, 6, 0));
        assert_eq!(FirmwareVersion::parse(b"v4.1-rc2").unwrap(), FirmwareVersion::new(4, 1, 0));
    }

    #[test]
    fn firmware_rejects_garbage() {
        assert!(matches!(
            FirmwareVersion::parse(b"beta"),
            Err(SdkError::InvalidRevision { field: "firmware", .. })
        ));
        assert!(FirmwareVersion::parse(b"").is_err());
        assert!(FirmwareVersion::parse(b"99999.1.1").is_err());
    }

    #[test]
    fn firmware_ordering_is_numeric() {
        assert!(FirmwareVersion::new(3, 10, 0) > FirmwareVersion::new(3, 9, 99));
        assert_eq!(FirmwareVersion::new(2, 2, 1).command_chunk_len(), 18);
        assert_eq!(FirmwareVersion::new(2, 2, 2).command_chunk_len(), 20);
    }

    #[test]
    fn hardware_model_detection() {
        assert_eq!(HardwareRevision::parse(b"1.2.0\0").unwrap().model(), DeviceModel::Aidlab);
        assert_eq!(
            HardwareRevision::parse(b"Aidmed One 1.0").unwrap().model(),
            DeviceModel::AidmedOne
        );
        assert!(HardwareRevision::parse(b"\0\0\0").is_err());
    }
}
