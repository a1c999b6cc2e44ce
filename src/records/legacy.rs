//! Per-characteristic packages from firmware that predates framed transport.
//!
//! These packages carry no header and no timestamp. Batched samples are stamped from a
//! per-kind [`Timelines`] so consecutive notifications form one continuous series.
//! Two standard Bluetooth SIG formats are included: Heart Rate Measurement (0x2A37)
//! and Health Thermometer Temperature Measurement (0x2A1C).

use serde::{Deserialize, Serialize};

use super::parser::{BodyReader, ecg_scale, i24_le, motion_records};
use super::timestamps::{Timelines, batch_timestamps};
use crate::types::{ActivityType, DeviceModel, Record, RecordKind};
use crate::{Result, SdkError};

/// GATT characteristic a legacy package was notified on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Characteristic {
    Ecg,
    Respiration,
    Temperature,
    Motion,
    Steps,
    Activity,
    Orientation,
    SoundVolume,
    NasalCannula,
    SoundFeatures,
    Battery,
    /// Bluetooth SIG Heart Rate Measurement.
    HeartRateMeasurement,
    /// Bluetooth SIG Temperature Measurement.
    HealthThermometer,
}

impl Characteristic {
    /// Map a characteristic UUID as reported by the host BLE stack.
    pub fn from_uuid(uuid: &str) -> Option<Self> {
        let uuid = uuid.trim().to_ascii_uppercase();
        let characteristic = match uuid.as_str() {
            "45366E80-CF3A-11E1-9AB4-0002A5D5C51B" => Characteristic::Temperature,
            "46366E80-CF3A-11E1-9AB4-0002A5D5C51B" => Characteristic::Ecg,
            "47366E80-CF3A-11E1-9AB4-0002A5D5C51B" | "2A19" => Characteristic::Battery,
            "48366E80-CF3A-11E1-9AB4-0002A5D5C51B" => Characteristic::Respiration,
            "49366E80-CF3A-11E1-9AB4-0002A5D5C51B" => Characteristic::Motion,
            "52366E80-CF3A-11E1-9AB4-0002A5D5C51B" => Characteristic::SoundVolume,
            "53366E80-CF3A-11E1-9AB4-0002A5D5C51B" => Characteristic::NasalCannula,
            "54366E80-CF3A-11E1-9AB4-0002A5D5C51B" => Characteristic::SoundFeatures,
            "61366E80-CF3A-11E1-9AB4-0002A5D5C51B" => Characteristic::Activity,
            "62366E80-CF3A-11E1-9AB4-0002A5D5C51B" => Characteristic::Steps,
            "63366E80-CF3A-11E1-9AB4-0002A5D5C51B" => Characteristic::Orientation,
            "2A37" => Characteristic::HeartRateMeasurement,
            "2A1C" => Characteristic::HealthThermometer,
            _ => return None,
        };
        Some(characteristic)
    }

    fn name(self) -> &'static str {
        match self {
            Characteristic::Ecg => "Ecg",
            Characteristic::Respiration => "Respiration",
            Characteristic::Temperature => "Temperature",
            Characteristic::Motion => "Motion",
            Characteristic::Steps => "Steps",
            Characteristic::Activity => "Activity",
            Characteristic::Orientation => "Orientation",
            Characteristic::SoundVolume => "SoundVolume",
            Characteristic::NasalCannula => "NasalCannula",
            Characteristic::SoundFeatures => "SoundFeatures",
            Characteristic::Battery => "Battery",
            Characteristic::HeartRateMeasurement => "HeartRateMeasurement",
            Characteristic::HealthThermometer => "HealthThermometer",
        }
    }
}

/// Decode a legacy package, stamping it at `now_ms`.
pub fn parse_legacy(
    characteristic: Characteristic,
    data: &[u8],
    model: DeviceModel,
    now_ms: u64,
    timelines: &mut Timelines,
) -> Result<Vec<Record>> {
    let mut r = BodyReader::new(characteristic.name(), data);

    let records = match characteristic {
        Characteristic::Ecg | Characteristic::Respiration => {
            let (kind, interval, scale) = if characteristic == Characteristic::Ecg {
                (RecordKind::Ecg, 4, ecg_scale(model))
            } else {
                (RecordKind::Respiration, 40, 1.0)
            };
            let samples = r.samples(3)?;
            let count = samples.len();
            let base = timelines.next_base(kind, now_ms, interval, count);
            samples
                .zip(batch_timestamps(base, interval, count))
                .map(|(bytes, timestamp_ms)| {
                    let value = i24_le(bytes) as f32 * scale;
                    if kind == RecordKind::Ecg {
                        Record::Ecg { timestamp_ms, value }
                    } else {
                        Record::Respiration { timestamp_ms, value }
                    }
                })
                .collect()
        }
        Characteristic::Temperature => vec![Record::SkinTemperature {
            timestamp_ms: now_ms,
            celsius: f32::from(r.i16()?) / 100.0,
        }],
        Characteristic::Motion => motion_records(now_ms, &mut r)?,
        Characteristic::Steps => {
            vec![Record::Steps { timestamp_ms: now_ms, steps: u64::from(r.u32()?) }]
        }
        Characteristic::Activity => vec![Record::Activity {
            timestamp_ms: now_ms,
            activity: ActivityType::from_raw(r.u8()?),
        }],
        Characteristic::Orientation => vec![Record::Orientation {
            timestamp_ms: now_ms,
            roll: f32::from(r.i16()?) / 100.0,
            pitch: f32::from(r.i16()?) / 100.0,
            yaw: f32::from(r.i16()?) / 100.0,
        }],
        Characteristic::SoundVolume => {
            vec![Record::SoundVolume { timestamp_ms: now_ms, volume: r.u16()? }]
        }
        Characteristic::NasalCannula => {
            let values: Vec<i32> =
                r.samples(4)?.map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]])).collect();
            if values.is_empty() {
                return Err(SdkError::malformed_record("NasalCannula", "empty pressure batch"));
            }
            vec![Record::Pressure { timestamp_ms: now_ms, values }]
        }
        Characteristic::SoundFeatures => {
            let features =
                r.samples(4)?.map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])).collect();
            vec![Record::SoundFeatures { timestamp_ms: now_ms, features }]
        }
        Characteristic::Battery => vec![Record::Battery { level: r.u8()? }],
        Characteristic::HeartRateMeasurement => heart_rate_measurement(now_ms, &mut r)?,
        Characteristic::HealthThermometer => health_thermometer(now_ms, &mut r)?,
    };

    Ok(records)
}

const HRM_BPM_U16: u8 = 0x01;
const HRM_ENERGY_PRESENT: u8 = 0x08;
const HRM_RR_PRESENT: u8 = 0x10;

fn heart_rate_measurement(now_ms: u64, r: &mut BodyReader<'_>) -> Result<Vec<Record>> {
    let flags = r.u8()?;
    let bpm = if flags & HRM_BPM_U16 != 0 { i32::from(r.u16()?) } else { i32::from(r.u8()?) };
    if flags & HRM_ENERGY_PRESENT != 0 {
        r.u16()?;
    }

    let mut records = vec![Record::HeartRate { timestamp_ms: now_ms, bpm }];
    if flags & HRM_RR_PRESENT != 0 {
        for rr in r.samples(2)? {
            // 1/1024 s resolution.
            let raw = i32::from(u16::from_le_bytes([rr[0], rr[1]]));
            records.push(Record::Rr { timestamp_ms: now_ms, interval_ms: raw * 1000 / 1024 });
        }
    }
    Ok(records)
}

const HTM_FAHRENHEIT: u8 = 0x01;
/// IEEE-11073 FLOAT reserved mantissas: NaN, NRes, +INF, -INF, reserved.
const FLOAT_SPECIAL_MANTISSAS: [i32; 5] = [0x7F_FFFF, -0x80_0000, 0x7F_FFFE, -0x7F_FFFE, -0x7F_FFFF];

fn health_thermometer(now_ms: u64, r: &mut BodyReader<'_>) -> Result<Vec<Record>> {
    let flags = r.u8()?;
    let raw = r.u32()?;
    let mantissa = (raw << 8) as i32 >> 8;
    let exponent = (raw >> 24) as i8;
    if FLOAT_SPECIAL_MANTISSAS.contains(&mantissa) {
        return Err(SdkError::malformed_record(
            "HealthThermometer",
            format!("special FLOAT value {mantissa:#x}"),
        ));
    }
    let value = mantissa as f32 * 10f32.powi(i32::from(exponent));
    let celsius = if flags & HTM_FAHRENHEIT != 0 { (value - 32.0) * 5.0 / 9.0 } else { value };
    Ok(vec![Record::SkinTemperature { timestamp_ms: now_ms, celsius }])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(characteristic: Characteristic, data: &[u8], now_ms: u64) -> Result<Vec<Record>> {
        parse_legacy(characteristic, data, DeviceModel::Aidlab, now_ms, &mut Timelines::default())
    }

    #[test]
    fn uuids_map_to_characteristics() {
        assert_eq!(
            Characteristic::from_uuid("46366e80-cf3a-11e1-9ab4-0002a5d5c51b"),
            Some(Characteristic::Ecg)
        );
        assert_eq!(Characteristic::from_uuid("2A37"), Some(Characteristic::HeartRateMeasurement));
        assert_eq!(Characteristic::from_uuid("2a19"), Some(Characteristic::Battery));
        assert_eq!(Characteristic::from_uuid("180D"), None);
    }

    #[test]
    fn ecg_packages_continue_the_timeline() {
        let mut timelines = Timelines::default();
        let package = [0u8; 15];
        let first =
            parse_legacy(Characteristic::Ecg, &package, DeviceModel::Aidlab, 1_000, &mut timelines)
                .unwrap();
        let second =
            parse_legacy(Characteristic::Ecg, &package, DeviceModel::Aidlab, 1_001, &mut timelines)
                .unwrap();
        let stamps: Vec<_> = first.iter().chain(&second).filter_map(Record::timestamp_ms).collect();
        assert_eq!(stamps, (0..10).map(|i| 1_000 + 4 * i).collect::<Vec<_>>());
    }

    #[test]
    fn hrm_with_u8_bpm_and_rr() {
        let data = [HRM_RR_PRESENT, 65, 0x00, 0x04, 0x00, 0x02];
        let records = parse(Characteristic::HeartRateMeasurement, &data, 5).unwrap();
        assert_eq!(
            records,
            vec![
                Record::HeartRate { timestamp_ms: 5, bpm: 65 },
                Record::Rr { timestamp_ms: 5, interval_ms: 1000 },
                Record::Rr { timestamp_ms: 5, interval_ms: 500 },
            ]
        );
    }

    #[test]
    fn hrm_with_u16_bpm_and_energy() {
        let data = [HRM_BPM_U16 | HRM_ENERGY_PRESENT | HRM_RR_PRESENT, 0x2C, 0x01, 0x10, 0x00, 0x00, 0x03];
        let records = parse(Characteristic::HeartRateMeasurement, &data, 0).unwrap();
        assert_eq!(records[0], Record::HeartRate { timestamp_ms: 0, bpm: 300 });
        assert_eq!(records[1], Record::Rr { timestamp_ms: 0, interval_ms: 750 });
    }

    #[test]
    fn thermometer_float_and_fahrenheit() {
        // 3650 × 10^-2 = 36.50 °C
        let mut data = vec![0x00];
        data.extend_from_slice(&(0xFE00_0E42u32).to_le_bytes());
        match parse(Characteristic::HealthThermometer, &data, 0).unwrap()[0] {
            Record::SkinTemperature { celsius, .. } => assert!((celsius - 36.5).abs() < 1e-4),
            ref other => panic!("Expected SkinTemperature, got {other:?}"),
        }

        // 986 × 10^-1 = 98.6 °F = 37 °C
        let mut data = vec![HTM_FAHRENHEIT];
        data.extend_from_slice(&(0xFF00_03DAu32).to_le_bytes());
        match parse(Characteristic::HealthThermometer, &data, 0).unwrap()[0] {
            Record::SkinTemperature { celsius, .. } => assert!((celsius - 37.0).abs() < 1e-3),
            ref other => panic!("Expected SkinTemperature, got {other:?}"),
        }

        let mut data = vec![0x00];
        data.extend_from_slice(&(0x007F_FFFFu32).to_le_bytes());
        assert!(parse(Characteristic::HealthThermometer, &data, 0).is_err());
    }

    #[test]
    fn nasal_cannula_is_a_pressure_array() {
        let mut data = Vec::new();
        for v in [1i32, 2, 3] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let records = parse(Characteristic::NasalCannula, &data, 9).unwrap();
        assert_eq!(records, vec![Record::Pressure { timestamp_ms: 9, values: vec![1, 2, 3] }]);
        assert!(parse(Characteristic::NasalCannula, &[], 9).is_err());
    }

    #[test]
    fn short_packages_are_malformed() {
        assert!(matches!(
            parse(Characteristic::Steps, &[1, 2], 0),
            Err(SdkError::MalformedRecord { .. })
        ));
        assert!(parse(Characteristic::Motion, &[0; 17], 0).is_err());
        assert_eq!(parse(Characteristic::Battery, &[90], 0).unwrap(), vec![Record::Battery { level: 90 }]);
    }
}
