//! Framed record payload parsing
//!
//! Payloads of framed protocols are `[timestamp][body]`: a `u32` of unix seconds on
//! V2 and a `u64` of unix milliseconds from V3 on. Body layouts are little-endian.

use tracing::trace;

use super::process::Process;
use super::timestamps::batch_timestamps;
use crate::protocol::ProtocolVersion;
use crate::types::{
    ActivityType, BodyPosition, DeviceModel, Exercise, GpsFix, Record, SyncState, WearState,
};
use crate::{Result, SdkError};

/// Accelerometer LSB per g (±8 g range).
const ACCEL_LSB_PER_G: f32 = 4096.0;
/// Gyroscope LSB per degree per second (±2000 dps range).
const GYRO_LSB_PER_DPS: f32 = 16.4;
/// Magnetometer microtesla per LSB.
const MAG_UT_PER_LSB: f32 = 0.15;
/// Q14 fixed point.
const QUATERNION_ONE: f32 = 16384.0;
/// Full scale of the 24-bit ECG front-end.
const ECG_ADC_FULL_SCALE: f32 = 8_388_607.0;
/// ECG reference voltage in millivolts.
const ECG_VREF_MV: f32 = 2420.0;

/// Millivolts per ECG LSB for a device family.
pub fn ecg_scale(model: DeviceModel) -> f32 {
    let gain = match model {
        DeviceModel::Aidlab => 6.0,
        DeviceModel::AidmedOne => 12.0,
    };
    ECG_VREF_MV / ECG_ADC_FULL_SCALE / gain
}

/// Bounds-checked little-endian reader over a record body.
pub(crate) struct BodyReader<'a> {
    process: &'static str,
    data: &'a [u8],
    pos: usize,
}

impl<'a> BodyReader<'a> {
    pub(crate) fn new(process: &'static str, data: &'a [u8]) -> Self {
        Self { process, data, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.pos + len > self.data.len() {
            return Err(SdkError::malformed_record(
                self.process,
                format!(
                    "need {} bytes at offset {}, body has {}",
                    len,
                    self.pos,
                    self.data.len()
                ),
            ));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub(crate) fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn i8(&mut self) -> Result<i8> {
        Ok(self.take(1)?[0] as i8)
    }

    pub(crate) fn u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub(crate) fn i16(&mut self) -> Result<i16> {
        let b = self.take(2)?;
        Ok(i16::from_le_bytes([b[0], b[1]]))
    }

    pub(crate) fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn i32(&mut self) -> Result<i32> {
        Ok(self.u32()? as i32)
    }

    pub(crate) fn u64(&mut self) -> Result<u64> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
    }

    pub(crate) fn f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.u32()?))
    }

    /// Split the rest of the body into `width`-byte samples.
    pub(crate) fn samples(&mut self, width: usize) -> Result<std::slice::ChunksExact<'a, u8>> {
        let rest = self.remaining();
        if rest.len() % width != 0 {
            return Err(SdkError::malformed_record(
                self.process,
                format!("batch of {} bytes is not a multiple of {}", rest.len(), width),
            ));
        }
        self.pos = self.data.len();
        Ok(rest.chunks_exact(width))
    }
}

/// Sign-extend a 24-bit little-endian sample.
pub(crate) fn i24_le(bytes: &[u8]) -> i32 {
    (i32::from_le_bytes([0, bytes[0], bytes[1], bytes[2]])) >> 8
}

/// Split a framed payload into its base timestamp (ms) and body.
pub fn split_timestamp(version: ProtocolVersion, payload: &[u8]) -> Result<(u64, &[u8])> {
    let mut reader = BodyReader::new("timestamp", payload);
    let timestamp_ms = match version.timestamp_len() {
        4 => u64::from(reader.u32()?) * 1000,
        8 => reader.u64()?,
        _ => {
            return Err(SdkError::invalid_state(format!("{version} payloads carry no timestamp")));
        }
    };
    Ok((timestamp_ms, reader.remaining()))
}

/// Decode the typed records of one framed payload.
///
/// ECG values are scaled to millivolts but not filtered; filtration is per-stream state
/// owned by the session.
pub fn parse_payload(
    process: Process,
    version: ProtocolVersion,
    payload: &[u8],
    model: DeviceModel,
) -> Result<Vec<Record>> {
    let (timestamp_ms, body) = split_timestamp(version, payload)?;
    let records = parse_body(process, version, timestamp_ms, body, model)?;
    trace!(%process, %version, timestamp_ms, count = records.len(), "Parsed payload");
    Ok(records)
}

fn parse_body(
    process: Process,
    version: ProtocolVersion,
    ts: u64,
    body: &[u8],
    model: DeviceModel,
) -> Result<Vec<Record>> {
    let name = process.name();
    let mut r = BodyReader::new(name, body);

    let records = match process {
        Process::Ecg | Process::Respiration => {
            let samples = r.samples(3)?;
            let interval = process.sample_interval_ms().unwrap_or(0);
            let scale = if process == Process::Ecg { ecg_scale(model) } else { 1.0 };
            let count = samples.len();
            samples
                .zip(batch_timestamps(ts, interval, count))
                .map(|(bytes, timestamp_ms)| {
                    let value = i24_le(bytes) as f32 * scale;
                    if process == Process::Ecg {
                        Record::Ecg { timestamp_ms, value }
                    } else {
                        Record::Respiration { timestamp_ms, value }
                    }
                })
                .collect()
        }
        Process::SkinTemperature => {
            vec![Record::SkinTemperature { timestamp_ms: ts, celsius: f32::from(r.i16()?) / 100.0 }]
        }
        Process::Motion => motion_records(ts, &mut r)?,
        Process::Orientation => vec![Record::Orientation {
            timestamp_ms: ts,
            roll: f32::from(r.i16()?) / 100.0,
            pitch: f32::from(r.i16()?) / 100.0,
            yaw: f32::from(r.i16()?) / 100.0,
        }],
        Process::Quaternion => vec![Record::Quaternion {
            timestamp_ms: ts,
            w: f32::from(r.i16()?) / QUATERNION_ONE,
            x: f32::from(r.i16()?) / QUATERNION_ONE,
            y: f32::from(r.i16()?) / QUATERNION_ONE,
            z: f32::from(r.i16()?) / QUATERNION_ONE,
        }],
        Process::BodyPosition => vec![Record::BodyPosition {
            timestamp_ms: ts,
            position: BodyPosition::from_raw(r.u8()?),
        }],
        Process::Battery => vec![Record::Battery { level: r.u8()? }],
        Process::Activity => vec![Record::Activity {
            timestamp_ms: ts,
            activity: ActivityType::from_raw(r.u8()?),
        }],
        Process::Steps => vec![Record::Steps { timestamp_ms: ts, steps: u64::from(r.u32()?) }],
        Process::RespirationRate => {
            vec![Record::RespirationRate { timestamp_ms: ts, rate: u32::from(r.u16()?) }]
        }
        Process::WearState => vec![Record::WearState { state: WearState::from_raw(r.u8()?) }],
        Process::HeartRate => {
            let bpm = i32::from(r.u8()?);
            let mut records = vec![Record::HeartRate { timestamp_ms: ts, bpm }];
            for rr in r.samples(2)? {
                let interval_ms = i32::from(u16::from_le_bytes([rr[0], rr[1]]));
                records.push(Record::Rr { timestamp_ms: ts, interval_ms });
            }
            records
        }
        Process::SoundVolume => vec![Record::SoundVolume { timestamp_ms: ts, volume: r.u16()? }],
        Process::Exercise => vec![Record::Exercise { exercise: Exercise::from_raw(r.i8()?) }],
        Process::UserEvent => vec![Record::UserEvent { timestamp_ms: ts }],
        Process::Pressure => {
            let values = if version.has_pressure_array() {
                let values: Vec<i32> = r
                    .samples(4)?
                    .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                    .collect();
                if values.is_empty() {
                    return Err(SdkError::malformed_record(name, "empty pressure batch"));
                }
                values
            } else {
                vec![r.i32()?]
            };
            vec![Record::Pressure { timestamp_ms: ts, values }]
        }
        Process::PressureWearState => {
            vec![Record::PressureWearState { state: WearState::from_raw(r.u8()?) }]
        }
        Process::SignalQuality => {
            vec![Record::SignalQuality { timestamp_ms: ts, quality: r.u8()? }]
        }
        Process::Eda => vec![Record::Eda { timestamp_ms: ts, conductance: r.f32()? }],
        Process::Gps => {
            let fix = GpsFix {
                latitude: r.f32()?,
                longitude: r.f32()?,
                altitude: r.f32()?,
                speed: r.f32()?,
                heading: r.f32()?,
                hdop: r.f32()?,
            };
            vec![Record::Gps { timestamp_ms: ts, fix }]
        }
        Process::SoundFeatures => {
            let features =
                r.samples(4)?.map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])).collect();
            vec![Record::SoundFeatures { timestamp_ms: ts, features }]
        }
        Process::SyncState => vec![Record::SyncState { state: SyncState::from_raw(r.u8()?) }],
        Process::UnsynchronizedSize => vec![Record::UnsynchronizedSize {
            bytes: r.u32()?,
            bytes_per_second: r.f32()?,
        }],
    };

    Ok(records)
}

/// Accelerometer, gyroscope and magnetometer triples from a 9 × i16 body.
pub(crate) fn motion_records(ts: u64, r: &mut BodyReader<'_>) -> Result<Vec<Record>> {
    let mut axes = [0f32; 9];
    for axis in axes.iter_mut() {
        *axis = f32::from(r.i16()?);
    }
    Ok(vec![
        Record::Accelerometer {
            timestamp_ms: ts,
            x: axes[0] / ACCEL_LSB_PER_G,
            y: axes[1] / ACCEL_LSB_PER_G,
            z: axes[2] / ACCEL_LSB_PER_G,
        },
        Record::Gyroscope {
            timestamp_ms: ts,
            x: axes[3] / GYRO_LSB_PER_DPS,
            y: axes[4] / GYRO_LSB_PER_DPS,
            z: axes[5] / GYRO_LSB_PER_DPS,
        },
        Record::Magnetometer {
            timestamp_ms: ts,
            x: axes[6] * MAG_UT_PER_LSB,
            y: axes[7] * MAG_UT_PER_LSB,
            z: axes[8] * MAG_UT_PER_LSB,
        },
    ])
}
