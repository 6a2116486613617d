// src/telemetry.rs

//! # Telemetry
//!
//! Quantized downlink payloads. Physical values are scaled, rounded and
//! saturated into fixed-width integers:
//!
//! | Quantity         | Scale  | Integer | Step     |
//! |------------------|--------|---------|----------|
//! | Angle (degrees)  | 100    | `i16`   | 0.01°    |
//! | Motor percentage | 10000  | `u16`   | 0.0001   |
//! | Torque           | 100    | `i16`   | 0.01     |
//!
//! Frames start with a kind byte (0 state, 1 sensor) and are little-endian.

use crate::packet::{Reader, Writer};
use crate::shared::FlightSnapshot;
use crate::{Error, Result};
use num_traits::Float;

/// Degrees to integer scale.
pub const ANGLE_SCALE: f32 = 100.0;
/// Motor percentage to integer scale.
pub const MOTOR_SCALE: f32 = 10_000.0;
/// Torque to integer scale.
pub const TORQUE_SCALE: f32 = 100.0;

const STATE_KIND: u8 = 0;
const SENSOR_KIND: u8 = 1;
const STATE_LEN: usize = 1 + 4 + 3 * 2 + 4 * 2 + 3 * 2;
const SENSOR_LEN: usize = 1 + 2 * 4;

/// Configuration for the telemetry cadence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryConfig {
    /// Telemetry is only sent when a control packet arrived within this
    /// window; otherwise the link is left listening.
    pub listen_window_ms: u64,
    /// A sensor frame is added once more than this many control packets have
    /// arrived since the previous one.
    pub sensor_every: u32,
}

impl TelemetryConfig {
    /// Creates a configuration with the flight-tested defaults.
    pub fn new() -> Self {
        Self {
            listen_window_ms: 90,
            sensor_every: 50,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Quantizes an angle in degrees.
pub fn angle_to_int(degrees: f32) -> i16 {
    quantize_i16(degrees, ANGLE_SCALE)
}

/// Recovers an angle in degrees.
pub fn int_to_angle(value: i16) -> f32 {
    value as f32 / ANGLE_SCALE
}

/// Quantizes a motor percentage.
pub fn motor_to_int(percentage: f32) -> u16 {
    let scaled = Float::round(percentage * MOTOR_SCALE);
    if scaled.is_nan() {
        0
    } else {
        scaled.clamp(0.0, u16::MAX as f32) as u16
    }
}

/// Recovers a motor percentage.
pub fn int_to_motor(value: u16) -> f32 {
    value as f32 / MOTOR_SCALE
}

/// Quantizes a torque.
pub fn torque_to_int(torque: f32) -> i16 {
    quantize_i16(torque, TORQUE_SCALE)
}

/// Recovers a torque.
pub fn int_to_torque(value: i16) -> f32 {
    value as f32 / TORQUE_SCALE
}

fn quantize_i16(value: f32, scale: f32) -> i16 {
    let scaled = Float::round(value * scale);
    if scaled.is_nan() {
        0
    } else {
        scaled.clamp(i16::MIN as f32, i16::MAX as f32) as i16
    }
}

/// Attitude, motor and torque state, quantized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateTelemetry {
    /// Milliseconds since start.
    pub timestamp_ms: u32,
    /// Roll angle.
    pub roll: i16,
    /// Pitch angle.
    pub pitch: i16,
    /// Yaw relative to the arming heading.
    pub yaw: i16,
    /// Motor percentages.
    pub motors: [u16; 4],
    /// Roll, pitch and yaw torque demands.
    pub torques: [i16; 3],
}

impl StateTelemetry {
    /// Quantizes a control-task snapshot. Yaw is sent relative to
    /// `reference_yaw`.
    pub fn from_snapshot(snapshot: &FlightSnapshot, reference_yaw: f32, timestamp_ms: u32) -> Self {
        let attitude = snapshot.orientation.attitude();
        Self {
            timestamp_ms,
            roll: angle_to_int(attitude.roll),
            pitch: angle_to_int(attitude.pitch),
            yaw: angle_to_int(attitude.yaw_from(reference_yaw)),
            motors: core::array::from_fn(|i| motor_to_int(snapshot.motors[i])),
            torques: core::array::from_fn(|i| torque_to_int(snapshot.torques[i])),
        }
    }

    /// Encodes the frame into `buf` and returns the number of bytes written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let mut writer = Writer::new(buf, STATE_LEN)?;
        writer.u8(STATE_KIND);
        writer.bytes(&self.timestamp_ms.to_le_bytes());
        for angle in [self.roll, self.pitch, self.yaw] {
            writer.bytes(&angle.to_le_bytes());
        }
        for motor in self.motors {
            writer.bytes(&motor.to_le_bytes());
        }
        for torque in self.torques {
            writer.bytes(&torque.to_le_bytes());
        }
        Ok(writer.finish())
    }

    /// Decodes a frame produced by [`Self::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        check_kind(bytes, STATE_KIND)?;
        let mut reader = Reader::new(bytes, STATE_LEN)?;
        let timestamp_ms = u32::from_le_bytes(reader.raw());
        let roll = i16::from_le_bytes(reader.raw());
        let pitch = i16::from_le_bytes(reader.raw());
        let yaw = i16::from_le_bytes(reader.raw());
        let motors = core::array::from_fn(|_| u16::from_le_bytes(reader.raw()));
        let torques = core::array::from_fn(|_| i16::from_le_bytes(reader.raw()));
        Ok(Self {
            timestamp_ms,
            roll,
            pitch,
            yaw,
            motors,
            torques,
        })
    }
}

/// Altitude and battery voltage, sent at a lower rate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorTelemetry {
    /// Altitude in metres.
    pub altitude: f32,
    /// Raw battery voltage.
    pub battery: f32,
}

impl SensorTelemetry {
    /// Takes altitude and battery from a control-task snapshot.
    pub fn from_snapshot(snapshot: &FlightSnapshot) -> Self {
        Self {
            altitude: snapshot.measurement.altitude,
            battery: snapshot.measurement.battery,
        }
    }

    /// Encodes the frame into `buf` and returns the number of bytes written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let mut writer = Writer::new(buf, SENSOR_LEN)?;
        writer.u8(SENSOR_KIND);
        writer.f32(self.altitude);
        writer.f32(self.battery);
        Ok(writer.finish())
    }

    /// Decodes a frame produced by [`Self::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        check_kind(bytes, SENSOR_KIND)?;
        let mut reader = Reader::new(bytes, SENSOR_LEN)?;
        Ok(Self {
            altitude: reader.f32("altitude")?,
            battery: reader.f32("battery")?,
        })
    }
}

fn check_kind(bytes: &[u8], kind: u8) -> Result<()> {
    match bytes.first() {
        None => Err(Error::PayloadTooShort {
            expected: 1,
            actual: 0,
        }),
        Some(&found) if found == kind => Ok(()),
        Some(&found) => Err(Error::UnknownPacketKind(found)),
    }
}
