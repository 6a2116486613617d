// src/packet.rs

//! # Command Packets
//!
//! Decoding of the inbound radio payloads. Every payload starts with a kind
//! byte; all multi-byte fields are little-endian.
//!
//! | Kind | Layout after the kind byte                                         |
//! |------|--------------------------------------------------------------------|
//! | 0    | `roll f32, pitch f32, yaw_delta f32, throttle f32, climb f32, mode u8` |
//! | 1    | `axis u8, kp f32, ki f32, kd f32, integral_limit f32, derivative_filter f32` |
//!
//! Encoding is provided for ground-side tooling and for tests.

use crate::pid::PidGains;
use crate::{Error, FlightMode, GainAxis, GainUpdate, Result};

/// Size of one radio payload.
pub const PAYLOAD_SIZE: usize = 32;

const CONTROL_KIND: u8 = 0;
const GAINS_KIND: u8 = 1;
const CONTROL_LEN: usize = 1 + 5 * 4 + 1;
const GAINS_LEN: usize = 1 + 1 + 5 * 4;

/// Pilot intent as sent by the ground station.
///
/// `yaw_delta` is relative to the heading recorded at arming.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlPacket {
    /// Roll angle setpoint, degrees.
    pub roll: f32,
    /// Pitch angle setpoint, degrees.
    pub pitch: f32,
    /// Yaw setpoint relative to the arming heading, degrees.
    pub yaw_delta: f32,
    /// Base throttle, motor percentage.
    pub throttle: f32,
    /// Climb rate demand for altitude hold.
    pub climb_rate: f32,
    /// Arm/mode selector.
    pub mode: FlightMode,
}

/// One decoded inbound packet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Packet {
    /// Pilot intent.
    Control(ControlPacket),
    /// Gain reconfiguration for one axis.
    Gains(GainUpdate),
}

impl Packet {
    /// Decodes one payload.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let kind = *bytes.first().ok_or(Error::PayloadTooShort {
            expected: 1,
            actual: 0,
        })?;
        match kind {
            CONTROL_KIND => {
                let mut reader = Reader::new(bytes, CONTROL_LEN)?;
                let roll = reader.f32("roll")?;
                let pitch = reader.f32("pitch")?;
                let yaw_delta = reader.f32("yaw_delta")?;
                let throttle = reader.f32("throttle")?;
                let climb_rate = reader.f32("climb_rate")?;
                let mode = mode_from_wire(reader.u8())?;
                Ok(Packet::Control(ControlPacket {
                    roll,
                    pitch,
                    yaw_delta,
                    throttle,
                    climb_rate,
                    mode,
                }))
            }
            GAINS_KIND => {
                let mut reader = Reader::new(bytes, GAINS_LEN)?;
                let axis = axis_from_wire(reader.u8())?;
                let gains = PidGains::new(
                    reader.f32("kp")?,
                    reader.f32("ki")?,
                    reader.f32("kd")?,
                    reader.f32("integral_limit")?,
                    reader.f32("derivative_filter")?,
                );
                gains.validate()?;
                Ok(Packet::Gains(GainUpdate { axis, gains }))
            }
            other => Err(Error::UnknownPacketKind(other)),
        }
    }

    /// Encodes the packet into `buf` and returns the number of bytes written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        match self {
            Packet::Control(control) => {
                let mut writer = Writer::new(buf, CONTROL_LEN)?;
                writer.u8(CONTROL_KIND);
                writer.f32(control.roll);
                writer.f32(control.pitch);
                writer.f32(control.yaw_delta);
                writer.f32(control.throttle);
                writer.f32(control.climb_rate);
                writer.u8(mode_to_wire(control.mode));
                Ok(writer.finish())
            }
            Packet::Gains(update) => {
                let mut writer = Writer::new(buf, GAINS_LEN)?;
                writer.u8(GAINS_KIND);
                writer.u8(update.axis.index() as u8);
                writer.f32(update.gains.kp);
                writer.f32(update.gains.ki);
                writer.f32(update.gains.kd);
                writer.f32(update.gains.integral_limit);
                writer.f32(update.gains.derivative_filter);
                Ok(writer.finish())
            }
        }
    }
}

fn mode_from_wire(value: u8) -> Result<FlightMode> {
    match value {
        0 => Ok(FlightMode::Off),
        1 => Ok(FlightMode::Manual),
        2 => Ok(FlightMode::AltitudeHold),
        other => Err(Error::UnknownMode(other)),
    }
}

fn mode_to_wire(mode: FlightMode) -> u8 {
    match mode {
        FlightMode::Off => 0,
        FlightMode::Manual => 1,
        FlightMode::AltitudeHold => 2,
    }
}

fn axis_from_wire(value: u8) -> Result<GainAxis> {
    GainAxis::ALL
        .get(value as usize)
        .copied()
        .ok_or(Error::UnknownAxis(value))
}

/// Cursor over a payload whose length has been checked up front.
pub(crate) struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    /// Checks that `bytes` holds at least `len` bytes and skips the kind byte.
    pub(crate) fn new(bytes: &'a [u8], len: usize) -> Result<Self> {
        if bytes.len() < len {
            return Err(Error::PayloadTooShort {
                expected: len,
                actual: bytes.len(),
            });
        }
        Ok(Self { bytes, offset: 1 })
    }

    pub(crate) fn u8(&mut self) -> u8 {
        let value = self.bytes[self.offset];
        self.offset += 1;
        value
    }

    pub(crate) fn raw<const N: usize>(&mut self) -> [u8; N] {
        let mut raw = [0u8; N];
        raw.copy_from_slice(&self.bytes[self.offset..self.offset + N]);
        self.offset += N;
        raw
    }

    /// Reads a finite `f32`; `field` names it in the error.
    pub(crate) fn f32(&mut self, field: &'static str) -> Result<f32> {
        let value = f32::from_le_bytes(self.raw());
        if value.is_finite() {
            Ok(value)
        } else {
            Err(Error::NonFinite(field))
        }
    }
}

/// Cursor over an output buffer whose length has been checked up front.
pub(crate) struct Writer<'a> {
    buf: &'a mut [u8],
    offset: usize,
}

impl<'a> Writer<'a> {
    pub(crate) fn new(buf: &'a mut [u8], len: usize) -> Result<Self> {
        if buf.len() < len {
            return Err(Error::BufferTooSmall {
                needed: len,
                available: buf.len(),
            });
        }
        Ok(Self { buf, offset: 0 })
    }

    pub(crate) fn bytes(&mut self, bytes: &[u8]) {
        self.buf[self.offset..self.offset + bytes.len()].copy_from_slice(bytes);
        self.offset += bytes.len();
    }

    pub(crate) fn u8(&mut self, value: u8) {
        self.bytes(&[value]);
    }

    pub(crate) fn f32(&mut self, value: f32) {
        self.bytes(&value.to_le_bytes());
    }

    pub(crate) fn finish(self) -> usize {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control() -> ControlPacket {
        ControlPacket {
            roll: 5.0,
            pitch: -2.5,
            yaw_delta: 90.0,
            throttle: 0.45,
            climb_rate: 0.3,
            mode: FlightMode::AltitudeHold,
        }
    }

    #[test]
    fn test_control_packet_layout() {
        let mut buf = [0u8; PAYLOAD_SIZE];
        let len = Packet::Control(control()).encode(&mut buf).unwrap();
        assert_eq!(22, len);
        assert_eq!(0, buf[0]);
        assert_eq!(5.0f32.to_le_bytes(), buf[1..5]);
        assert_eq!(2, buf[21]);
        assert_eq!(Ok(Packet::Control(control())), Packet::decode(&buf));
    }

    #[test]
    fn test_gain_packet_decode() {
        let mut buf = [0u8; PAYLOAD_SIZE];
        buf[0] = 1;
        buf[1] = 3;
        for (i, value) in [1.0f32, 0.5, 0.01, 3.0, 0.33].iter().enumerate() {
            buf[2 + i * 4..6 + i * 4].copy_from_slice(&value.to_le_bytes());
        }
        let expected = GainUpdate {
            axis: GainAxis::Altitude,
            gains: PidGains::new(1.0, 0.5, 0.01, 3.0, 0.33),
        };
        assert_eq!(Ok(Packet::Gains(expected)), Packet::decode(&buf));
    }

    #[test]
    fn test_decode_rejects_bad_payloads() {
        assert_eq!(
            Err(Error::PayloadTooShort {
                expected: 1,
                actual: 0
            }),
            Packet::decode(&[])
        );
        assert_eq!(
            Err(Error::PayloadTooShort {
                expected: 22,
                actual: 5
            }),
            Packet::decode(&[0, 0, 0, 0, 0])
        );
        assert_eq!(Err(Error::UnknownPacketKind(9)), Packet::decode(&[9; 32]));

        let mut buf = [0u8; PAYLOAD_SIZE];
        buf[0] = 1;
        buf[1] = 4;
        assert_eq!(Err(Error::UnknownAxis(4)), Packet::decode(&buf));

        let mut buf = [0u8; PAYLOAD_SIZE];
        buf[21] = 3;
        assert_eq!(Err(Error::UnknownMode(3)), Packet::decode(&buf));

        let mut buf = [0u8; PAYLOAD_SIZE];
        buf[13..17].copy_from_slice(&f32::NAN.to_le_bytes());
        assert_eq!(Err(Error::NonFinite("throttle")), Packet::decode(&buf));
    }

    /// Gains that would destabilize a loop never leave the decoder.
    #[test]
    fn test_gain_packet_rejects_out_of_range_gains() {
        let encode = |gains| {
            let mut buf = [0u8; PAYLOAD_SIZE];
            let update = GainUpdate {
                axis: GainAxis::RollRate,
                gains,
            };
            Packet::Gains(update).encode(&mut buf).unwrap();
            buf
        };

        let buf = encode(PidGains::new(1.0, 0.5, 0.01, 3.0, 3.0));
        assert_eq!(
            Err(Error::InvalidGains("derivative_filter")),
            Packet::decode(&buf)
        );
        let buf = encode(PidGains::new(1.0, 0.5, 0.01, -1.0, 0.33));
        assert_eq!(
            Err(Error::InvalidGains("integral_limit")),
            Packet::decode(&buf)
        );
        let buf = encode(PidGains::new(1.0, 0.5, 0.01, 0.0, 1.0));
        assert!(Packet::decode(&buf).is_ok(), "Bounds are inclusive.");
    }

    #[test]
    fn test_encode_rejects_short_buffer() {
        let mut buf = [0u8; 10];
        assert_eq!(
            Err(Error::BufferTooSmall {
                needed: 22,
                available: 10
            }),
            Packet::Control(control()).encode(&mut buf)
        );
    }
}
