// src/types.rs

//! Data exchanged between the control core and its collaborators.
//!
//! All of these are small `Copy` values so that they can be handed between
//! the control task and the communication task by value, without borrowing
//! across a critical section.

use crate::angle::Attitude;
use crate::pid::PidGains;
use nalgebra::{Matrix3, Vector3, Vector4};

/// Arm/mode selector carried by every control packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlightMode {
    /// Motors off.
    #[default]
    Off,
    /// Armed, throttle taken directly from the command.
    Manual,
    /// Armed, throttle corrected by the altitude-hold loop.
    AltitudeHold,
}

impl FlightMode {
    /// Returns `true` for any armed mode.
    pub fn motors_on(self) -> bool {
        self != FlightMode::Off
    }

    /// Returns `true` when the altitude-hold loop should run.
    pub fn holds_altitude(self) -> bool {
        self == FlightMode::AltitudeHold
    }
}

/// Latest validated pilot or ground-station intent.
///
/// Angles are in degrees. `yaw` is absolute and already wrapped; the
/// governor builds it from the relative yaw carried by the packet.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Command {
    /// Roll angle setpoint.
    pub roll: f32,
    /// Pitch angle setpoint.
    pub pitch: f32,
    /// Absolute yaw setpoint.
    pub yaw: f32,
    /// Base throttle as a motor percentage.
    pub throttle: f32,
    /// Climb rate demand used while holding altitude.
    pub climb_rate: f32,
    /// Arm/mode selector.
    pub mode: FlightMode,
}

impl Command {
    /// A disarmed, level, zero-throttle command.
    pub const IDLE: Command = Command {
        roll: 0.0,
        pitch: 0.0,
        yaw: 0.0,
        throttle: 0.0,
        climb_rate: 0.0,
        mode: FlightMode::Off,
    };

    /// The attitude setpoint carried by this command.
    pub fn attitude(&self) -> Attitude {
        Attitude {
            roll: self.roll,
            pitch: self.pitch,
            yaw: self.yaw,
        }
    }
}

/// One sampled, pre-filtered sensor frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// Body rates in degrees per second (roll, pitch, yaw).
    pub gyro: Vector3<f32>,
    /// Accelerometer vector.
    pub acc: Vector3<f32>,
    /// Magnetometer vector.
    pub mag: Vector3<f32>,
    /// Altitude in metres.
    pub altitude: f32,
    /// Raw battery voltage.
    pub battery: f32,
    /// Seconds since the previous sample.
    pub dt: f32,
}

impl Default for Measurement {
    fn default() -> Self {
        Self {
            gyro: Vector3::zeros(),
            acc: Vector3::zeros(),
            mag: Vector3::zeros(),
            altitude: 0.0,
            battery: 0.0,
            dt: 0.0,
        }
    }
}

/// Attitude estimate as a body-to-world direction-cosine matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation(pub Matrix3<f32>);

impl Orientation {
    /// A level, right-side-up orientation facing the reference heading.
    pub fn level() -> Self {
        Self(Matrix3::identity())
    }

    /// Returns `true` when the body z axis points up.
    pub fn is_upright(&self) -> bool {
        self.0[(2, 2)] > 0.0
    }

    /// Resolves roll, pitch and yaw in degrees.
    pub fn attitude(&self) -> Attitude {
        Attitude::from_dcm(&self.0)
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::level()
    }
}

/// Timeout flags reported by the sensor and estimator collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SensorHealth {
    /// Gyro/accelerometer/magnetometer sampling timed out.
    pub imu_timed_out: bool,
    /// Altimeter sampling timed out.
    pub altitude_timed_out: bool,
    /// The attitude estimator has stopped producing fresh output.
    pub estimator_timed_out: bool,
}

impl SensorHealth {
    /// Returns `true` if any sensor flag is raised.
    pub fn any_fault(&self) -> bool {
        self.imu_timed_out || self.altitude_timed_out || self.estimator_timed_out
    }

    /// Returns `true` if the attitude source can no longer be trusted.
    pub fn attitude_lost(&self) -> bool {
        self.imu_timed_out || self.estimator_timed_out
    }
}

/// Four motor percentages in `[0, 1]`, numbered as in [`crate::mixer`].
pub type MotorCommand = Vector4<f32>;

/// Target of a gain reconfiguration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GainAxis {
    /// Roll-rate PID.
    RollRate,
    /// Pitch-rate PID.
    PitchRate,
    /// Yaw-rate PID.
    YawRate,
    /// Altitude PID.
    Altitude,
}

impl GainAxis {
    /// Every axis, in wire order.
    pub const ALL: [GainAxis; 4] = [
        GainAxis::RollRate,
        GainAxis::PitchRate,
        GainAxis::YawRate,
        GainAxis::Altitude,
    ];

    /// Position of the axis in per-axis tables and on the wire.
    pub fn index(self) -> usize {
        match self {
            GainAxis::RollRate => 0,
            GainAxis::PitchRate => 1,
            GainAxis::YawRate => 2,
            GainAxis::Altitude => 3,
        }
    }
}

/// A complete gain set for one axis, delivered once to the control task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainUpdate {
    /// Which PID to retune.
    pub axis: GainAxis,
    /// The replacement gains.
    pub gains: PidGains<f32>,
}
