// src/stabilizer/flight_stabilizer.rs

//! A module specifying the shared interface for PID-based flight stabilizers.
//! It includes the numeric trait used by the PID layer, the configuration
//! for the cascaded attitude/rate loops, and a trait defining the
//! stabilization step.

use crate::pid::PidGains;
use num_traits::Zero;
use piddiy::Number as PiddiyNumber;

/// Custom trait to encapsulate base number requirements.
pub trait Number: PiddiyNumber {
    /// Clamps generic PartialOrd values within a given range.
    fn clamp(self, min: Self, max: Self) -> Self {
        if self < min {
            min
        } else if max < self {
            max
        } else {
            self
        }
    }

    /// `false` for NaN and infinities. Fixed-point values are always finite.
    fn is_finite_value(self) -> bool {
        (self - self).is_zero()
    }
}

impl<T: PiddiyNumber> Number for T {}

/// Configuration for the cascaded attitude/rate stabilizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilizerConfig {
    /// Gains for the roll-rate loop.
    pub roll_rate: PidGains<f32>,
    /// Gains for the pitch-rate loop.
    pub pitch_rate: PidGains<f32>,
    /// Gains for the yaw-rate loop.
    pub yaw_rate: PidGains<f32>,
    /// Fixed output ceiling of each rate PID.
    pub rate_output_limit: f32,
    /// Outer-loop proportional gain from roll error to roll rate.
    pub kp_roll: f32,
    /// Outer-loop proportional gain from pitch error to pitch rate.
    pub kp_pitch: f32,
    /// Outer-loop proportional gain from yaw error to yaw rate.
    pub kp_yaw: f32,
    /// Bound on the desired roll and pitch rates, degrees per second.
    pub max_roll_pitch_rate: f32,
    /// Bound on the desired yaw rate, degrees per second.
    pub max_yaw_rate: f32,
    /// Bound on the roll and pitch torque demands.
    pub max_roll_pitch_torque: f32,
    /// Bound on the yaw torque demand.
    pub max_yaw_torque: f32,
}

impl StabilizerConfig {
    /// Creates a configuration with the flight-tested defaults.
    ///
    /// With a linear plant the outer gain gives a time constant of `1 / kp`.
    ///
    /// Example Usage
    /// ```
    /// use free_flight_control::stabilizer::{CascadeStabilizer, StabilizerConfig};
    ///
    /// let mut config = StabilizerConfig::new();
    ///
    /// // Soften the roll loop.
    /// config.roll_rate.kp = 0.6;
    /// config.kp_roll = 2.0;
    ///
    /// let stabilizer = CascadeStabilizer::with_config(config);
    /// ```
    pub fn new() -> Self {
        Self {
            roll_rate: PidGains::new(0.8, 3.0, 0.03, 3.0, 0.3),
            pitch_rate: PidGains::new(0.8, 3.0, 0.03, 3.0, 0.3),
            yaw_rate: PidGains::new(0.8, 3.0, 0.02, 3.0, 0.33),
            rate_output_limit: 40.0,
            kp_roll: 3.0,
            kp_pitch: 3.0,
            kp_yaw: 0.1,
            max_roll_pitch_rate: 150.0,
            max_yaw_rate: 90.0,
            max_roll_pitch_torque: 60.0,
            max_yaw_torque: 30.0,
        }
    }
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A trait for PID-based flight stabilizers that handle roll, pitch,
/// and yaw control based on attitude and gyro data and dt.
pub trait FlightStabilizer<T: Number> {
    /// Takes desired setpoints, current IMU attitude, and gyro rates, then computes the control outputs.
    ///
    /// - `set_point`: A tuple of (roll, pitch, yaw) desired angles.
    /// - `imu_attitude`: A tuple of (roll, pitch, yaw) current angles.
    /// - `gyro_rate`: A tuple of (roll rate, pitch rate, yaw rate) from the gyroscope.
    /// - `dt`: Time delta since the last update.
    ///
    /// Returns a tuple of (roll, pitch, yaw) torque demands.
    fn control(
        &mut self,
        set_point: (T, T, T),
        imu_attitude: (T, T, T),
        gyro_rate: (T, T, T),
        dt: T,
    ) -> (T, T, T);
}
