// src/mixer.rs

//! # Motor Mixer
//!
//! Maps thrust and body torques onto the four motors of an X-configuration
//! quadcopter, compensates for battery sag, and clamps each channel.
//!
//! ```text
//!          FRONT
//!            x
//!            ^
//!            |
//!      1           2
//!        \   |   /
//!   <- y    |||
//!        /   |   \
//!      4           3
//! ```

use nalgebra::{Matrix3, Vector3, Vector4};

/// Per-motor contribution of collective thrust.
pub const THRUST_ACTION: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
/// Per-motor contribution of a positive roll torque.
pub const ROLL_ACTION: [f32; 4] = [1.0, -1.0, -1.0, 1.0];
/// Per-motor contribution of a positive pitch torque.
pub const PITCH_ACTION: [f32; 4] = [-1.0, -1.0, 1.0, 1.0];
/// Per-motor contribution of a positive yaw torque.
pub const YAW_ACTION: [f32; 4] = [1.0, -1.0, 1.0, -1.0];

/// Configuration for the motor mixer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixerConfig {
    /// Empirical scale from torque units to motor percentage.
    pub motor_force: f32,
    /// Battery voltage at which the mix is used unscaled.
    pub ideal_voltage: f32,
    /// Readings at or below this are treated as a disconnected battery.
    pub min_battery_voltage: f32,
}

impl MixerConfig {
    /// Creates a configuration for a 3S pack.
    pub fn new() -> Self {
        Self {
            motor_force: 680.0,
            ideal_voltage: 12.4,
            min_battery_voltage: 10.0,
        }
    }
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Combines thrust and torques into the unclamped motor mix, battery
/// compensation included.
///
/// No thrust is added when the vehicle is upside down.
pub fn allocate(
    torques: &Vector3<f32>,
    orientation: &Matrix3<f32>,
    throttle: f32,
    battery: f32,
    config: &MixerConfig,
) -> Vector4<f32> {
    let mut mix = Vector4::zeros();
    if orientation[(2, 2)] > 0.0 {
        mix += Vector4::from(THRUST_ACTION) * throttle;
    }
    mix += Vector4::from(ROLL_ACTION) * (torques.x / config.motor_force);
    mix += Vector4::from(PITCH_ACTION) * (torques.y / config.motor_force);
    mix += Vector4::from(YAW_ACTION) * (torques.z / config.motor_force);

    if battery > config.min_battery_voltage {
        let ratio = config.ideal_voltage / battery;
        mix *= ratio * ratio;
    }
    mix
}

/// Mixes thrust and torques into four motor percentages in `[0, 1]`.
pub fn mix(
    torques: &Vector3<f32>,
    orientation: &Matrix3<f32>,
    throttle: f32,
    battery: f32,
    config: &MixerConfig,
) -> Vector4<f32> {
    allocate(torques, orientation, throttle, battery, config).map(clamp_unit)
}

/// Clamps one motor percentage into `[0, 1]`. NaN maps to zero.
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
