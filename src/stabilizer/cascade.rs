// src/stabilizer/cascade.rs

//! # Cascaded Angle/Rate Stabilizer
//!
//! An outer proportional loop turns the angle error on each axis into a
//! desired body rate. Three rate PIDs then turn the rate error into a torque
//! demand. Both stages are clamped per axis:
//!
//! | Axis  | Desired rate | Torque |
//! |-------|--------------|--------|
//! | Roll  | ±150 °/s     | ±60    |
//! | Pitch | ±150 °/s     | ±60    |
//! | Yaw   | ±90 °/s      | ±30    |
//!
//! The yaw error is wrapped before the outer gain is applied, so a heading
//! change across the ±180° seam takes the short way round.

use crate::angle::angle_difference;
use crate::pid::{AxisPid, PidGains};
use crate::{FlightStabilizer, Number, StabilizerConfig};
use nalgebra::Vector3;

/// Axis selector for rate-loop reconfiguration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateAxis {
    /// Roll-rate loop.
    Roll,
    /// Pitch-rate loop.
    Pitch,
    /// Yaw-rate loop.
    Yaw,
}

/// Struct representing the cascaded angle/rate stabilizer.
pub struct CascadeStabilizer {
    roll_rate_pid: AxisPid<f32>,
    pitch_rate_pid: AxisPid<f32>,
    yaw_rate_pid: AxisPid<f32>,
    config: StabilizerConfig,
    desired_rates: Vector3<f32>,
    torques: Vector3<f32>,
}

impl CascadeStabilizer {
    /// Creates a new stabilizer using the provided configuration.
    pub fn with_config(config: StabilizerConfig) -> Self {
        Self {
            roll_rate_pid: AxisPid::new(config.roll_rate, config.rate_output_limit, "roll"),
            pitch_rate_pid: AxisPid::new(config.pitch_rate, config.rate_output_limit, "pitch"),
            yaw_rate_pid: AxisPid::new(config.yaw_rate, config.rate_output_limit, "yaw"),
            config,
            desired_rates: Vector3::zeros(),
            torques: Vector3::zeros(),
        }
    }

    /// Creates a new stabilizer with default settings.
    pub fn new() -> Self {
        Self::with_config(StabilizerConfig::new())
    }

    /// Runs both loops for one cycle and returns the clamped torque demands.
    pub fn update(
        &mut self,
        set_point: (f32, f32, f32),
        imu_attitude: (f32, f32, f32),
        gyro_rate: Vector3<f32>,
        dt: f32,
    ) -> Vector3<f32> {
        let config = &self.config;
        let (set_point_roll, set_point_pitch, set_point_yaw) = set_point;
        let (imu_roll, imu_pitch, imu_yaw) = imu_attitude;

        // Outer loop
        let max_tilt_rate = config.max_roll_pitch_rate;
        let desired_rates = Vector3::new(
            limit(config.kp_roll * (set_point_roll - imu_roll), max_tilt_rate),
            limit(config.kp_pitch * (set_point_pitch - imu_pitch), max_tilt_rate),
            limit(
                config.kp_yaw * angle_difference(set_point_yaw, imu_yaw),
                config.max_yaw_rate,
            ),
        );

        // Inner loop
        let max_tilt_torque = config.max_roll_pitch_torque;
        let torques = Vector3::new(
            limit(
                self.roll_rate_pid.process(desired_rates.x, gyro_rate.x, dt),
                max_tilt_torque,
            ),
            limit(
                self.pitch_rate_pid.process(desired_rates.y, gyro_rate.y, dt),
                max_tilt_torque,
            ),
            limit(
                self.yaw_rate_pid.process(desired_rates.z, gyro_rate.z, dt),
                config.max_yaw_torque,
            ),
        );

        self.desired_rates = desired_rates;
        self.torques = torques;
        torques
    }

    /// Replaces the gains of one rate loop.
    pub fn set_gains(&mut self, axis: RateAxis, gains: PidGains<f32>) {
        self.pid_mut(axis).set_gains(gains);
    }

    /// Read access to one rate loop.
    pub fn pid(&self, axis: RateAxis) -> &AxisPid<f32> {
        match axis {
            RateAxis::Roll => &self.roll_rate_pid,
            RateAxis::Pitch => &self.pitch_rate_pid,
            RateAxis::Yaw => &self.yaw_rate_pid,
        }
    }

    fn pid_mut(&mut self, axis: RateAxis) -> &mut AxisPid<f32> {
        match axis {
            RateAxis::Roll => &mut self.roll_rate_pid,
            RateAxis::Pitch => &mut self.pitch_rate_pid,
            RateAxis::Yaw => &mut self.yaw_rate_pid,
        }
    }

    /// Desired body rates from the last cycle, after clamping.
    pub fn desired_rates(&self) -> Vector3<f32> {
        self.desired_rates
    }

    /// Torque demands from the last cycle, after clamping.
    pub fn torques(&self) -> Vector3<f32> {
        self.torques
    }
}

/// Symmetric clamp to `±bound`. Unlike `f32::clamp` it never panics on a
/// bad bound.
fn limit(value: f32, bound: f32) -> f32 {
    Number::clamp(value, -bound, bound)
}

impl Default for CascadeStabilizer {
    fn default() -> Self {
        Self::new()
    }
}

impl FlightStabilizer<f32> for CascadeStabilizer {
    fn control(
        &mut self,
        set_point: (f32, f32, f32),
        imu_attitude: (f32, f32, f32),
        gyro_rate: (f32, f32, f32),
        dt: f32,
    ) -> (f32, f32, f32) {
        let (gyro_roll, gyro_pitch, gyro_yaw) = gyro_rate;
        let torques = self.update(
            set_point,
            imu_attitude,
            Vector3::new(gyro_roll, gyro_pitch, gyro_yaw),
            dt,
        );
        (torques.x, torques.y, torques.z)
    }
}
