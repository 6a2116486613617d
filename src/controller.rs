// src/controller.rs

//! # Flight Controller
//!
//! Owns the full control state of the vehicle and runs one control cycle:
//! the cascaded stabilizer, the altitude-hold latch, the mixer and the slew
//! limiter, in that order.
//!
//! ## Overview
//!
//! The loops run every cycle whatever the mode. With the motors off the mix
//! target is zero, and the slew limiter ramps toward it, so arming and
//! disarming never step the motors. The kill switch and the strict-safety
//! override are immediate; [`crate::tasks::ControlTask`] handles them with
//! [`FlightController::stop_motors`].
//!
//! ## Usage
//!
//! ```
//! use free_flight_control::{Command, FlightControlConfig, FlightController, FlightMode};
//! use free_flight_control::{Measurement, Orientation};
//!
//! let mut controller = FlightController::with_config(&FlightControlConfig::new());
//! let command = Command {
//!     throttle: 0.5,
//!     mode: FlightMode::Manual,
//!     ..Command::IDLE
//! };
//! let measurement = Measurement {
//!     battery: 12.4,
//!     dt: 0.001,
//!     ..Measurement::default()
//! };
//!
//! let motors = controller.update(&command, &measurement, &Orientation::level());
//! assert!(motors.iter().all(|m| (0.0..=1.0).contains(m)));
//! ```

use crate::altitude::{AltitudeHold, AltitudeHoldState};
use crate::mixer::{self, MixerConfig};
use crate::slew::SlewLimiter;
use crate::stabilizer::{CascadeStabilizer, RateAxis};
use crate::{
    Command, FlightControlConfig, FlightStabilizer, GainAxis, GainUpdate, Measurement,
    MotorCommand, Orientation,
};
use log::info;
use nalgebra::{Vector3, Vector4};

/// Aggregate flight-control state: four PIDs, the altitude latch, the mixer
/// configuration and the last outputs.
pub struct FlightController {
    stabilizer: CascadeStabilizer,
    altitude_hold: AltitudeHold,
    mixer: MixerConfig,
    slew: SlewLimiter,
    throttle: f32,
}

impl FlightController {
    /// Creates a controller from a complete configuration.
    ///
    /// The configuration should have passed
    /// [`FlightControlConfig::validate`]. An unchecked one never panics but
    /// can fly badly.
    pub fn with_config(config: &FlightControlConfig) -> Self {
        Self {
            stabilizer: CascadeStabilizer::with_config(config.stabilizer),
            altitude_hold: AltitudeHold::with_config(config.altitude),
            mixer: config.mixer,
            slew: SlewLimiter::new(config.slew_rate),
            throttle: 0.0,
        }
    }

    /// Creates a controller with the default configuration.
    pub fn new() -> Self {
        Self::with_config(&FlightControlConfig::new())
    }

    /// Runs one control cycle and returns the slew-limited motor percentages.
    pub fn update(
        &mut self,
        command: &Command,
        measurement: &Measurement,
        orientation: &Orientation,
    ) -> MotorCommand {
        let dt = measurement.dt;
        let attitude = orientation.attitude();

        let gyro = measurement.gyro;
        let (roll, pitch, yaw) = self.stabilizer.control(
            (command.roll, command.pitch, command.yaw),
            (attitude.roll, attitude.pitch, attitude.yaw),
            (gyro.x, gyro.y, gyro.z),
            dt,
        );
        let torques = Vector3::new(roll, pitch, yaw);

        let correction = self.altitude_hold.update(
            command.mode.holds_altitude(),
            command.climb_rate,
            measurement.altitude,
            dt,
        );
        self.throttle = command.throttle + correction;

        let target = if command.mode.motors_on() {
            mixer::mix(
                &torques,
                &orientation.0,
                self.throttle,
                measurement.battery,
                &self.mixer,
            )
        } else {
            Vector4::zeros()
        };
        self.slew.apply(&target, dt)
    }

    /// Drops the held motor output to zero without ramping.
    pub fn stop_motors(&mut self) {
        self.slew.reset();
    }

    /// Replaces the gains of one PID.
    pub fn apply_gains(&mut self, update: GainUpdate) {
        info!("applying {:?} gains {:?}", update.axis, update.gains);
        match update.axis {
            GainAxis::RollRate => self.stabilizer.set_gains(RateAxis::Roll, update.gains),
            GainAxis::PitchRate => self.stabilizer.set_gains(RateAxis::Pitch, update.gains),
            GainAxis::YawRate => self.stabilizer.set_gains(RateAxis::Yaw, update.gains),
            GainAxis::Altitude => self.altitude_hold.set_gains(update.gains),
        }
    }

    /// Torque demands from the last cycle, after clamping.
    pub fn torques(&self) -> Vector3<f32> {
        self.stabilizer.torques()
    }

    /// Motor percentages from the last cycle.
    pub fn motors(&self) -> MotorCommand {
        self.slew.output()
    }

    /// Throttle handed to the mixer in the last cycle, altitude correction
    /// included.
    pub fn throttle(&self) -> f32 {
        self.throttle
    }

    /// State of the altitude latch.
    pub fn altitude_hold(&self) -> AltitudeHoldState {
        self.altitude_hold.state()
    }

    /// Read access to the cascaded stabilizer.
    pub fn stabilizer(&self) -> &CascadeStabilizer {
        &self.stabilizer
    }
}

impl Default for FlightController {
    fn default() -> Self {
        Self::new()
    }
}
