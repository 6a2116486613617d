// src/config.rs

//! Aggregate configuration for the whole flight-control core.

use crate::altitude::AltitudeHoldConfig;
use crate::governor::GovernorConfig;
use crate::mixer::MixerConfig;
use crate::pid::PidGains;
use crate::telemetry::TelemetryConfig;
use crate::{Error, Result, StabilizerConfig};

/// Configuration for every component of the flight-control core.
///
/// # Example
///
/// ```
/// use free_flight_control::FlightControlConfig;
///
/// let mut config = FlightControlConfig::new();
/// config.governor.strict_safety = false;
/// config.slew_rate = 5.0;
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightControlConfig {
    /// Angle and rate loops.
    pub stabilizer: StabilizerConfig,
    /// Altitude-hold loop.
    pub altitude: AltitudeHoldConfig,
    /// Motor mixer.
    pub mixer: MixerConfig,
    /// Command freshness and failsafe.
    pub governor: GovernorConfig,
    /// Telemetry cadence.
    pub telemetry: TelemetryConfig,
    /// Maximum change of a motor percentage per second.
    pub slew_rate: f32,
}

impl FlightControlConfig {
    /// Creates a configuration with the flight-tested defaults.
    pub fn new() -> Self {
        Self {
            stabilizer: StabilizerConfig::new(),
            altitude: AltitudeHoldConfig::new(),
            mixer: MixerConfig::new(),
            governor: GovernorConfig::new(),
            telemetry: TelemetryConfig::new(),
            slew_rate: 10.0,
        }
    }

    /// Checks that every bound is positive and every gain is finite.
    ///
    /// The error names the first offending field.
    pub fn validate(&self) -> Result<()> {
        let stabilizer = &self.stabilizer;
        check_gains(&stabilizer.roll_rate, "stabilizer.roll_rate")?;
        check_gains(&stabilizer.pitch_rate, "stabilizer.pitch_rate")?;
        check_gains(&stabilizer.yaw_rate, "stabilizer.yaw_rate")?;
        check_finite(stabilizer.kp_roll, "stabilizer.kp_roll")?;
        check_finite(stabilizer.kp_pitch, "stabilizer.kp_pitch")?;
        check_finite(stabilizer.kp_yaw, "stabilizer.kp_yaw")?;
        check_positive(stabilizer.rate_output_limit, "stabilizer.rate_output_limit")?;
        check_positive(stabilizer.max_roll_pitch_rate, "stabilizer.max_roll_pitch_rate")?;
        check_positive(stabilizer.max_yaw_rate, "stabilizer.max_yaw_rate")?;
        check_positive(stabilizer.max_roll_pitch_torque, "stabilizer.max_roll_pitch_torque")?;
        check_positive(stabilizer.max_yaw_torque, "stabilizer.max_yaw_torque")?;

        check_gains(&self.altitude.gains, "altitude.gains")?;
        check_positive(self.altitude.output_limit, "altitude.output_limit")?;
        check_positive(self.altitude.motor_force, "altitude.motor_force")?;

        check_positive(self.mixer.motor_force, "mixer.motor_force")?;
        check_positive(self.mixer.ideal_voltage, "mixer.ideal_voltage")?;
        check_positive(self.mixer.min_battery_voltage, "mixer.min_battery_voltage")?;

        if self.governor.command_timeout_ms == 0 {
            return Err(Error::InvalidConfig("governor.command_timeout_ms"));
        }
        if !(self.governor.throttle_decay.is_finite() && self.governor.throttle_decay >= 0.0) {
            return Err(Error::InvalidConfig("governor.throttle_decay"));
        }

        check_positive(self.slew_rate, "slew_rate")
    }
}

impl Default for FlightControlConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn check_finite(value: f32, field: &'static str) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidConfig(field))
    }
}

fn check_positive(value: f32, field: &'static str) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(field))
    }
}

fn check_gains(gains: &PidGains<f32>, field: &'static str) -> Result<()> {
    gains.validate().map_err(|_| Error::InvalidConfig(field))
}
