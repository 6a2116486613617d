// src/altitude.rs

//! # Altitude Hold
//!
//! A two-state latch. Entering hold records the current altitude as the
//! reference; while holding, the commanded climb rate is integrated into the
//! reference and the altitude PID produces a throttle correction. Leaving
//! hold drops the reference, so the next entry latches afresh.

use crate::pid::{AxisPid, PidGains};
use log::debug;

/// Configuration for the altitude-hold loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AltitudeHoldConfig {
    /// Gains for the altitude PID.
    pub gains: PidGains<f32>,
    /// Fixed output ceiling of the altitude PID.
    pub output_limit: f32,
    /// Torque-to-percentage scale shared with the mixer.
    pub motor_force: f32,
}

impl AltitudeHoldConfig {
    /// Creates a configuration with the flight-tested defaults.
    pub fn new() -> Self {
        Self {
            gains: PidGains::new(1.0, 0.0, 0.01, 3.0, 0.33),
            output_limit: 20.0,
            motor_force: 680.0,
        }
    }
}

impl Default for AltitudeHoldConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// State of the altitude latch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AltitudeHoldState {
    /// No altitude hold.
    Free,
    /// Holding the carried reference altitude.
    Holding {
        /// Latched reference, moved by the commanded climb rate.
        reference: f32,
    },
}

/// Altitude-hold state machine driving the altitude PID.
pub struct AltitudeHold {
    state: AltitudeHoldState,
    pid: AxisPid<f32>,
    motor_force: f32,
}

impl AltitudeHold {
    /// Creates a free (not holding) latch.
    pub fn with_config(config: AltitudeHoldConfig) -> Self {
        Self {
            state: AltitudeHoldState::Free,
            pid: AxisPid::new(config.gains, config.output_limit, "alt"),
            motor_force: config.motor_force,
        }
    }

    /// Advances the latch one cycle and returns the throttle correction as a
    /// motor percentage. The correction is zero while free.
    pub fn update(&mut self, hold: bool, climb_rate: f32, altitude: f32, dt: f32) -> f32 {
        if !hold {
            if let AltitudeHoldState::Holding { reference } = self.state {
                debug!("altitude hold released at reference {}", reference);
            }
            self.state = AltitudeHoldState::Free;
            return 0.0;
        }

        let reference = match self.state {
            AltitudeHoldState::Free => {
                debug!("altitude hold latched at {}", altitude);
                altitude
            }
            AltitudeHoldState::Holding { reference } => reference,
        } + climb_rate * dt;
        // A non-finite sample never becomes the reference.
        if reference.is_finite() {
            self.state = AltitudeHoldState::Holding { reference };
        }

        self.pid.process(reference, altitude, dt) / self.motor_force
    }

    /// Replaces the altitude PID gains.
    pub fn set_gains(&mut self, gains: PidGains<f32>) {
        self.pid.set_gains(gains);
    }

    /// The current latch state.
    pub fn state(&self) -> AltitudeHoldState {
        self.state
    }

    /// The latched reference, if holding.
    pub fn reference(&self) -> Option<f32> {
        match self.state {
            AltitudeHoldState::Free => None,
            AltitudeHoldState::Holding { reference } => Some(reference),
        }
    }

    /// Read access to the altitude PID.
    pub fn pid(&self) -> &AxisPid<f32> {
        &self.pid
    }
}

impl Default for AltitudeHold {
    fn default() -> Self {
        Self::with_config(AltitudeHoldConfig::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_altitude_hold_starts_free() {
        let mut hold = AltitudeHold::default();
        assert_eq!(AltitudeHoldState::Free, hold.state());
        assert!(value_close(0.0, hold.update(false, 1.0, 10.0, 0.01)));
        assert_eq!(None, hold.reference());
    }

    /// Entering hold latches the current altitude; staying in hold with a
    /// zero climb rate keeps it, whatever the altitude does next.
    #[test]
    fn test_altitude_hold_latch_is_not_redone() {
        let mut hold = AltitudeHold::default();
        let _ = hold.update(true, 0.0, 12.5, 0.01);
        assert_eq!(Some(12.5), hold.reference());

        for altitude in [12.0, 13.0, 11.0, 15.0] {
            let _ = hold.update(true, 0.0, altitude, 0.01);
            assert_eq!(Some(12.5), hold.reference());
        }
    }

    /// A NaN altitude neither latches nor moves the reference.
    #[test]
    fn test_altitude_hold_ignores_nan_altitude() {
        let mut hold = AltitudeHold::default();
        let _ = hold.update(true, 0.0, f32::NAN, 0.01);
        assert_eq!(AltitudeHoldState::Free, hold.state());

        let _ = hold.update(true, 0.0, 4.0, 0.01);
        assert_eq!(Some(4.0), hold.reference());
        let correction = hold.update(true, 0.0, f32::NAN, 0.01);
        assert!(correction.is_finite());
        assert_eq!(Some(4.0), hold.reference());
        assert!(hold.update(true, 0.0, 3.0, 0.01).is_finite());
    }

    /// The climb rate moves the reference by `rate * dt` per cycle.
    #[test]
    fn test_altitude_hold_climb_integration() {
        let mut hold = AltitudeHold::default();
        let _ = hold.update(true, 0.0, 5.0, 0.1);
        for _ in 0..10 {
            let _ = hold.update(true, 2.0, 5.0, 0.1);
        }
        let reference = hold.reference().unwrap_or_default();
        assert!(value_within(7.0, reference, 1e-4), "reference {}", reference);
    }

    /// Leaving hold discards the reference; re-entering latches the new altitude.
    #[test]
    fn test_altitude_hold_release_discards_reference() {
        let mut hold = AltitudeHold::default();
        let _ = hold.update(true, 1.0, 5.0, 1.0);
        assert_eq!(Some(6.0), hold.reference());

        assert!(value_close(0.0, hold.update(false, 1.0, 8.0, 1.0)));
        assert_eq!(AltitudeHoldState::Free, hold.state());

        let _ = hold.update(true, 0.0, 20.0, 1.0);
        assert_eq!(Some(20.0), hold.reference());
    }

    /// Below the reference the correction pushes throttle up, scaled by the
    /// motor force.
    #[test]
    fn test_altitude_hold_correction_sign_and_scale() {
        let mut config = AltitudeHoldConfig::new();
        config.gains = PidGains::new(2.0, 0.0, 0.0, 1.0, 1.0);
        config.motor_force = 100.0;
        let mut hold = AltitudeHold::with_config(config);

        let _ = hold.update(true, 0.0, 10.0, 0.01);
        let correction = hold.update(true, 0.0, 9.0, 0.01);
        assert!(value_close(0.02, correction), "2 * 1 m / 100");
        let correction = hold.update(true, 0.0, 11.0, 0.01);
        assert!(value_close(-0.02, correction));
    }
}
