// src/pid/axis.rs

//! # Single-Axis PID Controller
//!
//! [`AxisPid`] wraps a `piddiy` controller running [`compute_filtered`] and
//! owns everything that must survive between calls: the derivative filter,
//! the live gains, and the fixed output ceiling chosen at construction.

use crate::pid::{compute_filtered, DerivativeFilter, FilteredControlData};
use crate::{Error, Number, Result};
use piddiy::PidController;

/// Tunable gains for one control axis.
///
/// The whole set is replaced at once by [`AxisPid::set_gains`], which is the
/// only way gains change at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PidGains<T> {
    /// Proportional gain.
    pub kp: T,
    /// Integral gain.
    pub ki: T,
    /// Derivative gain.
    pub kd: T,
    /// Magnitude bound of the integral accumulator (anti-windup).
    pub integral_limit: T,
    /// Weight of the newest raw derivative sample in the low-pass filter.
    pub derivative_filter: T,
}

impl<T: Number> PidGains<T> {
    /// Creates a gain set from its five values.
    pub fn new(kp: T, ki: T, kd: T, integral_limit: T, derivative_filter: T) -> Self {
        Self {
            kp,
            ki,
            kd,
            integral_limit,
            derivative_filter,
        }
    }
}

impl PidGains<f32> {
    /// Checks that the gains are finite, the integral bound is non-negative
    /// and the derivative filter weight lies in `[0, 1]`.
    ///
    /// The error names the first offending field.
    pub fn validate(&self) -> Result<()> {
        let gains = [("kp", self.kp), ("ki", self.ki), ("kd", self.kd)];
        if let Some((field, _)) = gains.iter().find(|(_, gain)| !gain.is_finite()) {
            return Err(Error::InvalidGains(field));
        }
        if !(self.integral_limit.is_finite() && self.integral_limit >= 0.0) {
            return Err(Error::InvalidGains("integral_limit"));
        }
        if !(0.0..=1.0).contains(&self.derivative_filter) {
            return Err(Error::InvalidGains("derivative_filter"));
        }
        Ok(())
    }
}

/// PID controller for one axis with a filtered derivative on measurement,
/// a clamped integral, and an output clamped to a fixed ceiling.
///
/// The output ceiling and the label are set once at construction. The
/// integral bound lives in [`PidGains`] and can be retuned.
///
/// A call with a non-finite setpoint, measurement or `dt` leaves the state
/// untouched and repeats the previous output.
pub struct AxisPid<T: Number> {
    pid: PidController<T, FilteredControlData<T>>,
    gains: PidGains<T>,
    derivative: DerivativeFilter<T>,
    output_limit: T,
    last_output: T,
    label: &'static str,
}

impl<T: Number> AxisPid<T> {
    /// Creates a controller from its gains, fixed output ceiling and label.
    pub fn new(gains: PidGains<T>, output_limit: T, label: &'static str) -> Self {
        let mut pid = PidController::new();
        pid.compute_fn(compute_filtered)
            .kp(gains.kp)
            .ki(gains.ki)
            .kd(gains.kd);

        Self {
            pid,
            gains,
            derivative: DerivativeFilter::new(),
            output_limit,
            last_output: T::zero(),
            label,
        }
    }

    /// Runs one control step and returns the output, clamped to
    /// `±output_limit`.
    pub fn process(&mut self, set_point: T, measurement: T, dt: T) -> T {
        if !(set_point.is_finite_value() && measurement.is_finite_value() && dt.is_finite_value())
        {
            return self.last_output;
        }
        let derivative = self
            .derivative
            .update(measurement, dt, self.gains.derivative_filter);
        self.pid.set_point(set_point);
        let output = self.pid.compute(FilteredControlData {
            measurement,
            dt,
            integral_limit: self.gains.integral_limit,
            derivative,
        });
        self.last_output = output.clamp(-self.output_limit, self.output_limit);
        self.last_output
    }

    /// Replaces all gains. Running state is kept.
    pub fn set_gains(&mut self, gains: PidGains<T>) {
        self.pid.kp(gains.kp).ki(gains.ki).kd(gains.kd);
        self.gains = gains;
    }

    /// The gains currently in use.
    pub fn gains(&self) -> PidGains<T> {
        self.gains
    }

    /// The current integral accumulator.
    pub fn integral(&self) -> T {
        self.pid.integral
    }

    /// The last filtered derivative.
    pub fn derivative(&self) -> T {
        self.derivative.value()
    }

    /// The output of the last accepted step.
    pub fn last_output(&self) -> T {
        self.last_output
    }

    /// The fixed output ceiling.
    pub fn output_limit(&self) -> T {
        self.output_limit
    }

    /// Diagnostic label.
    pub fn label(&self) -> &'static str {
        self.label
    }
}
