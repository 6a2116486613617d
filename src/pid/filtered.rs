// src/pid/filtered.rs

//! # Filtered-Derivative PID Control Module
//!
//! This module provides a compute function and control data structure
//! for a PID whose derivative acts on the measurement rather than the
//! error, smoothed by a first-order low-pass filter.

use crate::Number;
use piddiy::PidController;

/// Control data for the filtered-derivative PID compute callback.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FilteredControlData<T> {
    /// The measured value of the controlled quantity.
    pub measurement: T,
    /// The time delta since the last computation.
    pub dt: T,
    /// The maximum allowed magnitude of the integral term.
    pub integral_limit: T,
    /// The already filtered derivative of the error, see [`DerivativeFilter`].
    pub derivative: T,
}

/// Filtered-derivative PID compute callback.
///
/// The integral is clamped rather than conditionally frozen, so a long
/// saturation leaves it at `±integral_limit` and no further.
pub fn compute_filtered<T: Number>(
    pid: &mut PidController<T, FilteredControlData<T>>,
    data: FilteredControlData<T>,
) -> (T, T, T) {
    let error = pid.set_point - data.measurement;
    let integral =
        (pid.integral + error * data.dt).clamp(-data.integral_limit, data.integral_limit);

    (error, integral, data.derivative)
}

/// Low-passed derivative of a measurement, negated so that it tracks the
/// derivative of the error for a constant setpoint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DerivativeFilter<T> {
    last_measurement: Option<T>,
    filtered: T,
}

impl<T: Number> DerivativeFilter<T> {
    /// Creates an empty filter. The first update yields a zero raw derivative.
    pub fn new() -> Self {
        Self {
            last_measurement: None,
            filtered: T::zero(),
        }
    }

    /// Feeds one measurement and returns the filtered derivative.
    ///
    /// `coefficient` weights the new raw sample: `1` disables filtering,
    /// `0` freezes the output. A non-positive `dt` contributes a zero raw
    /// derivative.
    pub fn update(&mut self, measurement: T, dt: T, coefficient: T) -> T {
        let raw = match self.last_measurement {
            Some(last) if dt > T::zero() => (last - measurement) / dt,
            _ => T::zero(),
        };
        self.last_measurement = Some(measurement);
        self.filtered = coefficient * raw + (T::one() - coefficient) * self.filtered;
        self.filtered
    }

    /// The last filtered derivative.
    pub fn value(&self) -> T {
        self.filtered
    }

    /// The last measurement fed to the filter, if any.
    pub fn last_measurement(&self) -> Option<T> {
        self.last_measurement
    }
}
