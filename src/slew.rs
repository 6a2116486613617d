// src/slew.rs

//! # Output Slew Limiter
//!
//! Bounds how fast each motor percentage may change, independently of its
//! value. This is a rate limiter, not a low-pass filter: a step smaller than
//! `max_rate * dt` passes through untouched.

use crate::mixer::clamp_unit;
use crate::Number;
use nalgebra::Vector4;

/// Per-channel rate limiter for the four motor percentages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlewLimiter {
    max_rate: f32,
    output: Vector4<f32>,
}

impl SlewLimiter {
    /// Creates a limiter starting from all motors at zero.
    ///
    /// `max_rate` is in full-scale units per second.
    pub fn new(max_rate: f32) -> Self {
        Self {
            max_rate,
            output: Vector4::zeros(),
        }
    }

    /// Moves the held output toward `target` by at most `max_rate * dt` per
    /// channel and returns it, clamped to `[0, 1]`.
    ///
    /// A non-positive `dt` leaves the output where it is.
    pub fn apply(&mut self, target: &Vector4<f32>, dt: f32) -> Vector4<f32> {
        if dt > 0.0 {
            let max_rate = self.max_rate;
            let rate = (target - self.output) / dt;
            let rate = rate.map(|r| {
                if r.is_nan() {
                    0.0
                } else {
                    Number::clamp(r, -max_rate, max_rate)
                }
            });
            self.output = (self.output + rate * dt).map(clamp_unit);
        }
        self.output
    }

    /// Sets the held output to zero.
    pub fn reset(&mut self) {
        self.output = Vector4::zeros();
    }

    /// The last output.
    pub fn output(&self) -> Vector4<f32> {
        self.output
    }

    /// The configured rate bound.
    pub fn max_rate(&self) -> f32 {
        self.max_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    /// A full step is spread over `1 / (max_rate * dt)` cycles.
    #[test]
    fn test_slew_step_response() {
        let mut slew = SlewLimiter::new(10.0);
        let target = Vector4::repeat(1.0);
        let first = slew.apply(&target, 0.01);
        assert!(motors_close(Vector4::repeat(0.1), first));
        for _ in 0..8 {
            let _ = slew.apply(&target, 0.01);
        }
        let last = slew.apply(&target, 0.01);
        assert!(motors_close(Vector4::repeat(1.0), last));
    }

    /// Small changes pass straight through.
    #[test]
    fn test_slew_small_change_passes() {
        let mut slew = SlewLimiter::new(10.0);
        let target = Vector4::new(0.05, 0.02, 0.0, 0.1);
        assert!(motors_close(target, slew.apply(&target, 0.01)));
    }

    /// Each step is bounded by `max_rate * dt`, in both directions.
    #[test]
    fn test_slew_bound_holds() {
        let mut slew = SlewLimiter::new(10.0);
        let targets = [
            Vector4::new(1.0, 0.0, 0.7, 0.3),
            Vector4::new(0.0, 1.0, 0.0, 1.0),
            Vector4::new(0.5, 0.5, 2.0, -1.0),
            Vector4::new(0.2, 0.9, 0.1, 0.6),
        ];
        for dt in [0.001, 0.01, 0.05] {
            for target in targets.iter().cycle().take(40) {
                let before = slew.output();
                let after = slew.apply(target, dt);
                for (b, a) in before.iter().zip(after.iter()) {
                    assert!((a - b).abs() <= 10.0 * dt + 1e-6, "{} -> {}", b, a);
                }
                assert!(motors_in_unit_range(after));
            }
        }
    }

    /// Zero or negative dt holds the output.
    #[test]
    fn test_slew_non_positive_dt() {
        let mut slew = SlewLimiter::new(10.0);
        let _ = slew.apply(&Vector4::repeat(1.0), 0.01);
        let held = slew.apply(&Vector4::repeat(0.0), 0.0);
        assert!(motors_close(Vector4::repeat(0.1), held));
        let held = slew.apply(&Vector4::repeat(0.0), -1.0);
        assert!(motors_close(Vector4::repeat(0.1), held));
    }

    /// The idle case ramps down instead of cutting.
    #[test]
    fn test_slew_ramps_down_to_idle() {
        let mut slew = SlewLimiter::new(10.0);
        for _ in 0..100 {
            let _ = slew.apply(&Vector4::repeat(0.5), 0.01);
        }
        let first = slew.apply(&Vector4::zeros(), 0.01);
        assert!(motors_close(Vector4::repeat(0.4), first));
    }
}
