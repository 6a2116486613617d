// src/angle.rs

//! Angle helpers: wrap-around normalization and Euler angles resolved from
//! a direction-cosine matrix. All angles are in degrees.

use nalgebra::Matrix3;
use num_traits::Float;

/// Half a turn. Angles are wrapped into `[-HALF_TURN, HALF_TURN)`.
pub const HALF_TURN: f32 = 180.0;
/// One full turn.
pub const FULL_TURN: f32 = 360.0;

/// Normalizes an angle into `[-180, 180)`.
///
/// Angles already inside the range are returned untouched, so
/// `wrap_angle(wrap_angle(a)) == wrap_angle(a)` holds exactly.
/// Non-finite input is returned as is.
pub fn wrap_angle(angle: f32) -> f32 {
    if !angle.is_finite() || (-HALF_TURN..HALF_TURN).contains(&angle) {
        return angle;
    }
    let mut shifted = (angle + HALF_TURN) % FULL_TURN;
    if shifted < 0.0 {
        shifted += FULL_TURN;
    }
    let wrapped = shifted - HALF_TURN;
    // Rounding at the edges can land exactly on +180.
    if wrapped >= HALF_TURN {
        wrapped - FULL_TURN
    } else {
        wrapped
    }
}

/// Signed shortest difference `to - from`, wrapped into `[-180, 180)`.
pub fn angle_difference(to: f32, from: f32) -> f32 {
    wrap_angle(to - from)
}

/// Roll, pitch and yaw in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Attitude {
    /// Rotation about the body x axis.
    pub roll: f32,
    /// Rotation about the body y axis.
    pub pitch: f32,
    /// Heading, wrapped into `[-180, 180)`.
    pub yaw: f32,
}

impl Attitude {
    /// Resolves Z-Y-X Euler angles from a body-to-world rotation matrix.
    pub fn from_dcm(dcm: &Matrix3<f32>) -> Self {
        let roll = Float::atan2(dcm[(2, 1)], dcm[(2, 2)]);
        let pitch = -Float::asin(dcm[(2, 0)].clamp(-1.0, 1.0));
        let yaw = Float::atan2(dcm[(1, 0)], dcm[(0, 0)]);
        Self {
            roll: roll.to_degrees(),
            pitch: pitch.to_degrees(),
            yaw: wrap_angle(yaw.to_degrees()),
        }
    }

    /// Yaw relative to `reference`, wrapped.
    pub fn yaw_from(&self, reference: f32) -> f32 {
        angle_difference(self.yaw, reference)
    }
}
