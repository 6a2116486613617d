// src/pid.rs

//! # PID Control Module
//!
//! This module provides the compute function, control data and the
//! single-axis controller used for the three body-rate loops and the
//! altitude loop.

pub mod axis;
pub use axis::*;
pub mod filtered;
pub use filtered::*;
