// src/stabilizer.rs

//! # Flight Stabilizers
//!
//! The shared stabilizer interface and the cascaded angle/rate stabilizer
//! that turns attitude setpoints into body torques.

pub mod cascade;
pub use cascade::*;
pub mod flight_stabilizer;
pub use flight_stabilizer::*;
