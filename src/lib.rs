// src/lib.rs

//! # Quadcopter Flight-Control Core
//!
//! This crate provides a `no_std`, no-alloc flight-control core for an
//! X-configuration quadcopter. It turns pilot commands and a fused attitude
//! estimate into four motor percentages at a fixed control rate, and degrades
//! gracefully when the command link or the sensors go quiet.
//!
//! The pipeline for one control cycle is:
//!
//! ```text
//! Command ──► CascadeStabilizer ──► torques ──┐
//!    │                                        ├──► mixer ──► SlewLimiter ──► MotorCommand
//!    └──────► AltitudeHold ───► throttle ─────┘
//! ```
//!
//! The [`governor::CommandGovernor`] produces the [`Command`] from radio
//! packets, and [`tasks`] ties the control side and the communication side
//! together through [`shared::SharedState`].

#![no_std]
#![deny(missing_docs)]

pub mod altitude;
pub mod angle;
pub mod config;
pub mod controller;
pub mod error;
pub mod governor;
pub mod mixer;
pub mod packet;
pub mod pid;
pub mod shared;
pub mod slew;
pub mod stabilizer;
pub mod tasks;
pub mod telemetry;
pub mod types;

#[doc(inline)]
pub use config::FlightControlConfig;
#[doc(inline)]
pub use controller::FlightController;
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use stabilizer::*;
#[doc(inline)]
pub use types::*;

#[cfg(test)]
mod test_utils;
