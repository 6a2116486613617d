// src/error.rs

//! Errors for the parts of the crate that run outside the control loop:
//! packet decoding, telemetry encoding and configuration checks.
//!
//! The control loop itself never fails. Faults inside it are carried as
//! flags (see [`crate::types::SensorHealth`]) so that every cycle still
//! produces a motor command.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Recoverable errors raised while decoding, encoding or validating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The payload is shorter than the packet kind requires.
    #[error("payload too short: expected {expected} bytes, got {actual}")]
    PayloadTooShort {
        /// Bytes required by the packet kind.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },
    /// The output buffer cannot hold the encoded frame.
    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall {
        /// Bytes the frame needs.
        needed: usize,
        /// Bytes the buffer offers.
        available: usize,
    },
    /// The leading kind byte does not name a known packet.
    #[error("unknown packet kind {0}")]
    UnknownPacketKind(u8),
    /// The axis byte of a gain packet is out of range.
    #[error("unknown gain axis {0}")]
    UnknownAxis(u8),
    /// The mode byte of a control packet is out of range.
    #[error("unknown flight mode {0}")]
    UnknownMode(u8),
    /// A floating point field decoded to NaN or infinity.
    #[error("non-finite value in field `{0}`")]
    NonFinite(&'static str),
    /// A gain set is out of range; names the offending field.
    #[error("invalid gains: `{0}`")]
    InvalidGains(&'static str),
    /// A configuration field is outside its valid range.
    #[error("invalid configuration: `{0}`")]
    InvalidConfig(&'static str),
}
