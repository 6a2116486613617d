// src/governor.rs

//! # Command Freshness & Failsafe Governor
//!
//! Turns the stream of decoded packets into the [`Command`] the control law
//! follows. It drains every packet handed to it, keeps only the newest
//! control packet, records gain updates for one-shot delivery, and degrades
//! the command when the link goes quiet:
//!
//! - **Fresh**: the packet is taken verbatim, except that its relative yaw is
//!   turned into an absolute heading against the arming reference.
//! - **Stale** (no control packet for longer than the timeout): level
//!   attitude, held heading, zero climb rate, and a throttle that decays by a
//!   fixed step per invocation down to zero. The vehicle sinks instead of
//!   dropping.
//!
//! Under strict safety a lost attitude source or a lost link forces the
//! mode to [`FlightMode::Off`], after everything else.

use crate::angle::wrap_angle;
use crate::packet::{ControlPacket, Packet};
use crate::{Command, FlightMode, GainUpdate, SensorHealth};
use log::{debug, info, warn};

/// Configuration for the command governor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GovernorConfig {
    /// Time without a control packet after which the failsafe engages.
    pub command_timeout_ms: u64,
    /// Throttle removed per invocation while the failsafe is engaged.
    pub throttle_decay: f32,
    /// Force motors off when the attitude source or the link is lost.
    pub strict_safety: bool,
}

impl GovernorConfig {
    /// Creates a configuration with the flight-tested defaults.
    pub fn new() -> Self {
        Self {
            command_timeout_ms: 1000,
            throttle_decay: 0.0001,
            strict_safety: true,
        }
    }
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// `true` when strict safety is on and either the attitude source or the
/// link has timed out.
pub fn safety_override_active(
    strict_safety: bool,
    health: &SensorHealth,
    link_timed_out: bool,
) -> bool {
    strict_safety && (health.attitude_lost() || link_timed_out)
}

/// Forces the mode to off while [`safety_override_active`] holds. Any other
/// command passes unchanged.
pub fn apply_safety_override(
    command: Command,
    strict_safety: bool,
    health: &SensorHealth,
    link_timed_out: bool,
) -> Command {
    if safety_override_active(strict_safety, health, link_timed_out) {
        Command {
            mode: FlightMode::Off,
            ..command
        }
    } else {
        command
    }
}

/// Packet-driven command source with failsafe handling.
pub struct CommandGovernor {
    config: GovernorConfig,
    reference_yaw: f32,
    latest: Command,
    last_control_ms: u64,
    link_timed_out: bool,
    received: u32,
    pending_gains: [Option<GainUpdate>; 4],
    override_active: bool,
}

impl CommandGovernor {
    /// Creates a governor that starts idle.
    ///
    /// `reference_yaw` is the heading recorded at arming; `now_ms` starts the
    /// freshness clock, so the failsafe engages if nothing arrives within the
    /// timeout.
    pub fn new(config: GovernorConfig, reference_yaw: f32, now_ms: u64) -> Self {
        Self {
            config,
            reference_yaw: wrap_angle(reference_yaw),
            latest: Command {
                yaw: wrap_angle(reference_yaw),
                ..Command::IDLE
            },
            last_control_ms: now_ms,
            link_timed_out: false,
            received: 0,
            pending_gains: [None; 4],
            override_active: false,
        }
    }

    /// Drains `packets` in arrival order and returns the command for this
    /// invocation.
    pub fn update<I>(&mut self, packets: I, now_ms: u64, health: &SensorHealth) -> Command
    where
        I: IntoIterator<Item = Packet>,
    {
        let mut newest = None;
        for packet in packets {
            match packet {
                Packet::Control(control) => {
                    self.received = self.received.saturating_add(1);
                    self.last_control_ms = now_ms;
                    newest = Some(control);
                }
                Packet::Gains(update) => {
                    debug!("gain update received for {:?}", update.axis);
                    self.pending_gains[update.axis.index()] = Some(update);
                }
            }
        }

        if self.ms_since_control(now_ms) > self.config.command_timeout_ms {
            if !self.link_timed_out {
                warn!("command link lost, entering failsafe descent");
            }
            self.link_timed_out = true;
            self.latest = Command {
                roll: 0.0,
                pitch: 0.0,
                climb_rate: 0.0,
                throttle: (self.latest.throttle - self.config.throttle_decay).max(0.0),
                ..self.latest
            };
        } else if let Some(control) = newest {
            if self.link_timed_out {
                info!("command link restored");
            }
            self.link_timed_out = false;
            self.latest = self.accept(&control);
        }

        let command = apply_safety_override(
            self.latest,
            self.config.strict_safety,
            health,
            self.link_timed_out,
        );
        let overridden = command.mode != self.latest.mode;
        if overridden && !self.override_active {
            warn!("strict safety override: motors off");
        }
        self.override_active = overridden;
        command
    }

    fn accept(&self, control: &ControlPacket) -> Command {
        Command {
            roll: control.roll,
            pitch: control.pitch,
            yaw: wrap_angle(self.reference_yaw + control.yaw_delta),
            throttle: control.throttle,
            climb_rate: control.climb_rate,
            mode: control.mode,
        }
    }

    /// Takes every recorded gain update.
    pub fn drain_gains(&mut self) -> impl Iterator<Item = GainUpdate> {
        let pending = core::mem::replace(&mut self.pending_gains, [None; 4]);
        pending.into_iter().flatten()
    }

    /// Milliseconds since the last control packet.
    pub fn ms_since_control(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_control_ms)
    }

    /// Control packets received since the last [`Self::reset_received`].
    pub fn received(&self) -> u32 {
        self.received
    }

    /// Restarts the received-packet count.
    pub fn reset_received(&mut self) {
        self.received = 0;
    }

    /// `true` while the failsafe is engaged.
    pub fn link_timed_out(&self) -> bool {
        self.link_timed_out
    }

    /// The heading that relative yaw commands are measured from.
    pub fn reference_yaw(&self) -> f32 {
        self.reference_yaw
    }

    /// The latest command before the safety override.
    pub fn latest(&self) -> Command {
        self.latest
    }
}
