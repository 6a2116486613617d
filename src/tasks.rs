// src/tasks.rs

//! # Control and Communication Tasks
//!
//! The two step functions the firmware runs concurrently, typically one per
//! core. They only meet in [`SharedState`].
//!
//! - [`ControlTask::step`] runs once per control cycle and never blocks. It
//!   checks the kill switch first, re-checks strict safety against the
//!   freshest sensor flags, applies pending gain updates, runs the
//!   [`FlightController`] and publishes a [`FlightSnapshot`].
//! - [`CommTask::poll`] runs at its own cadence. When no control packet has
//!   arrived within the listen window it drains the radio through the
//!   [`CommandGovernor`]; otherwise it answers with telemetry.

use crate::governor::{apply_safety_override, safety_override_active, CommandGovernor};
use crate::packet::Packet;
use crate::shared::{CommandState, FlightSnapshot, SharedState};
use crate::telemetry::{SensorTelemetry, StateTelemetry, TelemetryConfig};
use crate::{FlightControlConfig, FlightController, GainAxis};
use crate::{Measurement, MotorCommand, Orientation, SensorHealth};
use log::{info, warn};
use nalgebra::Vector4;

/// Inputs sampled for one control cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlInputs {
    /// Sensor frame.
    pub measurement: Measurement,
    /// Attitude estimate.
    pub orientation: Orientation,
    /// Sensor and estimator timeout flags.
    pub health: SensorHealth,
    /// Hardware kill switch state.
    pub kill_switch: bool,
}

/// Result of one control cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlOutput {
    /// Motor percentages to send.
    pub motors: MotorCommand,
    /// A sensor, estimator or link timeout is active.
    pub fault: bool,
    /// The motors are armed and driven.
    pub motors_enabled: bool,
}

/// The fixed-rate control side.
pub struct ControlTask<'a> {
    shared: &'a SharedState,
    controller: FlightController,
    strict_safety: bool,
    killed: bool,
}

impl<'a> ControlTask<'a> {
    /// Creates the control task.
    ///
    /// A configuration that fails [`FlightControlConfig::validate`] is logged
    /// and used as is.
    pub fn new(shared: &'a SharedState, config: &FlightControlConfig) -> Self {
        if let Err(err) = config.validate() {
            warn!("control task started with {}", err);
        }
        Self {
            shared,
            controller: FlightController::with_config(config),
            strict_safety: config.governor.strict_safety,
            killed: false,
        }
    }

    /// Runs one control cycle.
    pub fn step(&mut self, inputs: &ControlInputs) -> ControlOutput {
        let CommandState {
            command,
            link_timed_out,
        } = self.shared.command();
        let fault = inputs.health.any_fault() || link_timed_out;

        if inputs.kill_switch {
            if !self.killed {
                warn!("kill switch engaged");
                self.killed = true;
            }
            self.controller.stop_motors();
            return self.finish(inputs, Vector4::zeros(), fault, false);
        }
        if self.killed {
            info!("kill switch released");
            self.killed = false;
        }

        let command = apply_safety_override(
            command,
            self.strict_safety,
            &inputs.health,
            link_timed_out,
        );

        for axis in GainAxis::ALL {
            if let Some(update) = self.shared.take_gains(axis) {
                self.controller.apply_gains(update);
            }
        }

        let mut motors = self
            .controller
            .update(&command, &inputs.measurement, &inputs.orientation);
        if safety_override_active(self.strict_safety, &inputs.health, link_timed_out) {
            self.controller.stop_motors();
            motors = Vector4::zeros();
        }

        self.finish(inputs, motors, fault, command.mode.motors_on())
    }

    fn finish(
        &self,
        inputs: &ControlInputs,
        motors: MotorCommand,
        fault: bool,
        motors_enabled: bool,
    ) -> ControlOutput {
        self.shared.publish_snapshot(FlightSnapshot {
            orientation: inputs.orientation,
            measurement: inputs.measurement,
            motors,
            torques: self.controller.torques(),
            health: inputs.health,
        });
        ControlOutput {
            motors,
            fault,
            motors_enabled,
        }
    }

    /// Read access to the controller.
    pub fn controller(&self) -> &FlightController {
        &self.controller
    }
}

/// What one communication poll did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommAction {
    /// Packets were drained and this command was published.
    Listened(CommandState),
    /// Telemetry frames to transmit.
    Telemetry {
        /// Attitude, motor and torque state.
        state: StateTelemetry,
        /// Altitude and battery, at a lower rate.
        sensor: Option<SensorTelemetry>,
    },
}

/// The radio side.
pub struct CommTask<'a> {
    shared: &'a SharedState,
    governor: CommandGovernor,
    telemetry: TelemetryConfig,
}

impl<'a> CommTask<'a> {
    /// Creates the communication task.
    ///
    /// `reference_yaw` is the heading recorded at arming.
    pub fn new(
        shared: &'a SharedState,
        config: &FlightControlConfig,
        reference_yaw: f32,
        now_ms: u64,
    ) -> Self {
        Self {
            shared,
            governor: CommandGovernor::new(config.governor, reference_yaw, now_ms),
            telemetry: config.telemetry,
        }
    }

    /// Runs one poll.
    ///
    /// `payloads` is only consumed when listening, so a lazy iterator over
    /// the radio leaves its queue untouched while telemetry goes out.
    /// Payloads that fail to decode are dropped.
    pub fn poll<I, P>(&mut self, payloads: I, now_ms: u64) -> CommAction
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        let snapshot = self.shared.snapshot();

        if self.governor.ms_since_control(now_ms) >= self.telemetry.listen_window_ms {
            let packets = payloads
                .into_iter()
                .filter_map(|payload| match Packet::decode(payload.as_ref()) {
                    Ok(packet) => Some(packet),
                    Err(err) => {
                        warn!("dropping packet: {}", err);
                        None
                    }
                });
            let command = self.governor.update(packets, now_ms, &snapshot.health);
            for update in self.governor.drain_gains() {
                self.shared.publish_gains(update);
            }
            let state = CommandState {
                command,
                link_timed_out: self.governor.link_timed_out(),
            };
            self.shared.publish_command(state);
            return CommAction::Listened(state);
        }

        let state =
            StateTelemetry::from_snapshot(&snapshot, self.governor.reference_yaw(), now_ms as u32);
        let sensor = if self.governor.received() > self.telemetry.sensor_every {
            self.governor.reset_received();
            Some(SensorTelemetry::from_snapshot(&snapshot))
        } else {
            None
        };
        CommAction::Telemetry { state, sensor }
    }

    /// Read access to the governor.
    pub fn governor(&self) -> &CommandGovernor {
        &self.governor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{ControlPacket, PAYLOAD_SIZE};
    use crate::pid::PidGains;
    use crate::stabilizer::RateAxis;
    use crate::test_utils::*;
    use crate::{Command, FlightMode, GainUpdate};

    fn inputs() -> ControlInputs {
        ControlInputs {
            measurement: Measurement {
                altitude: 2.0,
                battery: 12.4,
                dt: 0.001,
                ..Measurement::default()
            },
            orientation: Orientation::level(),
            health: SensorHealth::default(),
            kill_switch: false,
        }
    }

    fn armed(throttle: f32) -> CommandState {
        CommandState {
            command: Command {
                throttle,
                mode: FlightMode::Manual,
                ..Command::IDLE
            },
            link_timed_out: false,
        }
    }

    fn control_payload(throttle: f32) -> [u8; PAYLOAD_SIZE] {
        let mut buf = [0u8; PAYLOAD_SIZE];
        let packet = Packet::Control(ControlPacket {
            throttle,
            yaw_delta: 10.0,
            mode: FlightMode::Manual,
            ..ControlPacket::default()
        });
        let _ = packet.encode(&mut buf);
        buf
    }

    fn spin_up(task: &mut ControlTask) -> ControlOutput {
        let mut output = task.step(&inputs());
        for _ in 0..100 {
            output = task.step(&inputs());
        }
        output
    }

    #[test]
    fn test_control_step_publishes_snapshot() {
        let shared = SharedState::new();
        shared.publish_command(armed(0.5));
        let mut task = ControlTask::new(&shared, &FlightControlConfig::new());

        let output = spin_up(&mut task);
        assert!(output.motors_enabled);
        assert!(!output.fault);
        assert!(motors_close(Vector4::repeat(0.5), output.motors));

        let snapshot = shared.snapshot();
        assert_eq!(output.motors, snapshot.motors);
        assert!(value_close(2.0, snapshot.measurement.altitude));
    }

    /// The kill switch zeroes the output at once, leaves gains queued, and
    /// on release the motors ramp up again from zero.
    #[test]
    fn test_kill_switch_overrides_everything() {
        let shared = SharedState::new();
        shared.publish_command(armed(0.5));
        let mut task = ControlTask::new(&shared, &FlightControlConfig::new());
        let _ = spin_up(&mut task);

        let update = GainUpdate {
            axis: GainAxis::RollRate,
            gains: PidGains::new(0.1, 0.0, 0.0, 1.0, 1.0),
        };
        shared.publish_gains(update);

        let killed = ControlInputs {
            kill_switch: true,
            ..inputs()
        };
        for _ in 0..5 {
            let output = task.step(&killed);
            assert_eq!(Vector4::zeros(), output.motors);
            assert!(!output.motors_enabled);
            assert!(!output.fault);
        }
        assert_eq!(Vector4::zeros(), shared.snapshot().motors);

        let output = task.step(&inputs());
        assert!(motors_close(Vector4::repeat(0.01), output.motors), "{:?}", output.motors);
        assert_eq!(
            update.gains,
            task.controller().stabilizer().pid(RateAxis::Roll).gains()
        );
        assert_eq!(None, shared.take_gains(GainAxis::RollRate));
    }

    /// A fresh sensor fault cuts the motors even before the governor sees it.
    #[test]
    fn test_strict_safety_rechecked_per_cycle() {
        let shared = SharedState::new();
        shared.publish_command(armed(0.5));
        let mut task = ControlTask::new(&shared, &FlightControlConfig::new());
        let _ = spin_up(&mut task);

        let faulted = ControlInputs {
            health: SensorHealth {
                imu_timed_out: true,
                ..SensorHealth::default()
            },
            ..inputs()
        };
        let output = task.step(&faulted);
        assert_eq!(Vector4::zeros(), output.motors);
        assert!(!output.motors_enabled);
        assert!(output.fault);

        let altitude_only = ControlInputs {
            health: SensorHealth {
                altitude_timed_out: true,
                ..SensorHealth::default()
            },
            ..inputs()
        };
        let output = task.step(&altitude_only);
        assert!(output.fault);
        assert!(output.motors_enabled, "An altimeter fault is only indicated.");
    }

    /// Without strict safety a lost link degrades to the failsafe descent.
    #[test]
    fn test_lenient_link_loss_keeps_flying() {
        let shared = SharedState::new();
        let mut config = FlightControlConfig::new();
        config.governor.strict_safety = false;
        shared.publish_command(CommandState {
            link_timed_out: true,
            ..armed(0.4)
        });
        let mut task = ControlTask::new(&shared, &config);
        let output = spin_up(&mut task);
        assert!(output.fault);
        assert!(output.motors_enabled);
        assert!(motors_close(Vector4::repeat(0.4), output.motors));
    }

    /// With a quiet link the comm task listens, publishes the command and
    /// forwards gain updates.
    #[test]
    fn test_comm_poll_listens_when_quiet() {
        let shared = SharedState::new();
        let mut comm = CommTask::new(&shared, &FlightControlConfig::new(), 20.0, 0);

        let mut gains = [0u8; PAYLOAD_SIZE];
        let update = GainUpdate {
            axis: GainAxis::Altitude,
            gains: PidGains::new(1.0, 0.2, 0.01, 3.0, 0.33),
        };
        let _ = Packet::Gains(update).encode(&mut gains);
        let garbage = [7u8; PAYLOAD_SIZE];

        let action = comm.poll([control_payload(0.3), garbage, gains], 100);
        let CommAction::Listened(state) = action else {
            panic!("expected to listen, got {:?}", action);
        };
        assert!(value_close(0.3, state.command.throttle));
        assert!(value_close(30.0, state.command.yaw));
        assert_eq!(FlightMode::Manual, state.command.mode);
        assert_eq!(state, shared.command());
        assert_eq!(Some(update), shared.take_gains(GainAxis::Altitude));
    }

    /// A gain packet with a runaway filter weight is dropped before it can
    /// reach the control side; the command still goes through.
    #[test]
    fn test_comm_poll_drops_out_of_range_gains() {
        let shared = SharedState::new();
        let mut comm = CommTask::new(&shared, &FlightControlConfig::new(), 0.0, 0);

        let mut gains = [0u8; PAYLOAD_SIZE];
        let update = GainUpdate {
            axis: GainAxis::RollRate,
            gains: PidGains::new(1.0, 0.2, 0.01, 3.0, 3.0),
        };
        let _ = Packet::Gains(update).encode(&mut gains);

        let action = comm.poll([gains, control_payload(0.3)], 100);
        assert!(matches!(action, CommAction::Listened(_)), "{:?}", action);
        assert!(value_close(0.3, shared.command().command.throttle));
        assert_eq!(None, shared.take_gains(GainAxis::RollRate));
    }

    /// Right after a control packet the comm task sends telemetry and leaves
    /// the radio alone; a sensor frame follows every N packets.
    #[test]
    fn test_comm_poll_sends_telemetry_after_command() {
        let shared = SharedState::new();
        let mut config = FlightControlConfig::new();
        config.telemetry.sensor_every = 2;
        let mut comm = CommTask::new(&shared, &config, 0.0, 0);

        let payloads = [control_payload(0.5), control_payload(0.5), control_payload(0.5)];
        let _ = comm.poll(payloads, 100);
        assert_eq!(3, comm.governor().received());

        let mut untouched = [control_payload(0.9)].into_iter();
        let action = comm.poll(&mut untouched, 150);
        match action {
            CommAction::Telemetry { state, sensor } => {
                assert_eq!(150, state.timestamp_ms);
                assert!(sensor.is_some());
            }
            other => panic!("expected telemetry, got {:?}", other),
        }
        assert_eq!(1, untouched.len());
        assert_eq!(0, comm.governor().received());

        let action = comm.poll(core::iter::empty::<[u8; PAYLOAD_SIZE]>(), 160);
        assert!(matches!(action, CommAction::Telemetry { sensor: None, .. }));
    }

    /// After the listen window the comm task drains again.
    #[test]
    fn test_comm_poll_relistens_after_window() {
        let shared = SharedState::new();
        let mut comm = CommTask::new(&shared, &FlightControlConfig::new(), 0.0, 0);
        let _ = comm.poll([control_payload(0.5)], 100);
        let action = comm.poll(core::iter::empty::<[u8; PAYLOAD_SIZE]>(), 189);
        assert!(matches!(action, CommAction::Telemetry { .. }));
        let action = comm.poll([control_payload(0.6)], 190);
        assert!(matches!(action, CommAction::Listened(_)));
        assert!(value_close(0.6, shared.command().command.throttle));
    }
}
