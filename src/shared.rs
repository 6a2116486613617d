// src/shared.rs

//! # Shared State
//!
//! The only state crossing the control task and the communication task.
//! Every slot is a `Cell` behind an `embassy_sync` blocking mutex over a
//! critical section, so readers always see a whole value and a critical
//! section never does more than copy one small `Copy` value.
//!
//! | Slot      | Writer        | Reader        |
//! |-----------|---------------|---------------|
//! | command   | communication | control       |
//! | snapshot  | control       | communication |
//! | gains     | communication | control, once |

use crate::{Command, GainAxis, GainUpdate, Measurement, MotorCommand, Orientation, SensorHealth};
use core::cell::Cell;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use nalgebra::{Vector3, Vector4};

/// The governor output together with the link state it was produced under.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CommandState {
    /// Command to follow, safety override included.
    pub command: Command,
    /// `true` while the command link is in failsafe.
    pub link_timed_out: bool,
}

/// What the control task saw and did in its last cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightSnapshot {
    /// Attitude estimate.
    pub orientation: Orientation,
    /// Sensor frame.
    pub measurement: Measurement,
    /// Motor percentages actually sent.
    pub motors: MotorCommand,
    /// Torque demands after clamping.
    pub torques: Vector3<f32>,
    /// Sensor and estimator timeout flags.
    pub health: SensorHealth,
}

impl Default for FlightSnapshot {
    fn default() -> Self {
        Self {
            orientation: Orientation::level(),
            measurement: Measurement::default(),
            motors: Vector4::zeros(),
            torques: Vector3::zeros(),
            health: SensorHealth::default(),
        }
    }
}

type Slot<T> = Mutex<CriticalSectionRawMutex, Cell<T>>;

/// State shared between the control task and the communication task.
///
/// Pass it by reference to both; it is `Sync`.
pub struct SharedState {
    command: Slot<CommandState>,
    snapshot: Slot<FlightSnapshot>,
    gains: Mutex<CriticalSectionRawMutex, [Cell<Option<GainUpdate>>; 4]>,
}

impl SharedState {
    /// Creates the shared state with an idle command and a level snapshot.
    pub fn new() -> Self {
        Self {
            command: Mutex::new(Cell::new(CommandState::default())),
            snapshot: Mutex::new(Cell::new(FlightSnapshot::default())),
            gains: Mutex::new([const { Cell::new(None) }; 4]),
        }
    }

    /// Replaces the command.
    pub fn publish_command(&self, state: CommandState) {
        self.command.lock(|slot| slot.set(state));
    }

    /// The latest command.
    pub fn command(&self) -> CommandState {
        self.command.lock(Cell::get)
    }

    /// Replaces the snapshot.
    pub fn publish_snapshot(&self, snapshot: FlightSnapshot) {
        self.snapshot.lock(|slot| slot.set(snapshot));
    }

    /// The latest snapshot.
    pub fn snapshot(&self) -> FlightSnapshot {
        self.snapshot.lock(Cell::get)
    }

    /// Queues a gain update, replacing any update for the same axis that has
    /// not been taken yet.
    pub fn publish_gains(&self, update: GainUpdate) {
        self.gains
            .lock(|slots| slots[update.axis.index()].set(Some(update)));
    }

    /// Takes the queued gain update for `axis`, leaving the slot empty.
    pub fn take_gains(&self, axis: GainAxis) -> Option<GainUpdate> {
        self.gains.lock(|slots| slots[axis.index()].take())
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
