// demos/hover.rs

use free_flight_control::packet::{ControlPacket, Packet, PAYLOAD_SIZE};
use free_flight_control::shared::SharedState;
use free_flight_control::tasks::{CommAction, CommTask, ControlInputs, ControlTask};
use free_flight_control::{
    FlightControlConfig, FlightMode, Measurement, Orientation, SensorHealth,
};
use nalgebra::{Matrix3, Vector3};

/// Direction-cosine matrix for a pure roll, degrees.
fn rolled(roll: f32) -> Matrix3<f32> {
    let (s, c) = roll.to_radians().sin_cos();
    Matrix3::new(1.0, 0.0, 0.0, 0.0, c, -s, 0.0, s, c)
}

fn main() {
    let config = FlightControlConfig::new();
    let shared = SharedState::new();
    let mut control = ControlTask::new(&shared, &config);
    let mut comm = CommTask::new(&shared, &config, 0.0, 0);

    // The ground station asks for a level hover at half throttle.
    let mut payload = [0u8; PAYLOAD_SIZE];
    let hover = Packet::Control(ControlPacket {
        throttle: 0.5,
        mode: FlightMode::Manual,
        ..ControlPacket::default()
    });
    hover.encode(&mut payload).expect("payload fits");

    // Simulated vehicle, starting with a 10 degree roll.
    let dt = 0.001;
    let mut roll = 10.0f32;
    let mut roll_rate = 0.0f32;

    println!("  t [ms],   roll,   rate,     m1,     m2,     m3,     m4");
    for ms in 0..=600u64 {
        // The radio side runs every millisecond too and only listens once
        // the listen window has passed, so the first command lands at 90 ms.
        match comm.poll([payload], ms) {
            CommAction::Listened(_) => {}
            CommAction::Telemetry { state, sensor } => {
                if let Some(sensor) = sensor {
                    println!("    sensor frame: {:?}", sensor);
                }
                if ms % 200 == 0 {
                    println!("    state frame: {:?}", state);
                }
            }
        }

        let inputs = ControlInputs {
            measurement: Measurement {
                gyro: Vector3::new(roll_rate, 0.0, 0.0),
                altitude: 1.5,
                battery: 12.4,
                dt,
                ..Measurement::default()
            },
            orientation: Orientation(rolled(roll)),
            health: SensorHealth::default(),
            kill_switch: false,
        };
        let output = control.step(&inputs);
        let m = output.motors;

        if ms % 50 == 0 {
            println!(
                "{:8}, {:6.2}, {:6.2}, {:6.3}, {:6.3}, {:6.3}, {:6.3}",
                ms, roll, roll_rate, m[0], m[1], m[2], m[3]
            );
        }

        // Crude rigid-body response: the left/right thrust difference rolls
        // the vehicle.
        let roll_torque = (m[0] + m[3]) - (m[1] + m[2]);
        roll_rate += roll_torque * 4000.0 * dt;
        roll += roll_rate * dt;
    }
}
