//! Simulated arm for network testing.
//!
//! Publishes a tool pose at a fixed rate and moves it to every servo demand it receives, so the
//! RCM executable can be exercised without hardware.
//!
//! Usage: `sim_arm [pose_bind_endpoint] [servo_connect_endpoint]`

use comms_if::{
    eqpt::arm::{ToolVector, POSE_TOPIC, SERVO_TOPIC},
    net::{split_topic, with_topic, MonitoredSocket, SocketOptions},
};

/// Pose published before any servo demand arrives.
const INITIAL_POSE: ToolVector = ToolVector {
    x: 300.0,
    y: 0.0,
    z: 200.0,
    rx: 0.0,
    ry: 0.0,
    rz: 0.0,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let pose_endpoint = args.get(1).map(String::as_str).unwrap_or("tcp://*:5010");
    let servo_endpoint = args.get(2).map(String::as_str).unwrap_or("tcp://localhost:5011");

    let ctx = zmq::Context::new();

    let pose_socket = MonitoredSocket::new(
        &ctx,
        zmq::PUB,
        SocketOptions {
            bind: true,
            ..Default::default()
        },
        pose_endpoint,
    )?;

    let servo_socket = MonitoredSocket::new(
        &ctx,
        zmq::SUB,
        SocketOptions {
            subscriptions: vec![SERVO_TOPIC.into()],
            recv_timeout: 20,
            ..Default::default()
        },
        servo_endpoint,
    )?;

    println!("Simulated arm publishing on {}", pose_endpoint);

    let mut pose = INITIAL_POSE;

    loop {
        // Drain all pending servo demands, keeping the latest
        loop {
            match servo_socket.recv_string(0) {
                Ok(Ok(msg)) => match split_topic(&msg) {
                    Some((_, payload)) => match serde_json::from_str::<ToolVector>(payload) {
                        Ok(p) => pose = p,
                        Err(e) => println!("Invalid servo demand: {}", e),
                    },
                    None => println!("Servo message without a topic"),
                },
                Ok(Err(_)) => println!("Non UTF-8 servo message"),
                Err(zmq::Error::EAGAIN) => break,
                Err(e) => return Err(e.into()),
            }
        }

        let msg = with_topic(POSE_TOPIC, &serde_json::to_string(&pose)?);
        if let Err(e) = pose_socket.send(&msg, 0) {
            println!("Failed to publish pose: {}", e)
        }

        std::thread::sleep(std::time::Duration::from_millis(20));
    }
}
