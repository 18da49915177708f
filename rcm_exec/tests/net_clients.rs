//! Arm and joystick clients over loopback sockets.
//!
//! Connection state comes from socket monitor events, which zmq only raises for connection
//! oriented transports, so these use TCP rather than `inproc`.

use std::{thread, time::Duration};

use comms_if::{
    eqpt::{
        arm::{ToolVector, POSE_TOPIC, SERVO_TOPIC},
        joy::{JoyButtons, JOY_TOPIC},
    },
    net::{split_topic, with_topic, zmq, NetParams},
};
use rcm_lib::{
    arm_client::ArmClient,
    control_loop::CmdSink,
    joy_client::JoyClient,
    rendezvous::{channel, WaitResult},
};

const POLL: Option<Duration> = Some(Duration::from_millis(10));

fn net_params(base_port: u16) -> NetParams {
    NetParams {
        arm_pose_endpoint: format!("tcp://127.0.0.1:{}", base_port),
        arm_servo_endpoint: format!("tcp://127.0.0.1:{}", base_port + 1),
        joy_endpoint: format!("tcp://127.0.0.1:{}", base_port + 2),
    }
}

#[test]
fn test_arm_client() {
    let ctx = zmq::Context::new();
    let params = net_params(25010);

    let arm_pub = ctx.socket(zmq::PUB).unwrap();
    arm_pub.bind(&params.arm_pose_endpoint).unwrap();

    let (tx, rx) = channel::<ToolVector, JoyButtons>();
    let mut client = ArmClient::new(&ctx, &params, tx).unwrap();

    let arm_sub = ctx.socket(zmq::SUB).unwrap();
    arm_sub.set_subscribe(SERVO_TOPIC.as_bytes()).unwrap();
    arm_sub.set_rcvtimeo(10).unwrap();
    arm_sub.connect(&params.arm_servo_endpoint).unwrap();

    // Publish until the subscription has propagated and the pose arrives
    let pose = ToolVector::new(300.0, 0.0, 200.0, 1.0, 2.0, 3.0);
    let msg = with_topic(POSE_TOPIC, &serde_json::to_string(&pose).unwrap());
    let mut received = None;
    for _ in 0..200 {
        arm_pub.send(&msg, 0).unwrap();
        if let WaitResult::Ready(p) = rx.wait_pose(POLL) {
            received = Some(p);
            break;
        }
    }
    assert_eq!(received, Some(pose));

    // Servo demands reach the arm
    let servo = ToolVector::new(300.0, 0.0, 250.0, 0.0, 0.0, 0.0);
    let mut received = None;
    for _ in 0..200 {
        if client.connected() {
            client.send(&servo).unwrap();
        } else {
            thread::sleep(Duration::from_millis(10));
        }
        if let Ok(Ok(s)) = arm_sub.recv_string(0) {
            received = Some(s);
            break;
        }
    }
    let received = received.unwrap();
    let (topic, payload) = split_topic(&received).unwrap();
    assert_eq!(topic, SERVO_TOPIC);
    assert_eq!(serde_json::from_str::<ToolVector>(payload).unwrap(), servo);

    // Dropping the client drops its producer
    drop(client);
    assert_eq!(rx.num_producers(), 0);
}

#[test]
fn test_joy_client_ignores_releases() {
    let ctx = zmq::Context::new();
    let params = net_params(25020);

    let joy_pub = ctx.socket(zmq::PUB).unwrap();
    joy_pub.bind(&params.joy_endpoint).unwrap();

    let (tx, rx) = channel::<ToolVector, JoyButtons>();
    let client = JoyClient::new(&ctx, &params, tx.clone()).unwrap();

    let release = with_topic(JOY_TOPIC, r#"{"buttons":[0,0,0,0,0,0,0,0]}"#);
    let press = with_topic(JOY_TOPIC, r#"{"buttons":[0,0,0,1,0,0,0,0]}"#);

    let mut pressed = false;
    for _ in 0..200 {
        joy_pub.send(&press, 0).unwrap();
        // Releases sent straight after never clear the press
        joy_pub.send(&release, 0).unwrap();
        thread::sleep(Duration::from_millis(10));

        if rx.input_pending() {
            pressed = true;
            break;
        }
    }
    assert!(pressed);

    // Complete a rendezvous to read back the pending press
    tx.post_pose(ToolVector::default());
    match rx.wait_both(POLL) {
        WaitResult::Ready((_, joy)) => assert!(joy.is_pressed(3)),
        r => panic!("Expected a press, got {:?}", r),
    }

    drop(client);
}
