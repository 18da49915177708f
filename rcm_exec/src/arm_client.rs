//! # Arm Client
//!
//! Connects the RCM executable to the arm controller. The arm publishes its tool pose as often as
//! it can; a background thread receives these and posts them to the control loop's rendezvous.
//! Servo demands go the other way on a publisher owned by this client, which is also the control
//! loop's [`CmdSink`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use comms_if::{
    eqpt::{
        arm::{ToolVector, POSE_TOPIC, SERVO_TOPIC},
        joy::JoyButtons,
    },
    net::{
        split_topic, with_topic, zmq, MonitoredSocket, MonitoredSocketError, NetParams,
        SocketOptions,
    },
};
use log::{error, trace, warn};

use crate::{control_loop::CmdSink, rendezvous::RendezvousSender};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct ArmClient {
    servo_socket: MonitoredSocket,

    bg_jh: Option<JoinHandle<()>>,

    bg_run: Arc<AtomicBool>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ArmClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("The arm is not connected")]
    NotConnected,

    #[error("Could not send servo demands to the arm: {0}")]
    SendError(zmq::Error),

    #[error("Could not serialize the servo demands: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not deserialize the pose from the arm: {0}")]
    DeserializeError(serde_json::Error),

    #[error("Unexpected message from the arm: {0:?}")]
    UnexpectedMessage(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ArmClient {
    /// Create a new instance of the arm client.
    ///
    /// Poses received from the arm are posted into `rendezvous` until the client is dropped.
    pub fn new(
        ctx: &zmq::Context,
        params: &NetParams,
        rendezvous: RendezvousSender<ToolVector, JoyButtons>,
    ) -> Result<Self, ArmClientError> {
        let pose_socket_options = SocketOptions {
            subscriptions: vec![POSE_TOPIC.into()],
            conflate: true,
            linger: 1,
            recv_timeout: 100,
            ..Default::default()
        };
        let servo_socket_options = SocketOptions {
            bind: true,
            linger: 1,
            send_timeout: 10,
            ..Default::default()
        };

        let pose_socket = MonitoredSocket::new(
            ctx,
            zmq::SUB,
            pose_socket_options,
            &params.arm_pose_endpoint,
        )
        .map_err(ArmClientError::SocketError)?;
        let servo_socket = MonitoredSocket::new(
            ctx,
            zmq::PUB,
            servo_socket_options,
            &params.arm_servo_endpoint,
        )
        .map_err(ArmClientError::SocketError)?;

        let bg_run = Arc::new(AtomicBool::new(true));
        let bg_run_clone = bg_run.clone();

        let bg_jh = Some(thread::spawn(move || {
            bg_thread(pose_socket, bg_run_clone, rendezvous)
        }));

        Ok(Self {
            servo_socket,
            bg_jh,
            bg_run,
        })
    }

    /// Publish a servo demand to the arm.
    pub fn send_servo(&mut self, tool: &ToolVector) -> Result<(), ArmClientError> {
        if !self.servo_socket.connected() {
            return Err(ArmClientError::NotConnected);
        }

        let payload = serde_json::to_string(tool).map_err(ArmClientError::SerializationError)?;

        self.servo_socket
            .send(&with_topic(SERVO_TOPIC, &payload), 0)
            .map_err(ArmClientError::SendError)
    }

    /// True while the arm is subscribed to servo demands.
    pub fn connected(&self) -> bool {
        self.servo_socket.connected()
    }
}

impl CmdSink for ArmClient {
    type Error = ArmClientError;

    fn send(&mut self, cmd: &ToolVector) -> Result<(), Self::Error> {
        self.send_servo(cmd)
    }
}

impl Drop for ArmClient {
    fn drop(&mut self) {
        self.bg_run.store(false, Ordering::Relaxed);

        if let Some(jh) = self.bg_jh.take() {
            jh.join().ok();
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Decode a pose message published by the arm.
pub fn parse_pose_msg(msg: &str) -> Result<ToolVector, ArmClientError> {
    match split_topic(msg) {
        Some((POSE_TOPIC, payload)) => {
            serde_json::from_str(payload).map_err(ArmClientError::DeserializeError)
        }
        _ => Err(ArmClientError::UnexpectedMessage(msg.into())),
    }
}

/// Background thread, posts every pose published by the arm to the rendezvous.
fn bg_thread(
    socket: MonitoredSocket,
    run: Arc<AtomicBool>,
    rendezvous: RendezvousSender<ToolVector, JoyButtons>,
) {
    while run.load(Ordering::Relaxed) {
        let msg = match socket.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => {
                warn!("Non UTF-8 message from the arm");
                continue;
            }
            Err(zmq::Error::EAGAIN) => continue,
            Err(e) => {
                error!("Error receiving message from the arm: {}", e);
                break;
            }
        };

        match parse_pose_msg(&msg) {
            Ok(pose) => {
                trace!("Arm pose: {}", pose);
                rendezvous.post_pose(pose);
            }
            Err(e) => warn!("{}", e),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_pose_msg() {
        let pose = parse_pose_msg(
            r#"pose {"x":300.0,"y":0.0,"z":200.0,"rx":0.0,"ry":0.0,"rz":90.0}"#,
        )
        .unwrap();
        assert_eq!(pose, ToolVector::new(300.0, 0.0, 200.0, 0.0, 0.0, 90.0));

        assert!(matches!(
            parse_pose_msg(r#"pose {"x":300.0}"#),
            Err(ArmClientError::DeserializeError(_))
        ));
        assert!(matches!(
            parse_pose_msg(r#"servo {"x":300.0,"y":0.0,"z":200.0,"rx":0.0,"ry":0.0,"rz":0.0}"#),
            Err(ArmClientError::UnexpectedMessage(_))
        ));
        assert!(matches!(
            parse_pose_msg("pose"),
            Err(ArmClientError::UnexpectedMessage(_))
        ));
    }
}
