//! # Joystick Client
//!
//! Receives joystick button states and posts them to the control loop as input events. A message
//! with no button pressed is not an event and is dropped, so it can never replace a press that the
//! loop hasn't consumed yet.

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
        arm::ToolVector,
        joy::{JoyButtons, JOY_TOPIC},
    },
    net::{split_topic, zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
};
use log::{debug, error, warn};

use crate::rendezvous::RendezvousSender;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct JoyClient {
    bg_jh: Option<JoinHandle<()>>,
    bg_run: Arc<AtomicBool>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum JoyClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not deserialize the joystick message: {0}")]
    DeserializeError(serde_json::Error),

    #[error("Unexpected message from the joystick: {0:?}")]
    UnexpectedMessage(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl JoyClient {
    /// Create a new instance of the joystick client, posting events into `rendezvous`.
    pub fn new(
        ctx: &zmq::Context,
        params: &NetParams,
        rendezvous: RendezvousSender<ToolVector, JoyButtons>,
    ) -> Result<Self, JoyClientError> {
        let socket_options = SocketOptions {
            subscriptions: vec![JOY_TOPIC.into()],
            linger: 1,
            recv_timeout: 100,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(ctx, zmq::SUB, socket_options, &params.joy_endpoint)
            .map_err(JoyClientError::SocketError)?;

        let bg_run = Arc::new(AtomicBool::new(true));
        let bg_run_clone = bg_run.clone();

        let bg_jh = Some(thread::spawn(move || {
            bg_thread(socket, bg_run_clone, rendezvous)
        }));

        Ok(Self { bg_jh, bg_run })
    }
}

impl Drop for JoyClient {
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

/// Decode a joystick message.
///
/// Returns `Ok(None)` if no button is pressed.
pub fn parse_joy_msg(msg: &str) -> Result<Option<JoyButtons>, JoyClientError> {
    let buttons: JoyButtons = match split_topic(msg) {
        Some((JOY_TOPIC, payload)) => {
            serde_json::from_str(payload).map_err(JoyClientError::DeserializeError)?
        }
        _ => return Err(JoyClientError::UnexpectedMessage(msg.into())),
    };

    Ok(match buttons.any_pressed() {
        true => Some(buttons),
        false => None,
    })
}

/// Background thread, posts every joystick press to the rendezvous.
fn bg_thread(
    socket: MonitoredSocket,
    run: Arc<AtomicBool>,
    rendezvous: RendezvousSender<ToolVector, JoyButtons>,
) {
    while run.load(Ordering::Relaxed) {
        let msg = match socket.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => {
                warn!("Non UTF-8 message from the joystick");
                continue;
            }
            Err(zmq::Error::EAGAIN) => continue,
            Err(e) => {
                error!("Error receiving message from the joystick: {}", e);
                break;
            }
        };

        match parse_joy_msg(&msg) {
            Ok(Some(buttons)) => {
                debug!("Joystick event: {:?}", buttons.buttons);
                rendezvous.post_input(buttons);
            }
            Ok(None) => (),
            Err(e) => warn!("{}", e),
        }
    }
}
