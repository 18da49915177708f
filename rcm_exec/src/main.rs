//! Main RCM teleoperation executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise session, logging and parameters
//!     - Initialise RcmCtrl
//!     - Connect the arm and joystick clients to the rendezvous
//!     - Control loop:
//!         - Wait for the first arm pose and fix the RCM point
//!         - Wait for a fresh arm pose and joystick press
//!         - Map the press onto new RCM demands
//!         - RcmCtrl processing
//!         - Send the servo demand to the arm
//!     - Stop when the exit button is pressed or the inputs go away

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::info;

// Internal
use comms_if::net::{zmq, NetParams};
use rcm_lib::{
    arm_client::ArmClient,
    control_loop::{ControlLoop, LoopParams},
    joy_client::JoyClient,
    mapping::ButtonMapping,
    rcm_ctrl::RcmCtrl,
    rendezvous,
};
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("rcm_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    info!("RCM Teleoperation Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams =
        util::params::load("net.toml").wrap_err("Could not load net params")?;
    let loop_params: LoopParams =
        util::params::load("control_loop.toml").wrap_err("Could not load control loop params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut rcm_ctrl = RcmCtrl::default();
    rcm_ctrl
        .init("rcm_ctrl.toml")
        .wrap_err("Failed to initialise RcmCtrl")?;
    info!("RcmCtrl init complete");

    let mapping = ButtonMapping::new(loop_params.mapping.clone());

    info!("Module initialisation complete\n");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let (rendezvous_tx, rendezvous_rx) = rendezvous::channel();
    let zmq_ctx = zmq::Context::new();

    let mut arm_client = ArmClient::new(&zmq_ctx, &net_params, rendezvous_tx.clone())
        .wrap_err("Failed to initialise ArmClient")?;
    info!("ArmClient initialised");

    let joy_client = JoyClient::new(&zmq_ctx, &net_params, rendezvous_tx)
        .wrap_err("Failed to initialise JoyClient")?;
    info!("JoyClient initialised");

    info!("Network initialisation complete\n");

    // ---- MAIN LOOP ----

    let mut control_loop = ControlLoop::new(loop_params, rcm_ctrl, mapping, rendezvous_rx)
        .wrap_err("Failed to create the control loop")?;

    info!("Waiting for the initial arm pose");

    let cause = control_loop
        .run(&mut arm_client)
        .wrap_err("Error in the control loop")?;

    info!(
        "Stopped ({}) after {} cycles",
        cause,
        control_loop.num_cycles()
    );

    // ---- SHUTDOWN ----

    drop(joy_client);
    drop(arm_client);

    info!("End of execution");

    Ok(())
}
