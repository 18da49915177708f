//! # Control loop
//!
//! Drives [`RcmCtrl`] from the rendezvous of arm pose feedback and operator input:
//!
//! ```text
//! AwaitingInitialPose --pose--> Ready --pose+input--> Cycling --pose+input--> Cycling
//!          |                      |                      |
//!          +----------------------+----------------------+--> Stopped
//! ```
//!
//! The first pose fixes the RCM point. After that each cycle consumes exactly one pose and one
//! input, maps the input onto new demands and sends exactly one command to the arm. The loop stops
//! when the exit button is pressed, when every producer has gone, or on a timeout if the stale
//! input policy says so.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::{
    arm::ToolVector,
    joy::{JoyButtons, NUM_JOY_BUTTONS},
};
use log::{debug, info, warn};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, fmt, time::Duration};

use crate::{
    mapping::{InputMapping, MappingParams},
    rcm_ctrl::{InputData, RcmCtrl, RcmCtrlError},
    rendezvous::{Rendezvous, WaitResult},
};
use util::module::State;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Default index of the button which stops the loop.
pub const DEFAULT_EXIT_BUTTON_IDX: usize = 5;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Destination of the commands produced by the loop.
pub trait CmdSink {
    type Error: fmt::Display;

    fn send(&mut self, cmd: &ToolVector) -> Result<(), Self::Error>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the control loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoopParams {
    /// Index of the joystick button which stops the loop.
    pub exit_button_idx: usize,

    /// Maximum time to wait for a cycle's inputs. No timeout if not set.
    ///
    /// Units: seconds
    pub rendezvous_timeout_s: Option<f64>,

    /// What to do when the timeout elapses.
    pub stale_input_policy: StaleInputPolicy,

    /// Parameters for the default button mapping.
    pub mapping: MappingParams,
}

/// The control loop.
pub struct ControlLoop<M> {
    params: LoopParams,

    timeout: Option<Duration>,

    rcm_ctrl: RcmCtrl,

    mapping: M,

    rendezvous: Rendezvous<ToolVector, JoyButtons>,

    state: LoopState,

    stop_cause: Option<StopCause>,

    num_cycles: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting for the first pose to fix the RCM point.
    AwaitingInitialPose,

    /// RCM point fixed, no cycle completed yet.
    Ready,

    /// At least one command has been produced.
    Cycling,

    /// Terminal.
    Stopped,
}

/// Behaviour when the rendezvous wait times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaleInputPolicy {
    /// Warn, send nothing, and keep waiting.
    Hold,

    /// Stop the loop.
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    ExitButton,
    StaleInput,
    Disconnected,
}

/// Result of a single loop step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The RCM point was fixed at the given base frame position (meters).
    Initialised(Point3<f64>),

    /// A cycle completed and this command was sent.
    Commanded(ToolVector),

    /// The wait timed out and the loop is holding.
    Held,

    /// The loop is stopped.
    Stopped(StopCause),
}

#[derive(Debug, thiserror::Error)]
pub enum ControlLoopError {
    #[error("RcmCtrl error: {0}")]
    RcmCtrlError(#[from] RcmCtrlError),

    #[error("Invalid control loop parameters: {0}")]
    InvalidParams(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for LoopParams {
    fn default() -> Self {
        Self {
            exit_button_idx: DEFAULT_EXIT_BUTTON_IDX,
            rendezvous_timeout_s: None,
            stale_input_policy: StaleInputPolicy::default(),
            mapping: MappingParams::default(),
        }
    }
}

impl LoopParams {
    /// Check the parameters, returning the rendezvous timeout if one is set.
    pub fn validate(&self) -> Result<Option<Duration>, ControlLoopError> {
        if self.exit_button_idx >= NUM_JOY_BUTTONS {
            return Err(ControlLoopError::InvalidParams(format!(
                "exit_button_idx {} is out of range, the joystick has {} buttons",
                self.exit_button_idx, NUM_JOY_BUTTONS
            )));
        }

        for idx in self.mapping.button_indices().iter() {
            if *idx >= NUM_JOY_BUTTONS {
                return Err(ControlLoopError::InvalidParams(format!(
                    "Mapping button index {} is out of range",
                    idx
                )));
            }
            if *idx == self.exit_button_idx {
                return Err(ControlLoopError::InvalidParams(format!(
                    "Button {} is mapped to both exit and a demand",
                    idx
                )));
            }
        }

        let m = &self.mapping;
        for (name, val) in [
            ("angle_step_deg", m.angle_step_deg),
            ("trans_step_m", m.trans_step_m),
            ("max_abs_angle_deg", m.max_abs_angle_deg),
            ("max_abs_trans_m", m.max_abs_trans_m),
        ]
        .iter()
        {
            if !(val.is_finite() && *val >= 0.0) {
                return Err(ControlLoopError::InvalidParams(format!(
                    "{} must be a non-negative number, got {}",
                    name, val
                )));
            }
        }

        match self.rendezvous_timeout_s {
            Some(t) if t > 0.0 => Duration::try_from_secs_f64(t).map(Some).map_err(|e| {
                ControlLoopError::InvalidParams(format!(
                    "rendezvous_timeout_s of {} s is not a valid duration: {}",
                    t, e
                ))
            }),
            Some(t) => Err(ControlLoopError::InvalidParams(format!(
                "rendezvous_timeout_s must be positive, got {}",
                t
            ))),
            None => Ok(None),
        }
    }
}

impl Default for StaleInputPolicy {
    fn default() -> Self {
        StaleInputPolicy::Hold
    }
}

impl fmt::Display for StopCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopCause::ExitButton => write!(f, "exit button pressed"),
            StopCause::StaleInput => write!(f, "inputs timed out"),
            StopCause::Disconnected => write!(f, "all inputs disconnected"),
        }
    }
}

impl CmdSink for Vec<ToolVector> {
    type Error = Infallible;

    fn send(&mut self, cmd: &ToolVector) -> Result<(), Self::Error> {
        self.push(*cmd);
        Ok(())
    }
}

impl<M> ControlLoop<M>
where
    M: InputMapping,
{
    /// Create a new loop.
    ///
    /// If `rcm_ctrl` already has an RCM point the loop starts `Ready` and never waits for an
    /// initial pose.
    pub fn new(
        params: LoopParams,
        rcm_ctrl: RcmCtrl,
        mapping: M,
        rendezvous: Rendezvous<ToolVector, JoyButtons>,
    ) -> Result<Self, ControlLoopError> {
        let timeout = params.validate()?;

        let state = match rcm_ctrl.is_initialised() {
            true => LoopState::Ready,
            false => LoopState::AwaitingInitialPose,
        };

        Ok(Self {
            params,
            timeout,
            rcm_ctrl,
            mapping,
            rendezvous,
            state,
            stop_cause: None,
            num_cycles: 0,
        })
    }

    /// Run a single step of the loop, blocking until it can progress.
    pub fn step<S>(&mut self, sink: &mut S) -> Result<StepOutcome, ControlLoopError>
    where
        S: CmdSink,
    {
        match self.state {
            LoopState::Stopped => Ok(StepOutcome::Stopped(
                self.stop_cause.unwrap_or(StopCause::Disconnected),
            )),
            LoopState::AwaitingInitialPose => match self.rendezvous.wait_pose(self.timeout) {
                WaitResult::Ready(tool) => {
                    let rcm_point_m_base = self.rcm_ctrl.init_rcm_point(&tool)?;
                    self.state = LoopState::Ready;
                    Ok(StepOutcome::Initialised(rcm_point_m_base))
                }
                WaitResult::TimedOut => Ok(self.on_timeout()),
                WaitResult::Disconnected => Ok(self.stop(StopCause::Disconnected)),
            },
            LoopState::Ready | LoopState::Cycling => match self.rendezvous.wait_both(self.timeout) {
                WaitResult::Ready((pose, joy)) => self.cycle(&pose, &joy, sink),
                WaitResult::TimedOut => Ok(self.on_timeout()),
                WaitResult::Disconnected => Ok(self.stop(StopCause::Disconnected)),
            },
        }
    }

    /// Run the loop until it stops.
    pub fn run<S>(&mut self, sink: &mut S) -> Result<StopCause, ControlLoopError>
    where
        S: CmdSink,
    {
        info!("Control loop running, exit button is {}", self.params.exit_button_idx);

        loop {
            if let StepOutcome::Stopped(cause) = self.step(sink)? {
                info!("Control loop stopped after {} cycles", self.num_cycles);
                return Ok(cause);
            }
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Number of completed cycles, equal to the number of commands produced.
    pub fn num_cycles(&self) -> u64 {
        self.num_cycles
    }

    pub fn rcm_ctrl(&self) -> &RcmCtrl {
        &self.rcm_ctrl
    }

    pub fn params(&self) -> &LoopParams {
        &self.params
    }

    fn cycle<S>(
        &mut self,
        pose: &ToolVector,
        joy: &JoyButtons,
        sink: &mut S,
    ) -> Result<StepOutcome, ControlLoopError>
    where
        S: CmdSink,
    {
        if joy.is_pressed(self.params.exit_button_idx) {
            return Ok(self.stop(StopCause::ExitButton));
        }

        debug!("Cycle {}: arm at {}, buttons {:?}", self.num_cycles, pose, joy.buttons);

        let dems = self.mapping.map(self.rcm_ctrl.dems(), joy);
        let (cmd, report) = self.rcm_ctrl.proc(&InputData { dems })?;

        if report.euler_singular {
            warn!("Commanded attitude is at the Euler singularity");
        }

        if let Err(e) = sink.send(&cmd) {
            warn!("Could not send command {}: {}", cmd, e);
        }

        self.num_cycles += 1;
        self.state = LoopState::Cycling;

        Ok(StepOutcome::Commanded(cmd))
    }

    fn on_timeout(&mut self) -> StepOutcome {
        match self.params.stale_input_policy {
            StaleInputPolicy::Hold => {
                warn!(
                    "No fresh inputs within {:?} while {:?}, holding",
                    self.timeout, self.state
                );
                StepOutcome::Held
            }
            StaleInputPolicy::Stop => self.stop(StopCause::StaleInput),
        }
    }

    fn stop(&mut self, cause: StopCause) -> StepOutcome {
        info!("Control loop stopping: {}", cause);
        self.state = LoopState::Stopped;
        self.stop_cause = Some(cause);
        StepOutcome::Stopped(cause)
    }
}
