//! Remote centre of motion control module
//!
//! Keeps the tool shaft pivoting through a fixed point in space. The point is found once from the
//! first pose reported by the arm, after which every demand of pivot angles and shaft translation
//! is turned into a full end-effector pose that passes through it.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod model;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Point3;

// Internal
pub use model::*;
pub use params::*;
pub use state::*;
use util::params::LoadError;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default distance from the end-effector origin to the RCM point along the shaft.
///
/// Units: meters
pub const DEFAULT_SHAFT_LENGTH_M: f64 = 0.343;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during RcmCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum RcmCtrlError {
    #[error("The RCM point is already initialised at {0}, reset before pivoting again")]
    AlreadyInitialised(Point3<f64>),

    #[error("The RCM point has not been initialised")]
    NotInitialised,

    #[error("Could not load the RcmCtrl parameters: {0}")]
    ParamLoadError(LoadError),

    #[error("Invalid RcmCtrl parameters: {0}")]
    InvalidParams(String),
}
