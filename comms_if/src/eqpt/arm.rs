//! # Arm Equipment Messages
//!
//! The arm controller reports the tool pose and accepts servo demands in the same convention:
//! position in millimeters and orientation as `rx`, `ry`, `rz` in degrees, where the rotation
//! matrix is `Rz(rz) * Ry(ry) * Rx(rx)`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Topic prefix of tool pose feedback messages published by the arm.
pub const POSE_TOPIC: &str = "pose";

/// Topic prefix of servo demands sent to the arm.
pub const SERVO_TOPIC: &str = "servo";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Pose of the tool in the arm base frame.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct ToolVector {
    /// Units: millimeters
    pub x: f64,
    /// Units: millimeters
    pub y: f64,
    /// Units: millimeters
    pub z: f64,

    /// Rotation about the base X axis, applied first.
    ///
    /// Units: degrees
    pub rx: f64,

    /// Units: degrees
    pub ry: f64,

    /// Rotation about the base Z axis, applied last.
    ///
    /// Units: degrees
    pub rz: f64,
}

impl ToolVector {
    pub fn new(x: f64, y: f64, z: f64, rx: f64, ry: f64, rz: f64) -> Self {
        Self { x, y, z, rx, ry, rz }
    }
}

impl std::fmt::Display for ToolVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:.3} {:.3} {:.3} mm, {:.3} {:.3} {:.3} deg]",
            self.x, self.y, self.z, self.rx, self.ry, self.rz
        )
    }
}
