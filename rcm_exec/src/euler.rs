//! # Euler angle codec
//!
//! Converts rotation matrices to and from a triple of elementary rotations about named axes.
//!
//! Two conventions are supported, both named by the order in which the elementary rotations are
//! multiplied together:
//!
//! - [`EulerConvention::Zyx`]: `R = Rz(a1) * Ry(a2) * Rx(a3)`, i.e. `a1` is yaw, `a2` is pitch and
//!   `a3` is roll. This is the convention used by the arm controller.
//! - [`EulerConvention::Xyz`]: `R = Rx(a1) * Ry(a2) * Rz(a3)`.
//!
//! In both conventions the middle angle reaching +/-90 degrees is a singularity (gimbal lock) in
//! which the first and last rotations act about the same axis. In that case the first angle is
//! fixed to zero and the whole rotation is carried by the other two, read directly from the
//! matrix entries.
//!
//! Input matrices must be valid rotations, the output for anything else is meaningless but will
//! never panic.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Matrix3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Magnitude below which matrix entries are considered zero when testing for the singularity.
pub const DEFAULT_SINGULARITY_THRESHOLD: f64 = 1e-12;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Supported Euler angle conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EulerConvention {
    /// `R = Rx(a1) * Ry(a2) * Rz(a3)`
    Xyz,

    /// `R = Rz(a1) * Ry(a2) * Rx(a3)`
    Zyx,
}

#[derive(Debug, thiserror::Error)]
pub enum EulerConventionError {
    #[error("Unknown Euler convention \"{0}\", expected \"xyz\" or \"zyx\"")]
    Unknown(String),
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A triple of Euler angles in the order given by the convention they were computed with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EulerAngles {
    /// Units: radians
    pub angles_rad: Vector3<f64>,

    /// True if the rotation was at the convention's singularity, in which case the first angle is
    /// zero by definition.
    pub singular: bool,
}

/// Euler codec configured with a convention and a singularity threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EulerCodec {
    pub convention: EulerConvention,

    /// Entries with a magnitude below this value are treated as zero when testing for the
    /// singularity.
    pub singularity_threshold: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl EulerConvention {
    /// Arrange the arm's `rx`, `ry`, `rz` angles into this convention's `(a1, a2, a3)` order.
    pub fn angles_from_rxyz(&self, rx: f64, ry: f64, rz: f64) -> Vector3<f64> {
        match self {
            EulerConvention::Xyz => Vector3::new(rx, ry, rz),
            EulerConvention::Zyx => Vector3::new(rz, ry, rx),
        }
    }

    /// Arrange `(a1, a2, a3)` in this convention into `[rx, ry, rz]`.
    pub fn rxyz_from_angles(&self, angles: &Vector3<f64>) -> [f64; 3] {
        match self {
            EulerConvention::Xyz => [angles[0], angles[1], angles[2]],
            EulerConvention::Zyx => [angles[2], angles[1], angles[0]],
        }
    }
}

impl Default for EulerConvention {
    fn default() -> Self {
        EulerConvention::Zyx
    }
}

impl FromStr for EulerConvention {
    type Err = EulerConventionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xyz" => Ok(EulerConvention::Xyz),
            "zyx" => Ok(EulerConvention::Zyx),
            _ => Err(EulerConventionError::Unknown(s.into())),
        }
    }
}

impl fmt::Display for EulerConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EulerConvention::Xyz => write!(f, "xyz"),
            EulerConvention::Zyx => write!(f, "zyx"),
        }
    }
}

impl EulerCodec {
    pub fn new(convention: EulerConvention, singularity_threshold: f64) -> Self {
        Self {
            convention,
            singularity_threshold,
        }
    }

    /// Decompose a rotation matrix into Euler angles.
    pub fn to_euler(&self, rot: &Matrix3<f64>) -> EulerAngles {
        let eps = self.singularity_threshold;

        match self.convention {
            EulerConvention::Xyz => {
                if rot[(2, 2)].abs() < eps && rot[(1, 2)].abs() < eps {
                    EulerAngles {
                        angles_rad: Vector3::new(
                            0.0,
                            rot[(0, 2)].atan2(rot[(2, 2)]),
                            rot[(1, 0)].atan2(rot[(1, 1)]),
                        ),
                        singular: true,
                    }
                } else {
                    let a1 = (-rot[(1, 2)]).atan2(rot[(2, 2)]);
                    let (s, c) = a1.sin_cos();
                    let a2 = rot[(0, 2)].atan2(c * rot[(2, 2)] - s * rot[(1, 2)]);
                    let a3 = (-rot[(0, 1)]).atan2(rot[(0, 0)]);

                    EulerAngles {
                        angles_rad: Vector3::new(a1, a2, a3),
                        singular: false,
                    }
                }
            }
            EulerConvention::Zyx => {
                if rot[(0, 0)].abs() < eps && rot[(1, 0)].abs() < eps {
                    EulerAngles {
                        angles_rad: Vector3::new(
                            0.0,
                            (-rot[(2, 0)]).atan2(rot[(0, 0)]),
                            (-rot[(1, 2)]).atan2(rot[(1, 1)]),
                        ),
                        singular: true,
                    }
                } else {
                    let a1 = rot[(1, 0)].atan2(rot[(0, 0)]);
                    let (s, c) = a1.sin_cos();
                    let a2 = (-rot[(2, 0)]).atan2(c * rot[(0, 0)] + s * rot[(1, 0)]);
                    let a3 = (s * rot[(0, 2)] - c * rot[(1, 2)])
                        .atan2(c * rot[(1, 1)] - s * rot[(0, 1)]);

                    EulerAngles {
                        angles_rad: Vector3::new(a1, a2, a3),
                        singular: false,
                    }
                }
            }
        }
    }

    /// Compose the elementary rotations described by `angles_rad`.
    pub fn from_angles(&self, angles_rad: &Vector3<f64>) -> Rotation3<f64> {
        from_angles(angles_rad, self.convention)
    }
}

impl Default for EulerCodec {
    fn default() -> Self {
        Self::new(EulerConvention::default(), DEFAULT_SINGULARITY_THRESHOLD)
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Decompose a rotation matrix into Euler angles using the default singularity threshold.
pub fn to_euler(rot: &Matrix3<f64>, convention: EulerConvention) -> EulerAngles {
    EulerCodec::new(convention, DEFAULT_SINGULARITY_THRESHOLD).to_euler(rot)
}

/// Compose the elementary rotations described by `angles_rad` in the given convention.
pub fn from_angles(angles_rad: &Vector3<f64>, convention: EulerConvention) -> Rotation3<f64> {
    let rx = |a: f64| Rotation3::from_axis_angle(&Vector3::x_axis(), a);
    let ry = |a: f64| Rotation3::from_axis_angle(&Vector3::y_axis(), a);
    let rz = |a: f64| Rotation3::from_axis_angle(&Vector3::z_axis(), a);

    match convention {
        EulerConvention::Xyz => rx(angles_rad[0]) * ry(angles_rad[1]) * rz(angles_rad[2]),
        EulerConvention::Zyx => rz(angles_rad[0]) * ry(angles_rad[1]) * rx(angles_rad[2]),
    }
}
