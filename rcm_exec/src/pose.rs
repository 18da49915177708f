//! # End-effector pose
//!
//! The pose of the end-effector (tool) in the arm base frame, in SI units. Conversion to and from
//! the arm's [`ToolVector`] (millimeters and degrees) happens here and nowhere else.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::arm::ToolVector;
use nalgebra::{Matrix3, Rotation3, Vector3};
use util::maths::{m_to_mm, mm_to_m};

use crate::{
    euler::{from_angles, EulerAngles, EulerCodec, EulerConvention},
    transform::RigidTransform,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Maximum deviation of `R^T * R` from identity, and of `det(R)` from one, for a matrix to be
/// accepted as a rotation.
pub const ROTATION_TOLERANCE: f64 = 1e-6;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The pose of the end-effector frame in the base frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Position of the end-effector origin.
    ///
    /// Units: meters,
    /// Frame: Base
    pub position_m: Vector3<f64>,

    /// Rotation taking end-effector frame vectors into the base frame.
    pub attitude: Rotation3<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PoseError {
    #[error(
        "Matrix is not a rotation (orthonormality error {orthonormality_error:e}, determinant \
         {determinant})"
    )]
    NotARotation {
        orthonormality_error: f64,
        determinant: f64,
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Pose {
    pub fn new(position_m: Vector3<f64>, attitude: Rotation3<f64>) -> Self {
        Self {
            position_m,
            attitude,
        }
    }

    /// Build a pose from an arbitrary attitude matrix, rejecting anything that isn't a proper
    /// rotation.
    pub fn from_matrix(
        position_m: Vector3<f64>,
        attitude: &Matrix3<f64>,
    ) -> Result<Self, PoseError> {
        let orthonormality_error = (attitude.transpose() * attitude - Matrix3::identity())
            .abs()
            .max();
        let determinant = attitude.determinant();

        if !(orthonormality_error < ROTATION_TOLERANCE)
            || !((determinant - 1.0).abs() < ROTATION_TOLERANCE)
        {
            return Err(PoseError::NotARotation {
                orthonormality_error,
                determinant,
            });
        }

        Ok(Self::new(
            position_m,
            Rotation3::from_matrix_unchecked(*attitude),
        ))
    }

    /// Convert the arm's tool vector into a pose, interpreting the angles in the given
    /// convention.
    pub fn from_tool_vector(tool: &ToolVector, convention: EulerConvention) -> Self {
        let angles = convention.angles_from_rxyz(
            tool.rx.to_radians(),
            tool.ry.to_radians(),
            tool.rz.to_radians(),
        );

        Self {
            position_m: Vector3::new(mm_to_m(tool.x), mm_to_m(tool.y), mm_to_m(tool.z)),
            attitude: from_angles(&angles, convention),
        }
    }

    /// Convert the pose into the arm's tool vector.
    pub fn to_tool_vector(&self, codec: &EulerCodec) -> ToolVector {
        let angles = codec.to_euler(self.attitude.matrix());
        tool_vector(&self.position_m, &angles, codec.convention)
    }

    /// The transform from the end-effector frame to the base frame.
    pub fn to_transform(&self) -> RigidTransform {
        RigidTransform::new(&self.attitude, &self.position_m)
    }

    pub fn from_transform(transform: &RigidTransform) -> Self {
        Self {
            position_m: transform.translation(),
            attitude: transform.rotation(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build a tool vector from a position in meters and Euler angles in radians.
pub fn tool_vector(
    position_m: &Vector3<f64>,
    angles: &EulerAngles,
    convention: EulerConvention,
) -> ToolVector {
    let [rx, ry, rz] = convention.rxyz_from_angles(&angles.angles_rad);

    ToolVector {
        x: m_to_mm(position_m[0]),
        y: m_to_mm(position_m[1]),
        z: m_to_mm(position_m[2]),
        rx: rx.to_degrees(),
        ry: ry.to_degrees(),
        rz: rz.to_degrees(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn assert_tool_eq(a: &ToolVector, b: &ToolVector, tol: f64) {
        let diffs = [a.x - b.x, a.y - b.y, a.z - b.z, a.rx - b.rx, a.ry - b.ry, a.rz - b.rz];
        assert!(
            diffs.iter().all(|d| d.abs() < tol),
            "{} != {} (tolerance {})",
            a,
            b,
            tol
        );
    }

    #[test]
    fn test_tool_vector_units() {
        let tool = ToolVector::new(300.0, -25.0, 200.0, 0.0, 0.0, 90.0);
        let pose = Pose::from_tool_vector(&tool, EulerConvention::Zyx);

        assert!((pose.position_m - Vector3::new(0.3, -0.025, 0.2)).norm() < 1e-12);

        // 90 degrees about Z takes the tool X axis onto base Y
        let x_base = pose.attitude * Vector3::x();
        assert!((x_base - Vector3::y()).norm() < 1e-12);
    }

    #[test]
    fn test_tool_vector_round_trip() {
        let codec = EulerCodec::default();
        let tools = [
            ToolVector::new(300.0, 0.0, 200.0, 0.0, 0.0, 0.0),
            ToolVector::new(-120.5, 431.0, 95.25, 179.0, -10.0, 45.0),
            ToolVector::new(10.0, 20.0, 30.0, -35.0, 60.0, -150.0),
        ];

        for tool in tools.iter() {
            let pose = Pose::from_tool_vector(tool, codec.convention);
            assert_tool_eq(&pose.to_tool_vector(&codec), tool, 1e-9);
        }

        let codec = EulerCodec::new(EulerConvention::Xyz, 1e-12);
        let pose = Pose::from_tool_vector(&tools[2], codec.convention);
        assert_tool_eq(&pose.to_tool_vector(&codec), &tools[2], 1e-9);
    }

    #[test]
    fn test_zyx_rotation_order() {
        // The arm convention applies rx first, then ry, then rz, about the base axes
        let tool = ToolVector::new(0.0, 0.0, 0.0, 30.0, 20.0, 10.0);
        let pose = Pose::from_tool_vector(&tool, EulerConvention::Zyx);

        let expected = Rotation3::from_axis_angle(&Vector3::z_axis(), 10f64.to_radians())
            * Rotation3::from_axis_angle(&Vector3::y_axis(), 20f64.to_radians())
            * Rotation3::from_axis_angle(&Vector3::x_axis(), 30f64.to_radians());

        assert!((pose.attitude.matrix() - expected.matrix()).abs().max() < 1e-12);
    }

    #[test]
    fn test_from_matrix_validation() {
        let rot = Rotation3::from_axis_angle(&Vector3::y_axis(), 0.5);
        assert!(Pose::from_matrix(Vector3::zeros(), rot.matrix()).is_ok());

        // Scaled matrix
        let scaled = rot.matrix() * 1.01;
        assert!(matches!(
            Pose::from_matrix(Vector3::zeros(), &scaled),
            Err(PoseError::NotARotation { .. })
        ));

        // Reflection is orthonormal but has a negative determinant
        let reflection = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, -1.0));
        assert!(Pose::from_matrix(Vector3::zeros(), &reflection).is_err());

        // NaN never passes
        let nan = Matrix3::from_element(f64::NAN);
        assert!(Pose::from_matrix(Vector3::zeros(), &nan).is_err());
    }

    #[test]
    fn test_transform_round_trip() {
        let pose = Pose::from_tool_vector(
            &ToolVector::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0),
            EulerConvention::Zyx,
        );
        assert_eq!(Pose::from_transform(&pose.to_transform()), pose);
    }
}
