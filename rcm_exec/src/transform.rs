//! # Rigid transforms
//!
//! 4x4 homogeneous transforms made of a rotation block and a translation block. Transforms are
//! named after the frames they chain, so `T_base_end` maps points expressed in the end-effector
//! frame into the base frame, and `T_base_end.compose(&T_end_rcm) == T_base_rcm`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Matrix3, Matrix4, Point3, Rotation3, Vector3};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A homogeneous rigid body transform.
///
/// The bottom row is always `(0, 0, 0, 1)`. The only ways to build a transform are from a
/// rotation and translation or by composing other transforms, both of which preserve it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    matrix: Matrix4<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RigidTransform {
    /// Build a transform from its rotation and translation blocks.
    pub fn new(rotation: &Rotation3<f64>, translation: &Vector3<f64>) -> Self {
        let mut matrix = Matrix4::identity();
        matrix
            .fixed_view_mut::<3, 3>(0, 0)
            .copy_from(rotation.matrix());
        matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(translation);

        Self { matrix }
    }

    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Chain `other` after `self`, i.e. `other` is expressed in the frame `self` maps from.
    ///
    /// Returns the new transform `self * other`.
    pub fn compose(&self, other: &RigidTransform) -> RigidTransform {
        RigidTransform {
            matrix: self.matrix * other.matrix,
        }
    }

    /// The rotation block.
    pub fn rotation(&self) -> Rotation3<f64> {
        Rotation3::from_matrix_unchecked(self.rotation_matrix())
    }

    /// The rotation block as a plain matrix.
    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// The translation block.
    pub fn translation(&self) -> Vector3<f64> {
        self.matrix.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// Map a point from the source frame into the target frame of this transform.
    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        let h = self.matrix * point.to_homogeneous();
        Point3::new(h[0], h[1], h[2])
    }

    /// The full homogeneous matrix.
    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.matrix
    }
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}
