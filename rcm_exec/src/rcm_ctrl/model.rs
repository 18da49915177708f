//! RCM kinematics
//!
//! The RCM frame sits on the fixed pivot point with the orientation of the end-effector. The
//! end-effector itself lies `shaft_length - trans` below the pivot along the frame's Z axis, so
//! whatever rotation is demanded the shaft always passes through the pivot.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use nalgebra::{Point3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

// Internal
use super::RcmCtrlError;
use crate::{pose::Pose, transform::RigidTransform};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Demands on the RCM, advanced every cycle by operator input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RcmDems {
    /// Pivot angle about the initial tool X axis.
    ///
    /// Units: radians
    pub alpha_rad: f64,

    /// Pivot angle about the tool Y axis, applied after alpha.
    ///
    /// Units: radians
    pub beta_rad: f64,

    /// Shaft translation towards the RCM point, positive moves the tool towards the pivot.
    ///
    /// Units: meters
    pub trans_m: f64,
}

/// State fixed at initialisation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RcmState {
    /// Units: meters,
    /// Frame: Base
    pub rcm_point_m_base: Point3<f64>,

    /// End-effector attitude at initialisation.
    pub init_attitude: Rotation3<f64>,
}

/// Kinematics model of a tool constrained to pivot about a fixed point.
#[derive(Debug, Clone)]
pub struct RcmModel {
    shaft_length_m: f64,

    state: Option<RcmState>,

    dems: RcmDems,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RcmModel {
    pub fn new(shaft_length_m: f64) -> Self {
        Self {
            shaft_length_m,
            state: None,
            dems: RcmDems::default(),
        }
    }

    /// Fix the RCM point one shaft length along the tool Z axis of `initial_pose`.
    ///
    /// Fails without modifying the model if it is already initialised.
    pub fn initialize(&mut self, initial_pose: &Pose) -> Result<Point3<f64>, RcmCtrlError> {
        if let Some(ref state) = self.state {
            return Err(RcmCtrlError::AlreadyInitialised(state.rcm_point_m_base));
        }

        let rcm_point_m_base = initial_pose
            .to_transform()
            .apply(&Point3::new(0.0, 0.0, self.shaft_length_m));

        debug!(
            "RCM point initialised at {:?} m from end-effector at {:?} m",
            rcm_point_m_base.coords.as_slice(),
            initial_pose.position_m.as_slice()
        );

        self.state = Some(RcmState {
            rcm_point_m_base,
            init_attitude: initial_pose.attitude,
        });
        self.dems = RcmDems::default();

        Ok(rcm_point_m_base)
    }

    /// Discard the RCM point so that the model can be initialised again.
    pub fn reset(&mut self) {
        self.state = None;
        self.dems = RcmDems::default();
    }

    pub fn is_initialised(&self) -> bool {
        self.state.is_some()
    }

    pub fn rcm_point_m_base(&self) -> Option<Point3<f64>> {
        self.state.map(|s| s.rcm_point_m_base)
    }

    pub fn state(&self) -> Option<&RcmState> {
        self.state.as_ref()
    }

    pub fn shaft_length_m(&self) -> f64 {
        self.shaft_length_m
    }

    /// The most recently applied demands.
    pub fn dems(&self) -> RcmDems {
        self.dems
    }

    /// Apply new demands, returning the end-effector transform in the base frame.
    pub fn update(&mut self, dems: RcmDems) -> Result<RigidTransform, RcmCtrlError> {
        let state = self.state.ok_or(RcmCtrlError::NotInitialised)?;

        let delta = Rotation3::from_axis_angle(&Vector3::x_axis(), dems.alpha_rad)
            * Rotation3::from_axis_angle(&Vector3::y_axis(), dems.beta_rad);
        let attitude = state.init_attitude * delta;

        let t_base_rcm = RigidTransform::new(&attitude, &state.rcm_point_m_base.coords);
        let shaft_length_eff_m = self.shaft_length_m - dems.trans_m;
        let end_m_base = t_base_rcm.apply(&Point3::new(0.0, 0.0, -shaft_length_eff_m));

        self.dems = dems;

        Ok(RigidTransform::new(&attitude, &end_m_base.coords))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::euler::EulerConvention;
    use comms_if::eqpt::arm::ToolVector;

    const SHAFT_LENGTH_M: f64 = 0.343;

    fn initial_pose() -> Pose {
        Pose::from_tool_vector(
            &ToolVector::new(300.0, 0.0, 200.0, 0.0, 0.0, 0.0),
            EulerConvention::Zyx,
        )
    }

    fn model() -> RcmModel {
        let mut m = RcmModel::new(SHAFT_LENGTH_M);
        m.initialize(&initial_pose()).unwrap();
        m
    }

    #[test]
    fn test_rcm_invariant() {
        let mut m = RcmModel::new(SHAFT_LENGTH_M);
        let rcm = m
            .initialize(&Pose::from_tool_vector(
                &ToolVector::new(-50.0, 420.0, 130.0, 170.0, -20.0, 35.0),
                EulerConvention::Zyx,
            ))
            .unwrap();

        let angles = [-45.0f64, -30.0, -7.5, 0.0, 12.0, 45.0];
        let trans = [-0.1, -0.02, 0.0, 0.05, 0.1];

        for alpha in angles.iter() {
            for beta in angles.iter() {
                for t in trans.iter() {
                    let dems = RcmDems {
                        alpha_rad: alpha.to_radians(),
                        beta_rad: beta.to_radians(),
                        trans_m: *t,
                    };
                    let tf = m.update(dems).unwrap();

                    let offset = rcm.coords - tf.translation();
                    assert!((offset.norm() - (SHAFT_LENGTH_M - t)).abs() < 1e-9);

                    // The offset lies along the local Z axis
                    let local = tf.rotation().inverse() * offset;
                    assert!(local.x.abs() < 1e-9 && local.y.abs() < 1e-9);
                    assert!(local.z > 0.0);
                }
            }
        }
    }

    #[test]
    fn test_idempotent() {
        let mut m = model();
        let dems = RcmDems {
            alpha_rad: 0.2,
            beta_rad: -0.35,
            trans_m: 0.01,
        };

        let a = m.update(dems).unwrap();
        let b = m.update(dems).unwrap();
        assert_eq!(a.matrix(), b.matrix());
        assert_eq!(m.dems(), dems);
    }

    #[test]
    fn test_init_guard() {
        let mut m = model();
        let rcm = m.rcm_point_m_base().unwrap();

        let moved = Pose::new(Vector3::new(1.0, 1.0, 1.0), Rotation3::identity());
        match m.initialize(&moved) {
            Err(RcmCtrlError::AlreadyInitialised(p)) => assert_eq!(p, rcm),
            r => panic!("Expected AlreadyInitialised, got {:?}", r),
        }
        assert_eq!(m.rcm_point_m_base(), Some(rcm));

        // Explicit reset allows a new pivot
        m.reset();
        assert!(!m.is_initialised());
        let new_rcm = m.initialize(&moved).unwrap();
        assert!((new_rcm - Point3::new(1.0, 1.0, 1.0 + SHAFT_LENGTH_M)).norm() < 1e-12);
    }

    #[test]
    fn test_update_before_init() {
        let mut m = RcmModel::new(SHAFT_LENGTH_M);
        assert!(matches!(
            m.update(RcmDems::default()),
            Err(RcmCtrlError::NotInitialised)
        ));
        assert_eq!(m.dems(), RcmDems::default());
    }

    #[test]
    fn test_scenario() {
        let mut m = model();
        let rcm = m.rcm_point_m_base().unwrap();
        assert!((rcm - Point3::new(0.3, 0.0, 0.543)).norm() < 1e-12);

        // Zero demands reproduce the initial pose
        let tf = m.update(RcmDems::default()).unwrap();
        assert!((tf.translation() - Vector3::new(0.3, 0.0, 0.2)).norm() < 1e-12);
        assert!((tf.rotation_matrix() - nalgebra::Matrix3::identity()).abs().max() < 1e-12);

        // Translating along the shaft raises the tool, attitude is unchanged
        let tf = m
            .update(RcmDems {
                trans_m: 0.05,
                ..Default::default()
            })
            .unwrap();
        assert!((tf.translation() - Vector3::new(0.3, 0.0, 0.25)).norm() < 1e-12);
        assert!((tf.rotation_matrix() - nalgebra::Matrix3::identity()).abs().max() < 1e-12);

        // Alpha swings the tool about the pivot's X axis
        let tf = m
            .update(RcmDems {
                alpha_rad: std::f64::consts::FRAC_PI_2,
                ..Default::default()
            })
            .unwrap();
        assert!((tf.translation() - Vector3::new(0.3, SHAFT_LENGTH_M, 0.543)).norm() < 1e-12);
    }
}
