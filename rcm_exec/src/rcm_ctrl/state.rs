//! Implementations for the RcmCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use comms_if::eqpt::arm::ToolVector;
use log::{debug, info};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

// Internal
use super::{Params, RcmCtrlError, RcmDems, RcmModel};
use crate::{
    euler::EulerCodec,
    pose::{tool_vector, Pose},
};
use util::{module::State, params};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// RCM control module state
#[derive(Debug, Clone)]
pub struct RcmCtrl {
    pub(crate) params: Params,

    pub(crate) codec: EulerCodec,

    pub(crate) model: RcmModel,

    pub(crate) report: StatusReport,
}

/// Input data to RCM Control.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// The demands to apply on this cycle.
    pub dems: RcmDems,
}

/// Status report for RcmCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Deserialize, Debug, PartialEq)]
pub struct StatusReport {
    /// The output attitude was at the Euler convention's singularity.
    pub euler_singular: bool,

    /// Distance from the tool to the RCM point on this cycle.
    ///
    /// Units: meters
    pub shaft_length_eff_m: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for RcmCtrl {
    type InitData = &'static str;
    type InitError = RcmCtrlError;

    type InputData = InputData;
    type OutputData = ToolVector;
    type StatusReport = StatusReport;
    type ProcError = RcmCtrlError;

    /// Initialise the RcmCtrl module.
    ///
    /// Expected init data is the path to the parameter file. Fails if the RCM point is already
    /// fixed, call [`RcmCtrl::reset`] first to re-pivot.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        let params: Params = params::load(init_data).map_err(RcmCtrlError::ParamLoadError)?;

        self.set_params(params)?;

        info!(
            "RcmCtrl initialised: shaft length {} m, {} convention",
            self.params.shaft_length_m, self.params.euler_convention
        );

        Ok(())
    }

    /// Apply the demands and produce the servo command for the arm.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        self.report = StatusReport::default();

        let t_base_end = self.model.update(input_data.dems)?;
        let angles = self.codec.to_euler(&t_base_end.rotation_matrix());

        self.report.euler_singular = angles.singular;
        self.report.shaft_length_eff_m = self.model.shaft_length_m() - input_data.dems.trans_m;

        if angles.singular {
            debug!("Output attitude is at the Euler singularity");
        }

        Ok((
            tool_vector(&t_base_end.translation(), &angles, self.codec.convention),
            self.report,
        ))
    }
}

impl RcmCtrl {
    /// Create a new uninitialised controller from parameters.
    pub fn new(params: Params) -> Self {
        Self {
            codec: EulerCodec::new(params.euler_convention, params.singularity_threshold),
            model: RcmModel::new(params.shaft_length_m),
            report: StatusReport::default(),
            params,
        }
    }

    /// Replace the parameters of an uninitialised controller.
    pub fn set_params(&mut self, params: Params) -> Result<(), RcmCtrlError> {
        if let Some(rcm_point_m_base) = self.model.rcm_point_m_base() {
            return Err(RcmCtrlError::AlreadyInitialised(rcm_point_m_base));
        }

        params.validate()?;
        *self = Self::new(params);

        Ok(())
    }

    /// Fix the RCM point from the arm's reported tool pose.
    pub fn init_rcm_point(&mut self, tool: &ToolVector) -> Result<Point3<f64>, RcmCtrlError> {
        let pose = Pose::from_tool_vector(tool, self.codec.convention);
        let rcm_point_m_base = self.model.initialize(&pose)?;

        info!(
            "RCM point set at ({:.4}, {:.4}, {:.4}) m from tool pose {}",
            rcm_point_m_base.x, rcm_point_m_base.y, rcm_point_m_base.z, tool
        );

        Ok(rcm_point_m_base)
    }

    /// Discard the RCM point.
    pub fn reset(&mut self) {
        info!("RCM point reset");
        self.model.reset();
    }

    pub fn is_initialised(&self) -> bool {
        self.model.is_initialised()
    }

    pub fn dems(&self) -> RcmDems {
        self.model.dems()
    }

    pub fn rcm_point_m_base(&self) -> Option<Point3<f64>> {
        self.model.rcm_point_m_base()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn codec(&self) -> &EulerCodec {
        &self.codec
    }

    pub fn report(&self) -> StatusReport {
        self.report
    }
}

impl Default for RcmCtrl {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn assert_tool_near(a: &ToolVector, b: &ToolVector) {
        let diffs = [a.x - b.x, a.y - b.y, a.z - b.z, a.rx - b.rx, a.ry - b.ry, a.rz - b.rz];
        assert!(diffs.iter().all(|d| d.abs() < 1e-9), "{} != {}", a, b);
    }

    #[test]
    fn test_proc_before_init() {
        let mut ctrl = RcmCtrl::default();
        assert!(matches!(
            ctrl.proc(&InputData::default()),
            Err(RcmCtrlError::NotInitialised)
        ));
    }

    #[test]
    fn test_scenario() {
        let mut ctrl = RcmCtrl::default();
        let init = ToolVector::new(300.0, 0.0, 200.0, 0.0, 0.0, 0.0);

        let rcm = ctrl.init_rcm_point(&init).unwrap();
        assert!((rcm - Point3::new(0.3, 0.0, 0.543)).norm() < 1e-12);
        assert!(ctrl.init_rcm_point(&init).is_err());

        // Zero demands give back the initial pose
        let (out, report) = ctrl.proc(&InputData::default()).unwrap();
        assert_tool_near(&out, &init);
        assert!(!report.euler_singular);
        assert_eq!(report.shaft_length_eff_m, 0.343);

        // Translation raises the tool by 50 mm
        let (out, report) = ctrl
            .proc(&InputData {
                dems: RcmDems {
                    trans_m: 0.05,
                    ..Default::default()
                },
            })
            .unwrap();
        assert_tool_near(&out, &ToolVector::new(300.0, 0.0, 250.0, 0.0, 0.0, 0.0));
        assert!((report.shaft_length_eff_m - 0.293).abs() < 1e-12);

        // Beta tilts the tool about Y, which shows up as ry in the arm's convention
        let (out, _) = ctrl
            .proc(&InputData {
                dems: RcmDems {
                    beta_rad: 10f64.to_radians(),
                    ..Default::default()
                },
            })
            .unwrap();
        assert!((out.ry - 10.0).abs() < 1e-9);
        assert!(out.rx.abs() < 1e-9 && out.rz.abs() < 1e-9);
        assert!(out.x < 300.0);
    }

    #[test]
    fn test_gimbal_lock_reported() {
        let mut ctrl = RcmCtrl::default();
        ctrl.init_rcm_point(&ToolVector::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0))
            .unwrap();

        let (out, report) = ctrl
            .proc(&InputData {
                dems: RcmDems {
                    beta_rad: std::f64::consts::FRAC_PI_2,
                    ..Default::default()
                },
            })
            .unwrap();

        assert!(report.euler_singular);
        assert_eq!(out.rz, 0.0);
        assert!((out.ry - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset() {
        let mut ctrl = RcmCtrl::default();
        ctrl.init_rcm_point(&ToolVector::default()).unwrap();
        assert!(ctrl.is_initialised());

        ctrl.reset();
        assert!(!ctrl.is_initialised());
        assert!(ctrl.rcm_point_m_base().is_none());
        assert!(ctrl.init_rcm_point(&ToolVector::default()).is_ok());
    }

    #[test]
    fn test_set_params_keeps_rcm_point() {
        let mut ctrl = RcmCtrl::default();
        let rcm_point = ctrl
            .init_rcm_point(&ToolVector::new(300.0, 0.0, 200.0, 0.0, 0.0, 0.0))
            .unwrap();

        let params = Params {
            shaft_length_m: 0.5,
            ..Default::default()
        };
        match ctrl.set_params(params.clone()) {
            Err(RcmCtrlError::AlreadyInitialised(p)) => assert_eq!(p, rcm_point),
            r => panic!("Expected AlreadyInitialised, got {:?}", r),
        }
        assert_eq!(ctrl.rcm_point_m_base(), Some(rcm_point));
        assert_eq!(ctrl.params(), &Params::default());

        // Allowed again once the pivot has been explicitly discarded
        ctrl.reset();
        ctrl.set_params(params).unwrap();
        assert_eq!(ctrl.params().shaft_length_m, 0.5);
        assert!(!ctrl.is_initialised());

        let bad = Params {
            shaft_length_m: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            ctrl.set_params(bad),
            Err(RcmCtrlError::InvalidParams(_))
        ));
    }
}
