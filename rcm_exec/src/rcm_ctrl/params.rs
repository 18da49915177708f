//! Parameters structure for RcmCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{RcmCtrlError, DEFAULT_SHAFT_LENGTH_M};
use crate::euler::{EulerConvention, DEFAULT_SINGULARITY_THRESHOLD};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for RCM control.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Params {
    // ---- GEOMETRY ----
    /// Distance from the end-effector origin to the RCM point along the tool Z axis.
    ///
    /// Units: meters.
    #[serde(default = "default_shaft_length_m")]
    pub shaft_length_m: f64,

    // ---- ATTITUDE ----
    /// Matrix entries below this magnitude are treated as zero when testing for gimbal lock.
    #[serde(default = "default_singularity_threshold")]
    pub singularity_threshold: f64,

    /// Euler convention used by the arm for both pose feedback and servo demands.
    #[serde(default)]
    pub euler_convention: EulerConvention,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check the parameters are usable.
    pub fn validate(&self) -> Result<(), RcmCtrlError> {
        if !(self.shaft_length_m.is_finite() && self.shaft_length_m > 0.0) {
            return Err(RcmCtrlError::InvalidParams(format!(
                "shaft_length_m must be positive, got {}",
                self.shaft_length_m
            )));
        }

        if !(self.singularity_threshold.is_finite() && self.singularity_threshold > 0.0) {
            return Err(RcmCtrlError::InvalidParams(format!(
                "singularity_threshold must be positive, got {}",
                self.singularity_threshold
            )));
        }

        Ok(())
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            shaft_length_m: DEFAULT_SHAFT_LENGTH_M,
            singularity_threshold: DEFAULT_SINGULARITY_THRESHOLD,
            euler_convention: EulerConvention::default(),
        }
    }
}

fn default_shaft_length_m() -> f64 {
    DEFAULT_SHAFT_LENGTH_M
}

fn default_singularity_threshold() -> f64 {
    DEFAULT_SINGULARITY_THRESHOLD
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let p: Params = util::params::parse("").unwrap();
        assert_eq!(p, Params::default());
        assert_eq!(p.shaft_length_m, 0.343);
        assert_eq!(p.euler_convention, EulerConvention::Zyx);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_parse() {
        let p: Params = util::params::parse(
            r#"
            shaft_length_m = 0.25
            singularity_threshold = 1e-9
            euler_convention = "xyz"
            "#,
        )
        .unwrap();

        assert_eq!(p.shaft_length_m, 0.25);
        assert_eq!(p.singularity_threshold, 1e-9);
        assert_eq!(p.euler_convention, EulerConvention::Xyz);

        // Unknown conventions are rejected when loading
        assert!(util::params::parse::<Params>(r#"euler_convention = "zxz""#).is_err());
    }

    #[test]
    fn test_validate() {
        let mut p = Params::default();
        p.shaft_length_m = 0.0;
        assert!(matches!(p.validate(), Err(RcmCtrlError::InvalidParams(_))));

        let mut p = Params::default();
        p.singularity_threshold = f64::NAN;
        assert!(p.validate().is_err());
    }
}
