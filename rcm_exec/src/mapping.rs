//! # Operator input mapping
//!
//! Turns a joystick event into new RCM demands. The control loop is generic over
//! [`InputMapping`], so any policy can be plugged in, including a plain closure:
//!
//! ```
//! use comms_if::eqpt::joy::JoyButtons;
//! use rcm_lib::{mapping::InputMapping, rcm_ctrl::RcmDems};
//!
//! let beta_only = |prior: RcmDems, joy: &JoyButtons| RcmDems {
//!     beta_rad: prior.beta_rad + if joy.is_pressed(2) { 0.3f64.to_radians() } else { 0.0 },
//!     ..prior
//! };
//!
//! let dems = beta_only.map(RcmDems::default(), &JoyButtons::from_raw(&[0, 0, 1]));
//! assert!((dems.beta_rad - 0.3f64.to_radians()).abs() < 1e-15);
//! ```

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::joy::JoyButtons;
use serde::{Deserialize, Serialize};
use util::maths::clamp;

use crate::rcm_ctrl::RcmDems;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A policy mapping the prior demands and an input event to new demands.
///
/// Policies are pure, the new demands depend only on the prior demands and the input.
pub trait InputMapping {
    fn map(&self, prior: RcmDems, input: &JoyButtons) -> RcmDems;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the [`ButtonMapping`] policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MappingParams {
    // ---- BUTTONS ----
    pub alpha_inc_button_idx: usize,
    pub alpha_dec_button_idx: usize,
    pub beta_inc_button_idx: usize,
    pub beta_dec_button_idx: usize,
    pub trans_inc_button_idx: usize,
    pub trans_dec_button_idx: usize,

    // ---- STEPS ----
    /// Change in alpha or beta per press.
    ///
    /// Units: degrees
    pub angle_step_deg: f64,

    /// Change in shaft translation per press.
    ///
    /// Units: meters
    pub trans_step_m: f64,

    // ---- LIMITS ----
    /// Units: degrees
    pub max_abs_angle_deg: f64,

    /// Units: meters
    pub max_abs_trans_m: f64,
}

/// Steps each RCM demand by a fixed amount for every pressed button, within symmetric limits.
#[derive(Debug, Clone)]
pub struct ButtonMapping {
    params: MappingParams,
    angle_step_rad: f64,
    max_abs_angle_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<F> InputMapping for F
where
    F: Fn(RcmDems, &JoyButtons) -> RcmDems,
{
    fn map(&self, prior: RcmDems, input: &JoyButtons) -> RcmDems {
        self(prior, input)
    }
}

impl MappingParams {
    /// All button indices used by the mapping.
    pub fn button_indices(&self) -> [usize; 6] {
        [
            self.alpha_inc_button_idx,
            self.alpha_dec_button_idx,
            self.beta_inc_button_idx,
            self.beta_dec_button_idx,
            self.trans_inc_button_idx,
            self.trans_dec_button_idx,
        ]
    }
}

impl Default for MappingParams {
    fn default() -> Self {
        Self {
            alpha_inc_button_idx: 0,
            alpha_dec_button_idx: 1,
            beta_inc_button_idx: 2,
            beta_dec_button_idx: 3,
            trans_inc_button_idx: 4,
            trans_dec_button_idx: 6,
            angle_step_deg: 0.3,
            trans_step_m: 0.001,
            max_abs_angle_deg: 45.0,
            max_abs_trans_m: 0.1,
        }
    }
}

impl ButtonMapping {
    pub fn new(params: MappingParams) -> Self {
        Self {
            angle_step_rad: params.angle_step_deg.to_radians(),
            max_abs_angle_rad: params.max_abs_angle_deg.to_radians(),
            params,
        }
    }

    pub fn params(&self) -> &MappingParams {
        &self.params
    }
}

impl Default for ButtonMapping {
    fn default() -> Self {
        Self::new(MappingParams::default())
    }
}

impl InputMapping for ButtonMapping {
    fn map(&self, prior: RcmDems, input: &JoyButtons) -> RcmDems {
        let p = &self.params;
        let step = |inc: usize, dec: usize, size: f64| {
            let mut delta = 0.0;
            if input.is_pressed(inc) {
                delta += size;
            }
            if input.is_pressed(dec) {
                delta -= size;
            }
            delta
        };

        let alpha_rad = prior.alpha_rad
            + step(
                p.alpha_inc_button_idx,
                p.alpha_dec_button_idx,
                self.angle_step_rad,
            );
        let beta_rad = prior.beta_rad
            + step(
                p.beta_inc_button_idx,
                p.beta_dec_button_idx,
                self.angle_step_rad,
            );
        let trans_m = prior.trans_m
            + step(
                p.trans_inc_button_idx,
                p.trans_dec_button_idx,
                p.trans_step_m,
            );

        RcmDems {
            alpha_rad: clamp(&alpha_rad, &-self.max_abs_angle_rad, &self.max_abs_angle_rad),
            beta_rad: clamp(&beta_rad, &-self.max_abs_angle_rad, &self.max_abs_angle_rad),
            trans_m: clamp(&trans_m, &-p.max_abs_trans_m, &p.max_abs_trans_m),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn press(idx: &[usize]) -> JoyButtons {
        let mut raw = [0; 8];
        for i in idx {
            raw[*i] = 1;
        }
        JoyButtons::from_raw(&raw)
    }

    #[test]
    fn test_steps() {
        let m = ButtonMapping::default();

        let d = m.map(RcmDems::default(), &press(&[2]));
        assert!((d.beta_rad - 0.3f64.to_radians()).abs() < 1e-15);
        assert_eq!(d.alpha_rad, 0.0);
        assert_eq!(d.trans_m, 0.0);

        let d = m.map(d, &press(&[1, 4]));
        assert!((d.alpha_rad + 0.3f64.to_radians()).abs() < 1e-15);
        assert!((d.trans_m - 0.001).abs() < 1e-15);

        // Opposing buttons cancel
        let d2 = m.map(d, &press(&[2, 3]));
        assert_eq!(d2, d);
    }

    #[test]
    fn test_limits() {
        let m = ButtonMapping::default();
        let mut d = RcmDems::default();

        for _ in 0..1000 {
            d = m.map(d, &press(&[0, 4]));
        }
        assert!((d.alpha_rad - 45f64.to_radians()).abs() < 1e-12);
        assert!((d.trans_m - 0.1).abs() < 1e-12);

        for _ in 0..2000 {
            d = m.map(d, &press(&[3, 6]));
        }
        assert!((d.beta_rad + 45f64.to_radians()).abs() < 1e-12);
        assert!((d.trans_m + 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_exit_button_unmapped() {
        let m = ButtonMapping::default();
        assert!(!m.params().button_indices().contains(&5));
        assert_eq!(m.map(RcmDems::default(), &press(&[5, 7])), RcmDems::default());
    }

    #[test]
    fn test_closure_mapping() {
        let step_m = 0.01;
        let mapping = |prior: RcmDems, joy: &JoyButtons| RcmDems {
            trans_m: prior.trans_m + if joy.is_pressed(0) { step_m } else { 0.0 },
            ..prior
        };

        let d = mapping.map(RcmDems::default(), &press(&[0]));
        let d = mapping.map(d, &press(&[0]));
        assert!((d.trans_m - 0.02).abs() < 1e-15);

        // Same prior and input, same demands
        assert_eq!(mapping.map(d, &press(&[1])), d);
        assert_eq!(mapping.map(d, &press(&[0])), mapping.map(d, &press(&[0])));
    }

    #[test]
    fn test_button_mapping_is_pure() {
        let m = ButtonMapping::default();
        let prior = RcmDems {
            alpha_rad: 0.1,
            beta_rad: -0.2,
            trans_m: 0.03,
        };
        let input = press(&[0, 3, 4]);

        let first = m.map(prior, &input);
        for _ in 0..10 {
            assert_eq!(m.map(prior, &input), first);
        }
    }

    #[test]
    fn test_params_parse() {
        let p: MappingParams = util::params::parse("angle_step_deg = 1.0").unwrap();
        assert_eq!(p.angle_step_deg, 1.0);
        assert_eq!(p.trans_dec_button_idx, 6);
    }
}
