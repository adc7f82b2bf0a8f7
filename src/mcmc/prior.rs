use crate::error::TransitError;
use crate::transit::{FREE_PARAMETER_NAMES, NPARAMS};

use enum_dispatch::enum_dispatch;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

#[enum_dispatch]
pub trait LnPrior1DTrait: Clone + Debug {
    /// Evaluate the natural logarithm of the prior at x
    fn ln_prior_1d(&self, x: f64) -> f64;
}

/// Natural logarithm of an unnormalized prior for a single parameter
#[enum_dispatch(LnPrior1DTrait)]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[non_exhaustive]
pub enum LnPrior1D {
    None(NoneLnPrior1D),
    Flat(FlatLnPrior1D),
}

impl LnPrior1D {
    pub fn none() -> Self {
        NoneLnPrior1D {}.into()
    }

    pub fn flat(left: f64, right: f64) -> Result<Self, TransitError> {
        Ok(FlatLnPrior1D::new(left, right)?.into())
    }

    pub fn contains(&self, x: f64) -> bool {
        self.ln_prior_1d(x) > f64::NEG_INFINITY
    }
}

/// Improper prior, any finite value is allowed
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct NoneLnPrior1D {}

impl LnPrior1DTrait for NoneLnPrior1D {
    fn ln_prior_1d(&self, x: f64) -> f64 {
        if x.is_finite() { 0.0 } else { f64::NEG_INFINITY }
    }
}

/// Zero inside the open interval `(left, right)`, minus infinity outside
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct FlatLnPrior1D {
    left: f64,
    right: f64,
}

impl FlatLnPrior1D {
    pub fn new(left: f64, right: f64) -> Result<Self, TransitError> {
        if !(left < right) {
            return Err(TransitError::invalid_parameter(
                "prior",
                format!("left bound {left} must be smaller than right bound {right}"),
            ));
        }
        Ok(Self { left, right })
    }

    pub fn left(&self) -> f64 {
        self.left
    }

    pub fn right(&self) -> f64 {
        self.right
    }
}

impl LnPrior1DTrait for FlatLnPrior1D {
    fn ln_prior_1d(&self, x: f64) -> f64 {
        if self.left < x && x < self.right {
            0.0
        } else {
            f64::NEG_INFINITY
        }
    }
}

/// Independent priors of the free transit parameters
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct TransitPrior {
    pub t0: LnPrior1D,
    pub rp_over_rs: LnPrior1D,
    pub a_over_rs: LnPrior1D,
    pub inclination_deg: LnPrior1D,
}

impl TransitPrior {
    fn components(&self) -> [&LnPrior1D; NPARAMS] {
        [
            &self.t0,
            &self.rp_over_rs,
            &self.a_over_rs,
            &self.inclination_deg,
        ]
    }

    pub fn ln_prior(&self, params: &[f64; NPARAMS]) -> f64 {
        self.components()
            .iter()
            .zip(params)
            .map(|(prior, &x)| prior.ln_prior_1d(x))
            .sum()
    }

    /// Name of the first parameter outside of the prior support
    pub fn first_outside(&self, params: &[f64; NPARAMS]) -> Option<(&'static str, f64)> {
        self.components()
            .iter()
            .zip(params)
            .zip(FREE_PARAMETER_NAMES)
            .find_map(|((prior, &x), name)| (!prior.contains(x)).then_some((name, x)))
    }
}

impl Default for TransitPrior {
    /// `0 < rp/R* < 0.5`, `1 < a/R* < 100`, `80 < i < 90` degrees, `t0` is unconstrained
    fn default() -> Self {
        Self {
            t0: LnPrior1D::none(),
            rp_over_rs: FlatLnPrior1D { left: 0.0, right: 0.5 }.into(),
            a_over_rs: FlatLnPrior1D { left: 1.0, right: 100.0 }.into(),
            inclination_deg: FlatLnPrior1D { left: 80.0, right: 90.0 }.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_prior_is_open() {
        let prior = LnPrior1D::flat(0.0, 0.5).unwrap();
        assert_eq!(prior.ln_prior_1d(0.25), 0.0);
        assert_eq!(prior.ln_prior_1d(0.0), f64::NEG_INFINITY);
        assert_eq!(prior.ln_prior_1d(0.5), f64::NEG_INFINITY);
        assert_eq!(prior.ln_prior_1d(f64::NAN), f64::NEG_INFINITY);
        assert!(LnPrior1D::flat(1.0, 1.0).is_err());
        assert!(LnPrior1D::flat(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn default_transit_prior_box() {
        let prior = TransitPrior::default();
        assert_eq!(prior.ln_prior(&[1e4, 0.1, 10.0, 89.0]), 0.0);
        assert_eq!(prior.first_outside(&[1e4, 0.1, 10.0, 89.0]), None);
        assert_eq!(prior.ln_prior(&[0.0, 0.6, 10.0, 89.0]), f64::NEG_INFINITY);
        assert_eq!(
            prior.first_outside(&[0.0, 0.1, 10.0, 90.0]),
            Some(("inclination_deg", 90.0))
        );
        assert_eq!(
            prior.first_outside(&[0.0, 0.1, 0.5, 95.0]),
            Some(("a_over_rs", 0.5))
        );
    }

    #[test]
    fn prior_from_json() {
        let prior: TransitPrior = serde_json::from_str(
            r#"{"t0": {"Flat": {"left": 0.0, "right": 2.0}}, "rp_over_rs": {"None": {}}}"#,
        )
        .unwrap();
        assert_eq!(prior.t0, LnPrior1D::flat(0.0, 2.0).unwrap());
        assert_eq!(prior.rp_over_rs, LnPrior1D::none());
        assert_eq!(prior.a_over_rs, TransitPrior::default().a_over_rs);
    }

    config_test!(transit_prior, TransitPrior::default());
}
