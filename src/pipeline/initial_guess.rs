use crate::bls::CandidatePeriod;
use crate::data::TimeSeries;
use crate::error::{MalformedInputError, TransitError};
use crate::transit::TransitParameters;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Semi-major axis of a one-year orbit around a one-solar-mass star, in solar radii
pub const AU_OVER_SOLAR_RADIUS: f64 = 215.032;

const DAYS_PER_YEAR: f64 = 365.25;

/// Starting point of the posterior sampling derived from the best period candidate
///
/// - `rp_over_rs` is $\sqrt{\delta}$, where $\delta = 1 - \min F / \mathrm{median} F$
/// - `a_over_rs` follows the Kepler's third law,
///   $a / R_\star = 215.032 \, (M_\star (P / 365.25)^2)^{1/3} / R_\star$, masses and radii are in
///   solar units and the period is in days
/// - `t0` and `period` are taken from the candidate, `inclination_deg`, `eccentricity`,
///   `omega_deg` and `limb_dark_coeffs` are fixed values of this config
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct InitialGuessConfig {
    pub inclination_deg: f64,
    pub stellar_mass: f64,
    pub stellar_radius: f64,
    pub eccentricity: f64,
    pub omega_deg: f64,
    pub limb_dark_coeffs: [f64; 2],
}

impl InitialGuessConfig {
    #[inline]
    pub fn default_inclination_deg() -> f64 {
        89.0
    }

    #[inline]
    pub fn default_stellar_mass() -> f64 {
        1.0
    }

    #[inline]
    pub fn default_stellar_radius() -> f64 {
        1.0
    }

    pub fn validate(&self) -> Result<(), TransitError> {
        for (name, value) in [
            ("stellar_mass", self.stellar_mass),
            ("stellar_radius", self.stellar_radius),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(TransitError::invalid_parameter(
                    name,
                    format!("must be positive and finite, got {value}"),
                ));
            }
        }
        // the template must be valid by itself, placeholders stand for the derived values
        self.parameters(0.0, 1.0, 0.1, 10.0).validate()
    }

    /// Semi-major axis in stellar radii for a period in days
    pub fn a_over_rs(&self, period: f64) -> f64 {
        AU_OVER_SOLAR_RADIUS * (self.stellar_mass * (period / DAYS_PER_YEAR).powi(2)).cbrt()
            / self.stellar_radius
    }

    /// Radius ratio from the dip depth of the flux
    pub fn rp_over_rs(&self, ts: &mut TimeSeries) -> f64 {
        let depth = 1.0 - ts.flux.get_min() / ts.flux.get_median();
        depth.max(0.0).sqrt()
    }

    pub fn initial_guess(
        &self,
        candidate: &CandidatePeriod,
        ts: &mut TimeSeries,
    ) -> Result<TransitParameters, TransitError> {
        if ts.is_empty() {
            return Err(MalformedInputError::Empty.into());
        }
        let params = self.parameters(
            candidate.t0,
            candidate.period,
            self.rp_over_rs(ts),
            self.a_over_rs(candidate.period),
        );
        params.validate()?;
        Ok(params)
    }

    fn parameters(
        &self,
        t0: f64,
        period: f64,
        rp_over_rs: f64,
        a_over_rs: f64,
    ) -> TransitParameters {
        TransitParameters {
            t0,
            period,
            rp_over_rs,
            a_over_rs,
            inclination_deg: self.inclination_deg,
            eccentricity: self.eccentricity,
            omega_deg: self.omega_deg,
            limb_dark_coeffs: self.limb_dark_coeffs,
        }
    }
}

impl Default for InitialGuessConfig {
    fn default() -> Self {
        Self {
            inclination_deg: Self::default_inclination_deg(),
            stellar_mass: Self::default_stellar_mass(),
            stellar_radius: Self::default_stellar_radius(),
            eccentricity: 0.0,
            omega_deg: TransitParameters::default_omega_deg(),
            limb_dark_coeffs: TransitParameters::default_limb_dark_coeffs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::array;

    fn candidate(period: f64) -> CandidatePeriod {
        CandidatePeriod {
            period,
            t0: 1.25,
            duration: 0.1,
            depth: 0.01,
            power: 100.0,
            depth_snr: 14.1,
        }
    }

    #[test]
    fn earth_orbit() {
        let config = InitialGuessConfig::default();
        assert_relative_eq!(config.a_over_rs(365.25), AU_OVER_SOLAR_RADIUS);
    }

    #[test]
    fn kepler_scaling() {
        let config = InitialGuessConfig {
            stellar_mass: 8.0,
            stellar_radius: 2.0,
            ..InitialGuessConfig::default()
        };
        // cube root of 8 cancels the radius of 2
        assert_relative_eq!(
            config.a_over_rs(3.5),
            InitialGuessConfig::default().a_over_rs(3.5),
            max_relative = 1e-12
        );
    }

    #[test]
    fn radius_from_depth() {
        let mut ts = TimeSeries::new_without_errors(
            array![0.0, 1.0, 2.0, 3.0, 4.0],
            array![1.0, 1.0, 0.99, 1.0, 1.0],
        );
        let guess = InitialGuessConfig::default()
            .initial_guess(&candidate(3.5), &mut ts)
            .unwrap();
        assert_relative_eq!(guess.rp_over_rs, 0.1, max_relative = 1e-12);
        assert_eq!(guess.t0, 1.25);
        assert_eq!(guess.period, 3.5);
        assert_eq!(guess.inclination_deg, 89.0);
        assert_eq!(guess.eccentricity, 0.0);
        assert_eq!(guess.omega_deg, 90.0);
        assert_eq!(guess.limb_dark_coeffs, [0.3, 0.2]);
        assert_relative_eq!(guess.a_over_rs, 9.7011, max_relative = 1e-4);
    }

    #[test]
    fn flat_flux_gives_invalid_radius() {
        let mut ts = TimeSeries::new_without_errors(array![0.0, 1.0, 2.0], array![1.0, 1.0, 1.0]);
        let error = InitialGuessConfig::default()
            .initial_guess(&candidate(3.5), &mut ts)
            .unwrap_err();
        assert!(matches!(
            error,
            TransitError::InvalidParameter {
                name: "rp_over_rs",
                ..
            }
        ));
    }

    #[test]
    fn invalid_stellar_mass() {
        let config = InitialGuessConfig {
            stellar_mass: 0.0,
            ..InitialGuessConfig::default()
        };
        assert!(config.validate().is_err());
    }

    config_test!(initial_guess_config, InitialGuessConfig::default());
}
