//! Analytic transit light-curve model

use crate::error::TransitError;

use log::trace;
use macro_const::macro_const;
use ndarray::{Array1, ArrayView1};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

mod occultation;
use occultation::QuadraticLimbDarkening;

mod orbit;
use orbit::Orbit;

/// Number of the free parameters sampled by the posterior sampler
pub const NPARAMS: usize = 4;

/// Names of the free parameters in the order of [TransitParameters::free]
pub const FREE_PARAMETER_NAMES: [&str; NPARAMS] =
    ["t0", "rp_over_rs", "a_over_rs", "inclination_deg"];

/// Planet orbit, size and stellar limb darkening
///
/// Lengths are in the units of the stellar radius, angles are in degrees. `t0` is the time of a
/// mid-transit.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct TransitParameters {
    pub t0: f64,
    pub period: f64,
    pub rp_over_rs: f64,
    pub a_over_rs: f64,
    pub inclination_deg: f64,
    #[serde(default)]
    pub eccentricity: f64,
    #[serde(default = "TransitParameters::default_omega_deg")]
    pub omega_deg: f64,
    #[serde(default = "TransitParameters::default_limb_dark_coeffs")]
    pub limb_dark_coeffs: [f64; 2],
}

impl TransitParameters {
    /// Circular orbit with the default limb darkening
    pub fn circular(
        t0: f64,
        period: f64,
        rp_over_rs: f64,
        a_over_rs: f64,
        inclination_deg: f64,
    ) -> Self {
        Self {
            t0,
            period,
            rp_over_rs,
            a_over_rs,
            inclination_deg,
            eccentricity: 0.0,
            omega_deg: Self::default_omega_deg(),
            limb_dark_coeffs: Self::default_limb_dark_coeffs(),
        }
    }

    #[inline]
    pub fn default_omega_deg() -> f64 {
        90.0
    }

    #[inline]
    pub fn default_limb_dark_coeffs() -> [f64; 2] {
        [0.3, 0.2]
    }

    /// Free parameters: `t0`, `rp_over_rs`, `a_over_rs`, `inclination_deg`
    pub fn free(&self) -> [f64; NPARAMS] {
        [self.t0, self.rp_over_rs, self.a_over_rs, self.inclination_deg]
    }

    /// Copy with free parameters replaced, the rest is kept fixed
    pub fn with_free(&self, [t0, rp_over_rs, a_over_rs, inclination_deg]: [f64; NPARAMS]) -> Self {
        Self {
            t0,
            rp_over_rs,
            a_over_rs,
            inclination_deg,
            ..*self
        }
    }

    pub fn validate(&self) -> Result<(), TransitError> {
        let positive = [
            ("period", self.period),
            ("rp_over_rs", self.rp_over_rs),
            ("a_over_rs", self.a_over_rs),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(TransitError::invalid_parameter(
                    name,
                    format!("must be positive and finite, got {value}"),
                ));
            }
        }
        if !self.t0.is_finite() {
            return Err(TransitError::invalid_parameter("t0", "must be finite"));
        }
        if !(0.0..=180.0).contains(&self.inclination_deg) {
            return Err(TransitError::invalid_parameter(
                "inclination_deg",
                format!("must be in [0, 180], got {}", self.inclination_deg),
            ));
        }
        if !(0.0..1.0).contains(&self.eccentricity) {
            return Err(TransitError::invalid_parameter(
                "eccentricity",
                format!("must be in [0, 1), got {}", self.eccentricity),
            ));
        }
        if !self.omega_deg.is_finite() {
            return Err(TransitError::invalid_parameter("omega_deg", "must be finite"));
        }
        let [u1, u2] = self.limb_dark_coeffs;
        if !(u1.is_finite() && u2.is_finite() && 1.0 - u1 / 3.0 - u2 / 6.0 > 0.0) {
            return Err(TransitError::invalid_parameter(
                "limb_dark_coeffs",
                format!("stellar disk must have positive total flux, got u = [{u1}, {u2}]"),
            ));
        }
        Ok(())
    }
}

macro_const! {
    const DOC: &str = r"
Transit light curve of a planet crossing a quadratically limb-darkened star

The relative flux is
$$
F(t) = 1 - \frac{1}{\Omega} \int_\mathrm{planet} I(\mu)\, dA,
$$
where $I(\mu) = 1 - u_1 (1 - \mu) - u_2 (1 - \mu)^2$, $\mu = \sqrt{1 - r^2}$ and
$\Omega = \pi (1 - u_1 / 3 - u_2 / 6)$ is the total stellar flux. The sky-projected separation $z$
follows a Keplerian orbit, circular orbits are computed directly. Observations with
$z \geq 1 + R_p / R_\star$ or with the planet behind the star have exactly unit flux and skip the
occultation integral, which is computed with the composite Simpson rule.

- Depends on: **time**
- Parameters: [TransitParameters]
";
}

#[doc = DOC!()]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(default)]
pub struct TransitModel {
    /// Even number of Simpson intervals per smooth piece of the occultation integral
    pub quadrature_intervals: usize,
}

impl TransitModel {
    pub fn new(quadrature_intervals: usize) -> Result<Self, TransitError> {
        let model = Self {
            quadrature_intervals,
        };
        model.validate()?;
        Ok(model)
    }

    #[inline]
    pub fn default_quadrature_intervals() -> usize {
        32
    }

    pub fn doc() -> &'static str {
        DOC
    }

    pub fn validate(&self) -> Result<(), TransitError> {
        if self.quadrature_intervals < 2 || self.quadrature_intervals % 2 != 0 {
            return Err(TransitError::invalid_parameter(
                "quadrature_intervals",
                format!(
                    "must be even and positive, got {}",
                    self.quadrature_intervals
                ),
            ));
        }
        Ok(())
    }

    /// Relative flux at given times
    pub fn light_curve(
        &self,
        params: &TransitParameters,
        t: ArrayView1<f64>,
    ) -> Result<Array1<f64>, TransitError> {
        params.validate()?;
        let orbit = Orbit::new(
            params.t0,
            params.period,
            params.a_over_rs,
            params.inclination_deg,
            params.eccentricity,
            params.omega_deg,
        );
        let limb_darkening = QuadraticLimbDarkening::new(params.limb_dark_coeffs);
        let p = params.rp_over_rs;

        let flux = t.mapv(|t| match orbit.separation(t) {
            Some(z) if z < 1.0 + p => {
                1.0 - limb_darkening.blocked_fraction(p, z, self.quadrature_intervals)
            }
            _ => 1.0,
        });

        if let Some(index) = flux.iter().position(|f| !f.is_finite()) {
            trace!("Non-finite model flux at t = {} for {:?}", t[index], params);
            return Err(TransitError::NumericalInstability {
                unstable: 1,
                evaluations: 1,
            });
        }
        Ok(flux)
    }
}

impl Default for TransitModel {
    fn default() -> Self {
        Self {
            quadrature_intervals: Self::default_quadrature_intervals(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unreadable_literal)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use light_curve_common::linspace;

    fn hot_jupiter() -> TransitParameters {
        TransitParameters::circular(1.3, 3.5, 0.1, 9.0, 89.0)
    }

    #[test]
    fn out_of_transit_flux_is_unity() {
        let params = hot_jupiter();
        let t = Array1::linspace(0.0, 14.0, 5001);
        let flux = TransitModel::default().light_curve(&params, t.view()).unwrap();
        let half_duration = 0.1;
        for (&t, &f) in t.iter().zip(flux.iter()) {
            assert!(f.is_finite());
            let phase = (t - params.t0 + 0.5 * params.period).rem_euclid(params.period)
                - 0.5 * params.period;
            if phase.abs() > half_duration {
                assert_eq!(f, 1.0, "t = {t}");
            } else {
                assert!(f <= 1.0);
            }
        }
    }

    #[test]
    fn mid_transit_flux_decreases_with_radius() {
        let model = TransitModel::default();
        let t = Array1::linspace(1.2, 1.4, 201);
        let minima: Vec<f64> = linspace(0.02, 0.3, 15)
            .into_iter()
            .map(|rp| {
                let params = TransitParameters {
                    rp_over_rs: rp,
                    ..hot_jupiter()
                };
                let flux = model.light_curve(&params, t.view()).unwrap();
                flux.iter().copied().fold(f64::INFINITY, f64::min)
            })
            .collect();
        assert!(minima[0] < 1.0);
        for w in minima.windows(2) {
            assert!(w[1] < w[0]);
        }
    }

    #[test]
    fn uniform_central_transit_depth() {
        let params = TransitParameters {
            inclination_deg: 90.0,
            limb_dark_coeffs: [0.0, 0.0],
            ..hot_jupiter()
        };
        let flux = TransitModel::default()
            .light_curve(&params, Array1::from_elem(1, params.t0).view())
            .unwrap();
        assert_relative_eq!(1.0 - flux[0], 0.01, max_relative = 1e-12);
    }

    #[test]
    fn eccentric_orbit_with_periastron_at_transit() {
        let circular = hot_jupiter();
        let eccentric = TransitParameters {
            eccentricity: 0.2,
            ..circular
        };
        let t = Array1::linspace(1.0, 1.6, 301);
        let model = TransitModel::default();
        let circular_flux = model.light_curve(&circular, t.view()).unwrap();
        let eccentric_flux = model.light_curve(&eccentric, t.view()).unwrap();
        let depth = |flux: &Array1<f64>| 1.0 - flux.iter().copied().fold(f64::INFINITY, f64::min);
        // planet is closer to the star, so the transit is shorter, and impact parameter is smaller
        let in_transit = |flux: &Array1<f64>| flux.iter().filter(|&&f| f < 1.0).count();
        assert!(in_transit(&eccentric_flux) < in_transit(&circular_flux));
        assert!(depth(&eccentric_flux) >= depth(&circular_flux));
    }

    #[test]
    fn invalid_parameters() {
        let model = TransitModel::default();
        let t = Array1::linspace(0.0, 1.0, 10);
        for params in [
            TransitParameters {
                period: 0.0,
                ..hot_jupiter()
            },
            TransitParameters {
                rp_over_rs: -0.1,
                ..hot_jupiter()
            },
            TransitParameters {
                eccentricity: 1.0,
                ..hot_jupiter()
            },
            TransitParameters {
                t0: f64::NAN,
                ..hot_jupiter()
            },
            TransitParameters {
                limb_dark_coeffs: [3.0, 1.0],
                ..hot_jupiter()
            },
        ] {
            assert!(matches!(
                model.light_curve(&params, t.view()),
                Err(TransitError::InvalidParameter { .. })
            ));
        }
        assert!(TransitModel::new(31).is_err());
        assert!(TransitModel::new(0).is_err());
    }

    #[test]
    fn free_parameters() {
        let params = hot_jupiter();
        assert_eq!(params.free(), [1.3, 0.1, 9.0, 89.0]);
        let moved = params.with_free([1.4, 0.12, 8.0, 88.0]);
        assert_eq!(moved.period, params.period);
        assert_eq!(moved.limb_dark_coeffs, params.limb_dark_coeffs);
        assert_eq!(moved.free(), [1.4, 0.12, 8.0, 88.0]);
    }

    #[test]
    fn parameters_from_json() {
        let params: TransitParameters = serde_json::from_str(
            r#"{"t0": 1.3, "period": 3.5, "rp_over_rs": 0.1, "a_over_rs": 9.0, "inclination_deg": 89.0}"#,
        )
        .unwrap();
        assert_eq!(params, hot_jupiter());
    }

    config_test!(transit_model, TransitModel::default());
}
