use std::f64::consts::{FRAC_PI_2, PI};

const KEPLER_MAX_ITERATIONS: usize = 50;
const KEPLER_TOLERANCE: f64 = 1e-12;

/// Sky-projected geometry of a planet orbit in the units of stellar radius
#[derive(Clone, Copy, Debug)]
pub(super) struct Orbit {
    period: f64,
    a_over_rs: f64,
    cos_inc: f64,
    sin_inc: f64,
    kind: OrbitKind,
}

#[derive(Clone, Copy, Debug)]
enum OrbitKind {
    Circular {
        t0: f64,
    },
    Eccentric {
        /// Time of periastron passage
        tp: f64,
        eccentricity: f64,
        omega: f64,
    },
}

impl Orbit {
    pub(super) fn new(
        t0: f64,
        period: f64,
        a_over_rs: f64,
        inclination_deg: f64,
        eccentricity: f64,
        omega_deg: f64,
    ) -> Self {
        let inc = inclination_deg.to_radians();
        let kind = if eccentricity == 0.0 {
            OrbitKind::Circular { t0 }
        } else {
            let omega = omega_deg.to_radians();
            // true anomaly at the mid-transit
            let f_transit = FRAC_PI_2 - omega;
            let e_transit = 2.0
                * f64::atan2(
                    (1.0 - eccentricity).sqrt() * (0.5 * f_transit).sin(),
                    (1.0 + eccentricity).sqrt() * (0.5 * f_transit).cos(),
                );
            let mean_anomaly_transit = e_transit - eccentricity * e_transit.sin();
            OrbitKind::Eccentric {
                tp: t0 - period * mean_anomaly_transit / (2.0 * PI),
                eccentricity,
                omega,
            }
        };
        Self {
            period,
            a_over_rs,
            cos_inc: inc.cos(),
            sin_inc: inc.sin(),
            kind,
        }
    }

    /// Projected star-planet separation, [None] when the planet is behind the star
    pub(super) fn separation(&self, t: f64) -> Option<f64> {
        match self.kind {
            OrbitKind::Circular { t0 } => {
                let (sin, cos) = (2.0 * PI * (t - t0) / self.period).sin_cos();
                if cos <= 0.0 {
                    return None;
                }
                Some(self.a_over_rs * f64::hypot(sin, cos * self.cos_inc))
            }
            OrbitKind::Eccentric {
                tp,
                eccentricity,
                omega,
            } => {
                let mean_anomaly = (2.0 * PI * (t - tp) / self.period).rem_euclid(2.0 * PI);
                let ecc_anomaly = solve_kepler(mean_anomaly, eccentricity);
                let true_anomaly = 2.0
                    * f64::atan2(
                        (1.0 + eccentricity).sqrt() * (0.5 * ecc_anomaly).sin(),
                        (1.0 - eccentricity).sqrt() * (0.5 * ecc_anomaly).cos(),
                    );
                let r = self.a_over_rs * (1.0 - eccentricity * ecc_anomaly.cos());
                let sin_phase = (omega + true_anomaly).sin();
                if sin_phase <= 0.0 {
                    return None;
                }
                Some(r * (1.0 - (sin_phase * self.sin_inc).powi(2)).max(0.0).sqrt())
            }
        }
    }
}

/// Eccentric anomaly from the mean anomaly, Newton iterations of the Kepler equation
fn solve_kepler(mean_anomaly: f64, eccentricity: f64) -> f64 {
    let mut ecc_anomaly = if eccentricity < 0.8 {
        mean_anomaly + eccentricity * mean_anomaly.sin()
    } else {
        PI
    };
    for _ in 0..KEPLER_MAX_ITERATIONS {
        let (sin, cos) = ecc_anomaly.sin_cos();
        let step = (ecc_anomaly - eccentricity * sin - mean_anomaly) / (1.0 - eccentricity * cos);
        ecc_anomaly -= step;
        if step.abs() < KEPLER_TOLERANCE {
            break;
        }
    }
    ecc_anomaly
}

#[cfg(test)]
#[allow(clippy::unreadable_literal)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use light_curve_common::linspace;

    #[test]
    fn kepler_equation_is_solved() {
        for &e in &[0.0, 0.1, 0.5, 0.9, 0.99] {
            for m in linspace(0.0, 2.0 * PI, 33) {
                let ecc_anomaly = solve_kepler(m, e);
                assert_abs_diff_eq!(ecc_anomaly - e * ecc_anomaly.sin(), m, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn mid_transit_separation_is_impact_parameter() {
        let orbit = Orbit::new(2.0, 3.0, 10.0, 88.0, 0.0, 90.0);
        let b = 10.0 * 88.0_f64.to_radians().cos();
        assert_abs_diff_eq!(orbit.separation(2.0).unwrap(), b, epsilon = 1e-12);
        assert_abs_diff_eq!(orbit.separation(5.0).unwrap(), b, epsilon = 1e-12);
        // secondary eclipse
        assert!(orbit.separation(3.5).is_none());
    }

    #[test]
    fn small_eccentricity_approaches_circular() {
        let circular = Orbit::new(0.5, 4.0, 12.0, 89.0, 0.0, 90.0);
        let eccentric = Orbit::new(0.5, 4.0, 12.0, 89.0, 1e-9, 90.0);
        for t in linspace(0.0, 4.0, 101) {
            match (circular.separation(t), eccentric.separation(t)) {
                (Some(a), Some(b)) => assert_abs_diff_eq!(a, b, epsilon = 1e-6),
                (None, None) => {}
                (a, b) => {
                    // both are at the limb
                    let z = a.or(b).unwrap();
                    assert_abs_diff_eq!(z, 12.0, epsilon = 1e-6);
                }
            }
        }
    }

    #[test]
    fn eccentric_transit_is_at_t0() {
        let orbit = Orbit::new(1.0, 5.0, 15.0, 90.0, 0.3, 40.0);
        assert_abs_diff_eq!(orbit.separation(1.0).unwrap(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(orbit.separation(6.0).unwrap(), 0.0, epsilon = 1e-8);
        assert!(orbit.separation(1.05).unwrap() > 0.0);
    }
}
