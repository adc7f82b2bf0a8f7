use std::f64::consts::PI;

/// Area of the intersection of a circle of radius `r` centred on the star with the planet disk
/// of radius `p` at the distance `z`
pub(super) fn overlap_area(r: f64, p: f64, z: f64) -> f64 {
    if r <= 0.0 || z >= r + p {
        return 0.0;
    }
    if z <= (r - p).abs() {
        return PI * r.min(p).powi(2);
    }
    let cos_r = ((z * z + r * r - p * p) / (2.0 * z * r)).clamp(-1.0, 1.0);
    let cos_p = ((z * z + p * p - r * r) / (2.0 * z * p)).clamp(-1.0, 1.0);
    let kite = ((-z + r + p) * (z + r - p) * (z - r + p) * (z + r + p)).max(0.0);
    r * r * cos_r.acos() + p * p * cos_p.acos() - 0.5 * kite.sqrt()
}

/// Quadratic limb-darkening law $I(\mu) = 1 - u_1 (1 - \mu) - u_2 (1 - \mu)^2$
#[derive(Clone, Copy, Debug)]
pub(super) struct QuadraticLimbDarkening {
    u1: f64,
    u2: f64,
}

impl QuadraticLimbDarkening {
    pub(super) fn new([u1, u2]: [f64; 2]) -> Self {
        Self { u1, u2 }
    }

    /// Total stellar flux, integral of the intensity over the stellar disk
    pub(super) fn total_flux(&self) -> f64 {
        PI * (1.0 - self.u1 / 3.0 - self.u2 / 6.0)
    }

    fn intensity_at_limb(&self) -> f64 {
        1.0 - self.u1 - self.u2
    }

    /// $dI / d\mu$
    fn intensity_derivative(&self, mu: f64) -> f64 {
        self.u1 + 2.0 * self.u2 * (1.0 - mu)
    }

    /// Fraction of the stellar flux blocked by the planet of radius `p` at the separation `z`
    ///
    /// The blocked flux is integrated by parts in $\mu = \sqrt{1 - r^2}$:
    /// $$
    /// F = I(\mu = 0) A(1) + \int_0^1 A\left(\sqrt{1 - \mu^2}\right) \frac{dI}{d\mu} d\mu,
    /// $$
    /// where $A(r)$ is the overlap area of the planet with the concentric circle of radius $r$.
    /// The integral is evaluated with the composite Simpson rule on sub-intervals split at the
    /// kinks of $A(r)$, `intervals` is the even number of Simpson intervals per sub-interval.
    pub(super) fn blocked_fraction(&self, p: f64, z: f64, intervals: usize) -> f64 {
        let area = |r: f64| overlap_area(r, p, z);
        let integrand = |mu: f64| area((1.0 - mu * mu).max(0.0).sqrt()) * self.intensity_derivative(mu);

        let mu_of_r = |r: f64| (1.0 - r * r).max(0.0).sqrt();
        // A(r) vanishes for r < z - p
        let mu_max = if z > p { mu_of_r(z - p) } else { 1.0 };
        let mut nodes = vec![0.0];
        for kink in [z + p, (p - z).abs()] {
            if kink > 0.0 && kink < 1.0 {
                let mu = mu_of_r(kink);
                if mu > 0.0 && mu < mu_max {
                    nodes.push(mu);
                }
            }
        }
        nodes.push(mu_max);
        nodes.sort_by(f64::total_cmp);

        let integral: f64 = nodes
            .windows(2)
            .map(|w| simpson(integrand, w[0], w[1], intervals))
            .sum();
        (self.intensity_at_limb() * area(1.0) + integral) / self.total_flux()
    }
}

/// Composite Simpson rule with an even number of intervals
fn simpson(f: impl Fn(f64) -> f64, a: f64, b: f64, intervals: usize) -> f64 {
    if b <= a {
        return 0.0;
    }
    let h = (b - a) / intervals as f64;
    let inner: f64 = (1..intervals)
        .map(|i| {
            let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
            weight * f(a + h * i as f64)
        })
        .sum();
    (f(a) + inner + f(b)) * h / 3.0
}
