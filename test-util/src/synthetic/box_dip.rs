use crate::synthetic::types::TripleArray;
use crate::synthetic::{add_noise, time_grid};

use light_curve_transit::ndarray::Array1;

/// Periodic box-shaped dip of a unit baseline
#[derive(Clone, Copy, Debug)]
pub struct BoxDip {
    pub period: f64,
    /// Mid-time of one of the dips
    pub t0: f64,
    pub duration: f64,
    pub depth: f64,
}

impl BoxDip {
    pub fn is_in_dip(&self, t: f64) -> bool {
        let phase = (t - self.t0 + 0.5 * self.period).rem_euclid(self.period) - 0.5 * self.period;
        phase.abs() < 0.5 * self.duration
    }

    pub fn flux(&self, t: f64) -> f64 {
        if self.is_in_dip(t) {
            1.0 - self.depth
        } else {
            1.0
        }
    }
}

/// Box dip light curve on a uniform time grid with white noise of a given standard deviation
pub fn box_dip_light_curve(
    dip: &BoxDip,
    t_start: f64,
    t_end: f64,
    n: usize,
    noise: f64,
    seed: u64,
) -> TripleArray {
    let t = time_grid(t_start, t_end, n);
    let mut flux = t.mapv(|t| dip.flux(t));
    let flux_err = add_noise(&mut flux, noise, seed);
    (t, flux, flux_err)
}

/// Flat unit light curve with white noise
pub fn noise_light_curve(t_start: f64, t_end: f64, n: usize, noise: f64, seed: u64) -> TripleArray {
    let t = time_grid(t_start, t_end, n);
    let mut flux = Array1::ones(n);
    let flux_err = add_noise(&mut flux, noise, seed);
    (t, flux, flux_err)
}
