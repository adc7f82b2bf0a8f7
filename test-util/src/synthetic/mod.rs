use light_curve_transit::ndarray::Array1;
use rand::prelude::*;
use rand_distr::StandardNormal;

pub(crate) mod batch;
pub(crate) mod box_dip;
pub(crate) mod transit;
pub(crate) mod types;

/// Uniform time grid from `t_start` to `t_end` inclusive
fn time_grid(t_start: f64, t_end: f64, n: usize) -> Array1<f64> {
    Array1::linspace(t_start, t_end, n)
}

/// Add white Gaussian noise and build constant flux errors
///
/// Noise-free curves get errors of 1e-3, errors must be positive.
fn add_noise(flux: &mut Array1<f64>, noise: f64, seed: u64) -> Array1<f64> {
    if noise > 0.0 {
        let mut rng = StdRng::seed_from_u64(seed);
        flux.mapv_inplace(|f| f + noise * rng.sample::<f64, _>(StandardNormal));
        Array1::from_elem(flux.len(), noise)
    } else {
        Array1::from_elem(flux.len(), 1e-3)
    }
}
