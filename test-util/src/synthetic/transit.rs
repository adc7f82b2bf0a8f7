use crate::synthetic::types::TripleArray;
use crate::synthetic::{add_noise, time_grid};

use light_curve_transit::{TransitModel, TransitParameters};

/// Free parameters of a synthetic circular-orbit transit
#[derive(Clone, Copy, Debug)]
pub struct TransitSignal {
    pub t0: f64,
    pub period: f64,
    pub rp_over_rs: f64,
    pub a_over_rs: f64,
    pub inclination_deg: f64,
}

impl TransitSignal {
    pub fn parameters(&self) -> TransitParameters {
        TransitParameters::circular(
            self.t0,
            self.period,
            self.rp_over_rs,
            self.a_over_rs,
            self.inclination_deg,
        )
    }
}

/// Hot Jupiter around a Sun-like star: P = 3.5 d, 1% deep transit lasting about three hours
pub const HOT_JUPITER: TransitSignal = TransitSignal {
    t0: 1.3,
    period: 3.5,
    rp_over_rs: 0.1,
    a_over_rs: 9.0,
    inclination_deg: 89.0,
};

/// Light curve of the default [TransitModel] on a uniform time grid with white noise
pub fn transit_light_curve(
    signal: &TransitSignal,
    t_start: f64,
    t_end: f64,
    n: usize,
    noise: f64,
    seed: u64,
) -> TripleArray {
    let t = time_grid(t_start, t_end, n);
    let mut flux = TransitModel::default()
        .light_curve(&signal.parameters(), t.view())
        .unwrap();
    let flux_err = add_noise(&mut flux, noise, seed);
    (t, flux, flux_err)
}
