use crate::synthetic::box_dip::{BoxDip, box_dip_light_curve};
use crate::synthetic::types::TripleArray;

use lazy_static::lazy_static;

/// Dip of the `i`-th batch light curve, periods are spread over 3.2..4.8 days
pub fn batch_dip(i: usize) -> BoxDip {
    BoxDip {
        period: 3.2 + 0.4 * i as f64,
        t0: 0.5 + 0.3 * i as f64,
        duration: 0.15,
        depth: 0.008 + 0.002 * i as f64,
    }
}

lazy_static! {
    /// Five 27-day box-dip light curves with 1000 observations and 1e-3 noise each
    pub static ref BATCH_LIGHT_CURVES: Vec<(String, TripleArray)> = (0..5)
        .map(|i| {
            (
                format!("synthetic-{i}"),
                box_dip_light_curve(&batch_dip(i), 0.0, 27.0, 1000, 1e-3, 100 + i as u64),
            )
        })
        .collect();
}
