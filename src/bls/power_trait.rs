use enum_dispatch::enum_dispatch;
use std::fmt::Debug;

/// Light curve folded at a trial period and assigned to phase bins
///
/// `residual` is the flux minus its weighted mean, so the total weighted residual is zero and the
/// box statistics depend on the in-box sums only.
#[derive(Clone, Debug)]
pub struct FoldedSeries<'a> {
    pub bins: Vec<usize>,
    pub weight: &'a [f64],
    pub residual: &'a [f64],
    pub total_weight: f64,
}

/// Trial boxes for one period: every start bin combined with every width, in bins
#[derive(Clone, Debug)]
pub struct BoxGrid {
    pub n_bins: usize,
    pub widths: Vec<usize>,
}

/// Best box found for one trial period
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxFit {
    pub start: usize,
    pub width: usize,
    pub power: f64,
    pub depth: f64,
    pub depth_snr: f64,
}

impl BoxFit {
    /// Box model statistics from the in-box sums of weights and weighted residuals
    ///
    /// Returns [None] for empty boxes, boxes containing all observations, and bumps.
    pub fn evaluate(
        start: usize,
        width: usize,
        weight_in: f64,
        residual_in: f64,
        total_weight: f64,
    ) -> Option<Self> {
        let weight_out = total_weight - weight_in;
        if weight_in <= 0.0 || weight_out <= f64::EPSILON * total_weight || residual_in >= 0.0 {
            return None;
        }
        let depth_variance = total_weight / (weight_in * weight_out);
        let depth = -residual_in * depth_variance;
        let power = 0.5 * depth.powi(2) / depth_variance;
        Some(Self {
            start,
            width,
            power,
            depth,
            depth_snr: depth / depth_variance.sqrt(),
        })
    }

    /// Box of zero power used when no dip-like box exists
    pub fn null(width: usize) -> Self {
        Self {
            start: 0,
            width,
            power: 0.0,
            depth: 0.0,
            depth_snr: 0.0,
        }
    }

    /// Replace `self` if the other box is strictly better, so the first found box wins ties
    pub fn keep_best(&mut self, other: Option<Self>) {
        if let Some(other) = other {
            if other.power > self.power {
                *self = other;
            }
        }
    }
}

/// Box search execution algorithm
#[enum_dispatch]
pub trait BlsPowerTrait: Debug + Clone + Send + Sync {
    fn best_box(&self, folded: &FoldedSeries<'_>, boxes: &BoxGrid) -> BoxFit;
}
