//! Box least squares period search

use crate::array_stats::weighted_mean;
use crate::data::TimeSeries;
use crate::error::TransitError;

use conv::{ConvAsUtil, RoundToNearest};
use enum_dispatch::enum_dispatch;
use itertools::Itertools;
use log::debug;
use rayon::prelude::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

mod grid;
pub use grid::{ArbitraryPeriodGrid, DurationGrid, LinearPeriodGrid, PeriodGrid, PeriodGridTrait};

mod power_binned;
pub use power_binned::BlsPowerBinned;

mod power_direct;
pub use power_direct::BlsPowerDirect;

mod power_trait;
pub use power_trait::BlsPowerTrait;
use power_trait::{BoxFit, BoxGrid, FoldedSeries};

/// Minimum number of observations for the period search
pub const MIN_OBSERVATIONS: usize = 10;

/// Box search execution algorithm
#[enum_dispatch(BlsPowerTrait)]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[non_exhaustive]
pub enum BlsPower {
    Binned(BlsPowerBinned),
    Direct(BlsPowerDirect),
}

impl Default for BlsPower {
    fn default() -> Self {
        Self::Binned(BlsPowerBinned)
    }
}

/// Result of the box fit for one trial period
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CandidatePeriod {
    pub period: f64,
    /// Mid-time of a transit
    pub t0: f64,
    pub duration: f64,
    /// Out-of-transit minus in-transit weighted mean flux
    pub depth: f64,
    /// Log-likelihood improvement of the box model over the constant model
    pub power: f64,
    /// Depth over its uncertainty, equals to `sqrt(2 power)`
    pub depth_snr: f64,
}

/// Configuration of [BoxLeastSquares]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct BlsConfig {
    pub power: BlsPower,
    pub durations: DurationGrid,
    /// Number of phase bins per the shortest trial duration
    pub oversample: usize,
    /// Minimum depth S/N of a detection
    pub min_snr: f64,
}

impl BlsConfig {
    #[inline]
    pub fn default_oversample() -> usize {
        10
    }

    #[inline]
    pub fn default_min_snr() -> f64 {
        7.0
    }

    pub fn validate(&self) -> Result<(), TransitError> {
        self.durations.validate()?;
        if self.oversample == 0 {
            return Err(TransitError::invalid_parameter(
                "oversample",
                "must be positive",
            ));
        }
        if !(self.min_snr.is_finite() && self.min_snr >= 0.0) {
            return Err(TransitError::invalid_parameter(
                "min_snr",
                format!("must be non-negative and finite, got {}", self.min_snr),
            ));
        }
        Ok(())
    }
}

impl Default for BlsConfig {
    fn default() -> Self {
        Self {
            power: BlsPower::default(),
            durations: DurationGrid::default(),
            oversample: Self::default_oversample(),
            min_snr: Self::default_min_snr(),
        }
    }
}

/// Box fit results for every trial period, in the grid order
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct BlsPeriodogram {
    pub candidates: Vec<CandidatePeriod>,
}

impl BlsPeriodogram {
    /// Candidate of the maximum power, ties are broken by the smallest period
    pub fn best(&self) -> Option<&CandidatePeriod> {
        self.candidates.iter().reduce(|best, x| {
            if x.power > best.power || (x.power == best.power && x.period < best.period) {
                x
            } else {
                best
            }
        })
    }

    pub fn periods(&self) -> Vec<f64> {
        self.candidates.iter().map(|c| c.period).collect()
    }

    pub fn power(&self) -> Vec<f64> {
        self.candidates.iter().map(|c| c.power).collect()
    }
}

/// Box least squares (BLS) periodogram
///
/// For every trial period the light curve is folded with the phase
/// $\phi = ((t - t_0) \bmod P) / P$, where $t_0$ is the first observation time, and every box of
/// a phase-bin grid is tried. Box widths are given by [DurationGrid], the number of phase bins is
/// `oversample` divided by the shortest trial duration in phase units. For a box with in-transit
/// weight $W_\mathrm{in}$, out-of-transit weight $W_\mathrm{out}$, total weight $W$ (weights are
/// inverse flux variances) and depth $\delta$ the power is the log-likelihood improvement over a
/// constant model:
/// $$
/// \mathrm{power} = \frac12 \delta^2 \frac{W_\mathrm{in} W_\mathrm{out}}{W}.
/// $$
/// Only dips, $\delta > 0$, are considered.
///
/// - Depends on: **time**, **flux**, **flux error**
/// - Minimum number of observations: **10**
#[derive(Clone, Debug, Default)]
pub struct BoxLeastSquares {
    config: BlsConfig,
}

impl BoxLeastSquares {
    pub fn new(config: BlsConfig) -> Result<Self, TransitError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BlsConfig {
        &self.config
    }

    /// Box fits for every period of the grid, periods are processed in parallel
    pub fn periodogram(
        &self,
        ts: &TimeSeries,
        period_grid: &PeriodGrid,
    ) -> Result<BlsPeriodogram, TransitError> {
        ts.validate()?;
        ts.check_length(MIN_OBSERVATIONS)?;
        period_grid.validate()?;

        let weight = ts.weights();
        let mean = weighted_mean(ts.flux.sample.view(), weight.view()).ok_or_else(|| {
            TransitError::invalid_parameter("flux_err", "weights sum to zero")
        })?;
        let residual: Vec<f64> = ts.flux.sample.iter().map(|&f| f - mean).collect();
        let weight = weight.to_vec();
        let total_weight: f64 = weight.iter().sum();
        let t = ts.t.sample.as_slice().ok_or_else(|| {
            TransitError::invalid_parameter("t", "time array must be contiguous")
        })?;

        let candidates = period_grid
            .iter()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|period| {
                let boxes = self.box_grid(period)?;
                let folded = fold(t, period, boxes.n_bins, &weight, &residual, total_weight);
                let fit = self.config.power.best_box(&folded, &boxes);
                Ok(candidate(fit, t[0], period, boxes.n_bins))
            })
            .collect::<Result<Vec<_>, TransitError>>()?;

        Ok(BlsPeriodogram { candidates })
    }

    /// The best candidate period, [TransitError::NoSignalFound] if it is not significant
    pub fn search(
        &self,
        ts: &TimeSeries,
        period_grid: &PeriodGrid,
    ) -> Result<CandidatePeriod, TransitError> {
        let periodogram = self.periodogram(ts, period_grid)?;
        let best = *periodogram
            .best()
            .ok_or_else(|| TransitError::invalid_parameter("period_grid", "grid is empty"))?;
        debug!(
            "Best BLS candidate: P = {:.5}, t0 = {:.5}, duration = {:.4}, depth = {:.3e}, S/N = {:.2}",
            best.period, best.t0, best.duration, best.depth, best.depth_snr
        );
        self.check_significance(&best)?;
        Ok(best)
    }

    /// [TransitError::NoSignalFound] if the candidate S/N is below `min_snr`
    pub fn check_significance(&self, candidate: &CandidatePeriod) -> Result<(), TransitError> {
        if candidate.depth_snr < self.config.min_snr {
            return Err(TransitError::NoSignalFound {
                snr: candidate.depth_snr,
                min_snr: self.config.min_snr,
            });
        }
        Ok(())
    }

    fn box_grid(&self, period: f64) -> Result<BoxGrid, TransitError> {
        let fractions = self.config.durations.phase_fractions(period);
        let min_fraction = fractions.iter().copied().reduce(f64::min).ok_or_else(|| {
            TransitError::invalid_parameter(
                "durations",
                format!("no trial duration is shorter than a half of period {period}"),
            )
        })?;
        let n_bins: usize = (self.config.oversample as f64 / min_fraction)
            .ceil()
            .approx_by::<RoundToNearest>()
            .map_err(|_| TransitError::invalid_parameter("durations", "too many phase bins"))?;
        let n_bins = n_bins.max(2);
        let widths = fractions
            .iter()
            .map(|&fraction| {
                let width: usize = (fraction * n_bins as f64)
                    .approx_by::<RoundToNearest>()
                    .unwrap_or(1);
                width.clamp(1, n_bins - 1)
            })
            .sorted()
            .dedup()
            .collect();
        Ok(BoxGrid { n_bins, widths })
    }
}

fn fold<'a>(
    t: &[f64],
    period: f64,
    n_bins: usize,
    weight: &'a [f64],
    residual: &'a [f64],
    total_weight: f64,
) -> FoldedSeries<'a> {
    let t_ref = t[0];
    let bins = t
        .iter()
        .map(|&x| {
            let phase = (x - t_ref).rem_euclid(period) / period;
            // floor of a non-negative number
            ((phase * n_bins as f64) as usize).min(n_bins - 1)
        })
        .collect();
    FoldedSeries {
        bins,
        weight,
        residual,
        total_weight,
    }
}

fn candidate(fit: BoxFit, t_ref: f64, period: f64, n_bins: usize) -> CandidatePeriod {
    let n_bins = n_bins as f64;
    let mid_phase = ((fit.start as f64 + 0.5 * fit.width as f64) / n_bins).rem_euclid(1.0);
    CandidatePeriod {
        period,
        t0: t_ref + mid_phase * period,
        duration: fit.width as f64 / n_bins * period,
        depth: fit.depth,
        power: fit.power,
        depth_snr: fit.depth_snr,
    }
}
