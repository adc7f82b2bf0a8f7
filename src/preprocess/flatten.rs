use crate::array_stats::median_step;
use crate::data::TimeSeries;
use crate::error::{MalformedInputError, TransitError};
use crate::preprocess::savgol::SavGolConfig;
use crate::preprocess::sigma_clip::masked_mean_std;

use ndarray::{Array1, ArrayView1};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Long-term trend removal
///
/// The trend is a Savitzky–Golay filter of the flux with a window much longer than a transit,
/// evaluated independently for every contiguous segment of the light curve. Segments are split
/// where the time gap exceeds `break_tolerance` median cadences. The trend is refined
/// `n_iterations` times: observations deviating from the current trend by more than `sigma`
/// standard deviations (transit points among them) are excluded from the next filter pass and
/// get a trend value interpolated from their neighbours. The flattened flux and flux error are
/// divided by the trend.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename = "Flatten")]
pub struct FlattenConfig {
    pub window_length: usize,
    pub polyorder: usize,
    pub n_iterations: usize,
    pub sigma: f64,
    pub break_tolerance: f64,
}

impl FlattenConfig {
    #[inline]
    pub fn default_window_length() -> usize {
        101
    }

    #[inline]
    pub fn default_polyorder() -> usize {
        2
    }

    #[inline]
    pub fn default_n_iterations() -> usize {
        3
    }

    #[inline]
    pub fn default_sigma() -> f64 {
        3.0
    }

    #[inline]
    pub fn default_break_tolerance() -> f64 {
        5.0
    }

    pub fn validate(&self) -> Result<(), TransitError> {
        SavGolConfig {
            window_length: self.window_length,
            polyorder: self.polyorder,
        }
        .validate()?;
        if self.n_iterations == 0 {
            return Err(TransitError::invalid_parameter(
                "n_iterations",
                "must be positive",
            ));
        }
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(TransitError::invalid_parameter(
                "sigma",
                format!("must be positive and finite, got {}", self.sigma),
            ));
        }
        if !(self.break_tolerance.is_finite() && self.break_tolerance > 0.0) {
            return Err(TransitError::invalid_parameter(
                "break_tolerance",
                format!("must be positive and finite, got {}", self.break_tolerance),
            ));
        }
        Ok(())
    }

    /// Estimate the long-term trend of the flux
    pub fn trend(&self, ts: &TimeSeries) -> Result<Array1<f64>, TransitError> {
        self.validate()?;
        let t = ts.t.sample.view();
        let flux = ts.flux.sample.view();
        let segments = self.segments(t);

        let mut keep = vec![true; ts.lenu()];
        let mut trend = Array1::zeros(ts.lenu());
        for iteration in 0..self.n_iterations {
            for segment in &segments {
                self.segment_trend(t, flux, &keep, segment.clone(), &mut trend)?;
            }
            if iteration + 1 == self.n_iterations {
                break;
            }
            let residual = &flux - &trend;
            let Some((mean, std)) = masked_mean_std(residual.view(), &keep) else {
                break;
            };
            for (k, &r) in keep.iter_mut().zip(&residual) {
                if (r - mean).abs() > self.sigma * std {
                    *k = false;
                }
            }
        }

        if let Some(index) = trend.iter().position(|&x| !(x.is_finite() && x > 0.0)) {
            return Err(MalformedInputError::NonPositiveTrend { index }.into());
        }
        Ok(trend)
    }

    /// Divide flux and its error by the trend
    pub fn flatten(&self, ts: &TimeSeries) -> Result<TimeSeries, TransitError> {
        let trend = self.trend(ts)?;
        Ok(TimeSeries::new(
            ts.t.sample.clone(),
            &ts.flux.sample / &trend,
            &ts.flux_err.sample / &trend,
        ))
    }

    fn segments(&self, t: ArrayView1<f64>) -> Vec<std::ops::Range<usize>> {
        let Some(cadence) = median_step(t) else {
            return vec![0..t.len()];
        };
        let max_gap = self.break_tolerance * cadence;
        let mut segments = vec![];
        let mut start = 0;
        for i in 1..t.len() {
            if t[i] - t[i - 1] > max_gap {
                segments.push(start..i);
                start = i;
            }
        }
        segments.push(start..t.len());
        segments
    }

    fn segment_trend(
        &self,
        t: ArrayView1<f64>,
        flux: ArrayView1<f64>,
        keep: &[bool],
        segment: std::ops::Range<usize>,
        trend: &mut Array1<f64>,
    ) -> Result<(), TransitError> {
        let mut idx: Vec<usize> = segment.clone().filter(|&i| keep[i]).collect();
        if idx.is_empty() {
            idx = segment.clone().collect();
        }
        let values: Array1<f64> = idx.iter().map(|&i| flux[i]).collect();

        // Short segments get a shorter window, the shortest ones a constant trend
        let mut window = self.window_length.min(idx.len());
        if window % 2 == 0 {
            window -= 1;
        }
        let smoothed = if window > self.polyorder {
            SavGolConfig::new(window, self.polyorder)?.filter(values.view())?
        } else {
            let mean = values.mean().unwrap_or(f64::NAN);
            Array1::from_elem(values.len(), mean)
        };

        let xp: Vec<_> = idx.iter().map(|&i| t[i]).collect();
        for i in segment {
            trend[i] = interp(t[i], &xp, smoothed.as_slice().unwrap_or(&[]));
        }
        Ok(())
    }
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            window_length: Self::default_window_length(),
            polyorder: Self::default_polyorder(),
            n_iterations: Self::default_n_iterations(),
            sigma: Self::default_sigma(),
            break_tolerance: Self::default_break_tolerance(),
        }
    }
}

/// Piecewise-linear interpolation clamped to the end values, `xp` must be increasing
fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    match xp.partition_point(|&v| v < x) {
        _ if fp.is_empty() => f64::NAN,
        0 => fp[0],
        i if i == xp.len() => fp[xp.len() - 1],
        i if xp[i] == x => fp[i],
        i => {
            let w = (x - xp[i - 1]) / (xp[i] - xp[i - 1]);
            fp[i - 1] + w * (fp[i] - fp[i - 1])
        }
    }
}
