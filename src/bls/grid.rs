use crate::error::TransitError;

use conv::{ConvAsUtil, RoundToNearest};
use enum_dispatch::enum_dispatch;
use itertools::Itertools;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

#[enum_dispatch]
pub trait PeriodGridTrait: Send + Sync + Clone + Debug {
    fn size(&self) -> usize;
    fn get(&self, i: usize) -> f64;
    fn minimum(&self) -> f64;
    fn maximum(&self) -> f64;
}

/// Trial periods of the box search, in the units of time
#[enum_dispatch(PeriodGridTrait)]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[non_exhaustive]
pub enum PeriodGrid {
    Linear(LinearPeriodGrid),
    Arbitrary(ArbitraryPeriodGrid),
}

impl PeriodGrid {
    /// Linear grid from `start` to `stop` (exclusive) with a given `step`, like `numpy.arange`
    ///
    /// A grid with `stop - start` less than `step` consists of `start` only.
    pub fn linear(start: f64, stop: f64, step: f64) -> Result<Self, TransitError> {
        Ok(Self::Linear(LinearPeriodGrid::new(start, stop, step)?))
    }

    /// Grid of given periods, they are sorted and deduplicated
    pub fn from_periods(periods: impl IntoIterator<Item = f64>) -> Result<Self, TransitError> {
        Ok(Self::Arbitrary(ArbitraryPeriodGrid::new(periods)?))
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.size()).map(|i| self.get(i))
    }

    pub fn validate(&self) -> Result<(), TransitError> {
        match self {
            Self::Linear(grid) => grid.validate(),
            Self::Arbitrary(grid) => grid.validate(),
        }
    }

    #[inline]
    pub fn default_start() -> f64 {
        3.0
    }

    #[inline]
    pub fn default_stop() -> f64 {
        5.0
    }

    #[inline]
    pub fn default_step() -> f64 {
        1e-3
    }
}

impl Default for PeriodGrid {
    fn default() -> Self {
        Self::Linear(LinearPeriodGrid {
            start: Self::default_start(),
            step: Self::default_step(),
            size: 2000,
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename = "Linear")]
pub struct LinearPeriodGrid {
    start: f64,
    step: f64,
    size: usize,
}

impl LinearPeriodGrid {
    pub fn new(start: f64, stop: f64, step: f64) -> Result<Self, TransitError> {
        if !(start.is_finite() && start > 0.0) {
            return Err(TransitError::invalid_parameter(
                "period_grid",
                format!("start period must be positive and finite, got {start}"),
            ));
        }
        if !(step.is_finite() && step > 0.0) {
            return Err(TransitError::invalid_parameter(
                "period_grid",
                format!("period step must be positive and finite, got {step}"),
            ));
        }
        if !(stop.is_finite() && stop > start) {
            return Err(TransitError::invalid_parameter(
                "period_grid",
                format!("stop period {stop} must be larger than start period {start}"),
            ));
        }
        let size: usize = ((stop - start) / step)
            .ceil()
            .approx_by::<RoundToNearest>()
            .map_err(|_| {
                TransitError::invalid_parameter("period_grid", "too many trial periods")
            })?;
        Ok(Self {
            start,
            step,
            size: size.max(1),
        })
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    fn validate(&self) -> Result<(), TransitError> {
        if self.size == 0 {
            return Err(TransitError::invalid_parameter(
                "period_grid",
                "grid must not be empty",
            ));
        }
        if !(self.start > 0.0 && self.step > 0.0 && self.maximum().is_finite()) {
            return Err(TransitError::invalid_parameter(
                "period_grid",
                "periods must be positive and finite",
            ));
        }
        Ok(())
    }
}

impl PeriodGridTrait for LinearPeriodGrid {
    fn size(&self) -> usize {
        self.size
    }

    fn get(&self, i: usize) -> f64 {
        self.start + self.step * i as f64
    }

    fn minimum(&self) -> f64 {
        self.start
    }

    fn maximum(&self) -> f64 {
        self.get(self.size.saturating_sub(1))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename = "Arbitrary")]
pub struct ArbitraryPeriodGrid(Vec<f64>);

impl ArbitraryPeriodGrid {
    pub fn new(periods: impl IntoIterator<Item = f64>) -> Result<Self, TransitError> {
        let grid = Self(
            periods
                .into_iter()
                .sorted_by(f64::total_cmp)
                .dedup()
                .collect(),
        );
        grid.validate()?;
        Ok(grid)
    }

    fn validate(&self) -> Result<(), TransitError> {
        if self.0.is_empty() {
            return Err(TransitError::invalid_parameter(
                "period_grid",
                "grid must not be empty",
            ));
        }
        if let Some(&period) = self.0.iter().find(|p| !(p.is_finite() && **p > 0.0)) {
            return Err(TransitError::invalid_parameter(
                "period_grid",
                format!("periods must be positive and finite, got {period}"),
            ));
        }
        Ok(())
    }
}

impl PeriodGridTrait for ArbitraryPeriodGrid {
    fn size(&self) -> usize {
        self.0.len()
    }

    fn get(&self, i: usize) -> f64 {
        self.0[i]
    }

    fn minimum(&self) -> f64 {
        self.0[0]
    }

    fn maximum(&self) -> f64 {
        self.0[self.0.len() - 1]
    }
}

/// Trial transit durations of the box search
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[non_exhaustive]
pub enum DurationGrid {
    /// Durations as fractions of the trial period, each must be in (0, 1)
    PhaseFraction(Vec<f64>),
    /// Durations in the units of time, longer than a half of the trial period are skipped
    Days(Vec<f64>),
}

impl DurationGrid {
    #[inline]
    pub fn default_phase_fractions() -> Vec<f64> {
        vec![0.01, 0.02, 0.03, 0.05, 0.075, 0.1, 0.15, 0.2]
    }

    pub fn validate(&self) -> Result<(), TransitError> {
        let (values, upper) = match self {
            Self::PhaseFraction(values) => (values, 1.0),
            Self::Days(values) => (values, f64::INFINITY),
        };
        if values.is_empty() {
            return Err(TransitError::invalid_parameter(
                "durations",
                "duration grid must not be empty",
            ));
        }
        if let Some(&value) = values.iter().find(|&&x| !(x > 0.0 && x < upper)) {
            return Err(TransitError::invalid_parameter(
                "durations",
                format!("duration {value} is out of the allowed range (0, {upper})"),
            ));
        }
        Ok(())
    }

    /// Durations as phase fractions for a given period
    pub(super) fn phase_fractions(&self, period: f64) -> Vec<f64> {
        match self {
            Self::PhaseFraction(fractions) => fractions.clone(),
            Self::Days(days) => days
                .iter()
                .map(|&d| d / period)
                .filter(|&fraction| fraction <= 0.5)
                .collect(),
        }
    }
}

impl Default for DurationGrid {
    fn default() -> Self {
        Self::PhaseFraction(Self::default_phase_fractions())
    }
}
