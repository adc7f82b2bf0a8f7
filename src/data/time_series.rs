use crate::data::data_sample::DataSample;
use crate::error::{MalformedInputError, TransitError};

use ndarray::{Array1, Zip};

/// Light-curve time series: time, flux and flux error
///
/// Some properties, like mean flux, are cached, that's why mutable reference is required to get
/// them. Pipeline stages never modify a series in place, each of them builds a new one.
#[derive(Clone, Debug)]
pub struct TimeSeries {
    pub t: DataSample,
    pub flux: DataSample,
    pub flux_err: DataSample,
}

impl TimeSeries {
    /// Construct `TimeSeries` from array-like objects
    ///
    /// `t` is time, `flux` is flux, `flux_err` is flux uncertainty. All arrays must have the same
    /// length. Other invariants, like time monotonicity, are checked by [TimeSeries::validate].
    pub fn new(
        t: impl Into<DataSample>,
        flux: impl Into<DataSample>,
        flux_err: impl Into<DataSample>,
    ) -> Self {
        let t = t.into();
        let flux = flux.into();
        let flux_err = flux_err.into();

        assert_eq!(t.len(), flux.len(), "t and flux should have the same size");
        assert_eq!(
            flux.len(),
            flux_err.len(),
            "flux and flux_err should have the same size"
        );

        Self { t, flux, flux_err }
    }

    /// Construct [`TimeSeries`] from time and flux
    ///
    /// It is the same as [`TimeSeries::new`], but sets unity errors. Periodogram power and
    /// likelihood values are in arbitrary units in this case.
    pub fn new_without_errors(t: impl Into<DataSample>, flux: impl Into<DataSample>) -> Self {
        let t = t.into();
        let flux_err = Array1::ones(t.len());
        Self::new(t, flux, flux_err)
    }

    /// Time series length
    #[inline]
    pub fn lenu(&self) -> usize {
        self.t.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lenu() == 0
    }

    /// Check that the series is non-empty, finite, strictly increasing in time and has positive
    /// errors
    pub fn validate(&self) -> Result<(), TransitError> {
        if self.is_empty() {
            return Err(MalformedInputError::Empty.into());
        }
        for (array, sample) in [("t", &self.t), ("flux", &self.flux), ("flux_err", &self.flux_err)]
        {
            if let Some(index) = sample.position_non_finite() {
                return Err(MalformedInputError::NonFinite { array, index }.into());
            }
        }
        if let Some(index) = self
            .t
            .sample
            .windows(2)
            .into_iter()
            .position(|w| w[1] <= w[0])
        {
            return Err(MalformedInputError::NonIncreasingTime { index: index + 1 }.into());
        }
        if let Some(index) = self.flux_err.sample.iter().position(|&err| err <= 0.0) {
            return Err(MalformedInputError::NonPositiveError { index }.into());
        }
        Ok(())
    }

    /// Check that the series has at least `minimum` observations
    pub fn check_length(&self, minimum: usize) -> Result<(), TransitError> {
        if self.lenu() < minimum {
            return Err(MalformedInputError::ShortTimeSeries {
                actual: self.lenu(),
                minimum,
            }
            .into());
        }
        Ok(())
    }

    /// Inverse-variance weights, `flux_err^-2`
    pub fn weights(&self) -> Array1<f64> {
        self.flux_err.sample.mapv(|err| err.powi(-2))
    }

    /// New series consisting of observations where `keep` is true
    pub fn select(&self, keep: &[bool]) -> Self {
        assert_eq!(keep.len(), self.lenu(), "mask should have the same size");
        let pick = |sample: &DataSample| -> Vec<f64> {
            sample
                .sample
                .iter()
                .zip(keep)
                .filter_map(|(&x, &k)| k.then_some(x))
                .collect()
        };
        Self::new(pick(&self.t), pick(&self.flux), pick(&self.flux_err))
    }

    /// New series with the same time and errors but replaced flux
    pub fn with_flux(&self, flux: Array1<f64>) -> Self {
        Self::new(self.t.sample.clone(), flux, self.flux_err.sample.clone())
    }

    /// Chi-squared of the flux against a model evaluated on the same time grid
    pub fn chi2(&self, model: &Array1<f64>) -> f64 {
        Zip::from(&self.flux.sample)
            .and(&self.flux_err.sample)
            .and(model)
            .fold(0.0, |chi2, &f, &err, &m| chi2 + ((f - m) / err).powi(2))
    }
}

// We really don't want it to be public, it is a private helper for test-data functions
#[cfg(test)]
impl From<(Array1<f64>, Array1<f64>, Array1<f64>)> for TimeSeries {
    fn from(v: (Array1<f64>, Array1<f64>, Array1<f64>)) -> Self {
        Self::new(v.0, v.1, v.2)
    }
}
