//! Light-curve cleaning: outlier rejection, detrending and smoothing

mod flatten;
pub use flatten::FlattenConfig;

mod savgol;
pub use savgol::SavGolConfig;

mod sigma_clip;
pub use sigma_clip::OutlierClip;

use crate::data::TimeSeries;
use crate::error::{MalformedInputError, TransitError};

use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Configuration of [Preprocessor]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct PreprocessorConfig {
    pub outlier_clip: OutlierClip,
    pub flatten: FlattenConfig,
    pub smooth: Option<SavGolConfig>,
}

impl PreprocessorConfig {
    #[inline]
    pub fn default_smooth() -> Option<SavGolConfig> {
        Some(SavGolConfig::default())
    }

    pub fn validate(&self) -> Result<(), TransitError> {
        self.outlier_clip.validate()?;
        self.flatten.validate()?;
        if let Some(smooth) = &self.smooth {
            smooth.validate()?;
        }
        Ok(())
    }
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        Self {
            outlier_clip: OutlierClip::default(),
            flatten: FlattenConfig::default(),
            smooth: Self::default_smooth(),
        }
    }
}

/// Output of [Preprocessor::clean]
#[derive(Clone, Debug)]
pub struct CleanedSeries {
    /// Outlier-free detrended series, input of the period search
    pub flattened: TimeSeries,
    /// Smoothed version of `flattened`, input of the transit fit
    pub smoothed: TimeSeries,
    /// Number of observations rejected as outliers
    pub n_clipped: usize,
}

/// Summary statistics of a cleaned light curve
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SeriesStatistics {
    pub mean: f64,
    /// Standard deviation with one degree of freedom
    pub std: f64,
    pub n_points: usize,
}

impl CleanedSeries {
    /// Statistics of the smoothed flux
    pub fn statistics(&mut self) -> SeriesStatistics {
        SeriesStatistics {
            mean: self.smoothed.flux.get_mean(),
            std: self.smoothed.flux.get_std(),
            n_points: self.smoothed.lenu(),
        }
    }
}

/// Sigma clipping, detrending and optional Savitzky–Golay smoothing
///
/// All steps are pure: the input series is left untouched and the same input always gives
/// bit-identical output.
#[derive(Clone, Debug)]
pub struct Preprocessor {
    config: PreprocessorConfig,
}

impl Preprocessor {
    pub fn new(config: PreprocessorConfig) -> Result<Self, TransitError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Preprocessor with default detrending and given clipping and smoothing parameters
    pub fn with_parameters(
        outlier_sigma: f64,
        smooth_window: usize,
        smooth_poly: usize,
    ) -> Result<Self, TransitError> {
        Self::new(PreprocessorConfig {
            outlier_clip: OutlierClip {
                sigma: outlier_sigma,
                ..OutlierClip::default()
            },
            flatten: FlattenConfig::default(),
            smooth: Some(SavGolConfig::new(smooth_window, smooth_poly)?),
        })
    }

    pub fn config(&self) -> &PreprocessorConfig {
        &self.config
    }

    /// Minimum number of observations accepted by [Preprocessor::clean]
    pub fn min_length(&self) -> usize {
        self.config
            .smooth
            .as_ref()
            .map_or(1, |smooth| smooth.window_length)
    }

    pub fn clean(&self, ts: &TimeSeries) -> Result<CleanedSeries, TransitError> {
        ts.validate()?;
        ts.check_length(self.min_length())?;

        let keep = self.config.outlier_clip.keep_mask(ts.flux.sample.view());
        let clipped = ts.select(&keep);
        if clipped.is_empty() {
            return Err(MalformedInputError::Empty.into());
        }
        clipped.check_length(self.min_length())?;
        let n_clipped = ts.lenu() - clipped.lenu();
        debug!(
            "Sigma clipping removed {} of {} observations",
            n_clipped,
            ts.lenu()
        );

        let flattened = self.config.flatten.flatten(&clipped)?;
        let smoothed = match &self.config.smooth {
            Some(savgol) => flattened.with_flux(savgol.filter(flattened.flux.sample.view())?),
            None => flattened.clone(),
        };

        Ok(CleanedSeries {
            flattened,
            smoothed,
            n_clipped,
        })
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self {
            config: PreprocessorConfig::default(),
        }
    }
}
