//! End-to-end processing of light curves: cleaning, period search and posterior sampling

mod batch;
pub use batch::{BatchDiagnostic, BatchEntry, BatchReport, CatalogSummary, ColumnSummary};

mod initial_guess;
pub use initial_guess::{AU_OVER_SOLAR_RADIUS, InitialGuessConfig};

mod result;
pub use result::{Confidence, Diagnostic, PipelineResult, TransitEstimate};

use crate::bls::{BlsConfig, BoxLeastSquares, PeriodGrid};
use crate::data::LightCurve;
use crate::error::{NonConvergenceReason, TransitError};
use crate::mcmc::{PosteriorRun, PosteriorSampler, SamplerConfig, TransitPrior};
use crate::preprocess::{CleanedSeries, Preprocessor, PreprocessorConfig};
use crate::transit::{NPARAMS, TransitModel};

use log::{info, warn};
use rayon::prelude::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Configuration of every [Pipeline] stage
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub preprocess: PreprocessorConfig,
    pub bls: BlsConfig,
    pub period_grid: PeriodGrid,
    pub initial_guess: InitialGuessConfig,
    pub transit_model: TransitModel,
    pub prior: TransitPrior,
    pub sampler: SamplerConfig,
}

/// Output of [Pipeline::run] with intermediate products
///
/// Convergence of the sampling can be checked with the autocorrelation time of the chain,
/// `posterior.chain.autocorrelation_time(burn_in)`.
#[derive(Clone, Debug)]
pub struct PipelineRun {
    pub result: PipelineResult,
    pub cleaned: CleanedSeries,
    pub posterior: PosteriorRun,
}

/// Transit detection and characterisation of light curves
///
/// Every light curve goes through [Preprocessor], [BoxLeastSquares] on the flattened flux, an
/// initial guess from the best period candidate, [PosteriorSampler] on the smoothed flux and
/// reduction of the posterior samples to medians and interquartile ranges. A candidate below
/// the detection threshold does not stop the processing, the result is tagged with
/// [Confidence::Low] instead.
///
/// The pipeline holds no mutable state, light curves of a batch are processed independently.
#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    preprocessor: Preprocessor,
    bls: BoxLeastSquares,
    period_grid: PeriodGrid,
    initial_guess: InitialGuessConfig,
    sampler: PosteriorSampler,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, TransitError> {
        config.period_grid.validate()?;
        config.initial_guess.validate()?;
        Ok(Self {
            preprocessor: Preprocessor::new(config.preprocess)?,
            bls: BoxLeastSquares::new(config.bls)?,
            period_grid: config.period_grid,
            initial_guess: config.initial_guess,
            sampler: PosteriorSampler::new(config.sampler, config.transit_model, config.prior)?,
        })
    }

    pub fn run(&self, light_curve: &LightCurve) -> Result<PipelineRun, TransitError> {
        let id = light_curve.id.as_str();
        info!("Processing light curve {id}");

        let mut cleaned = self.preprocessor.clean(&light_curve.series)?;
        let statistics = cleaned.statistics();

        let periodogram = self.bls.periodogram(&cleaned.flattened, &self.period_grid)?;
        let candidate = *periodogram
            .best()
            .ok_or_else(|| TransitError::invalid_parameter("period_grid", "grid is empty"))?;

        let mut diagnostics = vec![];
        let confidence = match self.bls.check_significance(&candidate) {
            Ok(()) => Confidence::Normal,
            Err(error @ TransitError::NoSignalFound { .. }) => {
                warn!("Light curve {id}: {error}, fitting the best available period");
                diagnostics.push(Diagnostic::from(&error));
                Confidence::Low
            }
            Err(error) => return Err(error),
        };

        let guess = self
            .initial_guess
            .initial_guess(&candidate, &mut cleaned.smoothed)?;
        let posterior = self.sampler.sample(&cleaned.smoothed, &guess)?;
        if posterior.unstable > 0 {
            diagnostics.push(Diagnostic::from(&TransitError::NumericalInstability {
                unstable: posterior.unstable,
                evaluations: posterior.evaluations,
            }));
        }

        let medians = posterior.samples.medians();
        let medians: [f64; NPARAMS] = std::array::from_fn(|i| medians[i]);
        if let Some((parameter, value)) = self.sampler.prior().first_outside(&medians) {
            return Err(NonConvergenceReason::MedianOutsidePrior { parameter, value }.into());
        }
        let iqrs = posterior.samples.iqrs();

        let result = PipelineResult {
            id: id.to_owned(),
            statistics,
            candidate,
            medians: TransitEstimate::from_free(medians),
            iqrs: TransitEstimate::from_free(std::array::from_fn(|i| iqrs[i])),
            n_samples: posterior.samples.len(),
            acceptance_fraction: posterior.chain.mean_acceptance_fraction(),
            confidence,
            diagnostics,
        };
        info!(
            "Light curve {id}: P = {:.5}, rp/R* = {:.4}, a/R* = {:.3}, i = {:.2} deg, {:?} confidence",
            result.period(),
            result.medians.rp_over_rs,
            result.medians.a_over_rs,
            result.medians.inclination_deg,
            result.confidence,
        );

        Ok(PipelineRun {
            result,
            cleaned,
            posterior,
        })
    }

    /// Process light curves in parallel
    ///
    /// A failure is recorded in its entry and does not affect other light curves. Entries are
    /// in the input order.
    pub fn run_batch(&self, light_curves: &[LightCurve]) -> BatchReport {
        info!("Processing a batch of {} light curves", light_curves.len());
        let entries: Vec<_> = light_curves
            .par_iter()
            .map(|light_curve| {
                let outcome = self.run(light_curve).map(|run| run.result);
                if let Err(error) = &outcome {
                    warn!("Light curve {} failed: {error}", light_curve.id);
                }
                BatchEntry {
                    id: light_curve.id.clone(),
                    outcome,
                }
            })
            .collect();
        let report = BatchReport { entries };
        info!(
            "Batch finished: {} succeeded, {} failed",
            report.successes().count(),
            report.failures().count()
        );
        report
    }
}
