use crate::data::TimeSeries;
use crate::error::{NonConvergenceReason, TransitError};
use crate::mcmc::chain::EnsembleChain;
use crate::mcmc::prior::TransitPrior;
use crate::mcmc::sample_set::PosteriorSampleSet;
use crate::mcmc::sampler::{EnsembleSampler, LnProbability};
use crate::transit::{NPARAMS, TransitModel, TransitParameters};

use log::{debug, warn};
use rand::prelude::*;
use rand_distr::StandardNormal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Configuration of [PosteriorSampler]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct SamplerConfig {
    pub n_walkers: usize,
    pub n_steps: usize,
    /// Number of the first steps discarded from every walker
    pub burn_in: usize,
    /// Keep every `thin`-th step after the burn-in
    pub thin: usize,
    /// Standard deviation of the initial walker positions around the initial guess, per free
    /// parameter
    pub initial_spread: [f64; NPARAMS],
    /// Stretch-move scale parameter `a`
    pub stretch_scale: f64,
    /// Random seed, [None] seeds from the operating system entropy
    pub seed: Option<u64>,
}

impl SamplerConfig {
    #[inline]
    pub fn default_n_walkers() -> usize {
        32
    }

    #[inline]
    pub fn default_n_steps() -> usize {
        5000
    }

    #[inline]
    pub fn default_burn_in() -> usize {
        1000
    }

    #[inline]
    pub fn default_thin() -> usize {
        1
    }

    #[inline]
    pub fn default_initial_spread() -> [f64; NPARAMS] {
        [1e-4; NPARAMS]
    }

    #[inline]
    pub fn default_stretch_scale() -> f64 {
        2.0
    }

    pub fn validate(&self) -> Result<(), TransitError> {
        EnsembleSampler::<NPARAMS>::new(self.n_walkers, self.stretch_scale)?;
        if self.burn_in >= self.n_steps {
            return Err(TransitError::invalid_parameter(
                "burn_in",
                format!(
                    "must be smaller than n_steps = {}, got {}",
                    self.n_steps, self.burn_in
                ),
            ));
        }
        if self.thin == 0 {
            return Err(TransitError::invalid_parameter("thin", "must be positive"));
        }
        if let Some(spread) = self
            .initial_spread
            .iter()
            .find(|&&x| !(x.is_finite() && x >= 0.0))
        {
            return Err(TransitError::invalid_parameter(
                "initial_spread",
                format!("must be non-negative and finite, got {spread}"),
            ));
        }
        Ok(())
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            n_walkers: Self::default_n_walkers(),
            n_steps: Self::default_n_steps(),
            burn_in: Self::default_burn_in(),
            thin: Self::default_thin(),
            initial_spread: Self::default_initial_spread(),
            stretch_scale: Self::default_stretch_scale(),
            seed: None,
        }
    }
}

/// Log-posterior of the free transit parameters given a light curve
///
/// The likelihood is Gaussian, $\ln L = -\chi^2 / 2$. Parameters outside of the prior support
/// have zero probability and do not invoke the model. Prior-valid parameters giving non-finite
/// model flux are rejected too, and counted.
pub struct TransitPosterior<'a> {
    ts: &'a TimeSeries,
    template: TransitParameters,
    model: &'a TransitModel,
    prior: &'a TransitPrior,
    evaluations: AtomicUsize,
    unstable: AtomicUsize,
}

impl<'a> TransitPosterior<'a> {
    /// `template` provides the fixed parameters: period, eccentricity, argument of periapsis and
    /// limb darkening
    pub fn new(
        ts: &'a TimeSeries,
        template: TransitParameters,
        model: &'a TransitModel,
        prior: &'a TransitPrior,
    ) -> Self {
        Self {
            ts,
            template,
            model,
            prior,
            evaluations: AtomicUsize::new(0),
            unstable: AtomicUsize::new(0),
        }
    }

    /// Number of prior-valid evaluations
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }

    /// Number of prior-valid evaluations with non-finite model flux
    pub fn unstable(&self) -> usize {
        self.unstable.load(Ordering::Relaxed)
    }
}

impl LnProbability<NPARAMS> for TransitPosterior<'_> {
    fn ln_prob(&self, params: &[f64; NPARAMS]) -> f64 {
        let ln_prior = self.prior.ln_prior(params);
        if !ln_prior.is_finite() {
            return f64::NEG_INFINITY;
        }
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        let params = self.template.with_free(*params);
        match self.model.light_curve(&params, self.ts.t.sample.view()) {
            Ok(flux) => ln_prior - 0.5 * self.ts.chi2(&flux),
            Err(TransitError::NumericalInstability { .. }) => {
                self.unstable.fetch_add(1, Ordering::Relaxed);
                f64::NEG_INFINITY
            }
            Err(_) => f64::NEG_INFINITY,
        }
    }
}

/// Output of [PosteriorSampler::sample]
#[derive(Clone, Debug)]
pub struct PosteriorRun {
    /// Full chain including the burn-in
    pub chain: EnsembleChain<NPARAMS>,
    /// Pooled samples after the burn-in, columns are
    /// [FREE_PARAMETER_NAMES](crate::transit::FREE_PARAMETER_NAMES)
    pub samples: PosteriorSampleSet,
    /// Number of prior-valid posterior evaluations
    pub evaluations: usize,
    /// Number of them with non-finite model flux
    pub unstable: usize,
}

/// Bayesian estimation of `t0`, `rp_over_rs`, `a_over_rs` and `inclination_deg` with the
/// ensemble MCMC
#[derive(Clone, Debug, Default)]
pub struct PosteriorSampler {
    config: SamplerConfig,
    model: TransitModel,
    prior: TransitPrior,
}

impl PosteriorSampler {
    pub fn new(
        config: SamplerConfig,
        model: TransitModel,
        prior: TransitPrior,
    ) -> Result<Self, TransitError> {
        config.validate()?;
        model.validate()?;
        Ok(Self {
            config,
            model,
            prior,
        })
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn prior(&self) -> &TransitPrior {
        &self.prior
    }

    /// Sample the posterior starting from walkers scattered around `initial_guess`
    ///
    /// Period and other fixed parameters are taken from `initial_guess`.
    pub fn sample(
        &self,
        ts: &TimeSeries,
        initial_guess: &TransitParameters,
    ) -> Result<PosteriorRun, TransitError> {
        ts.validate()?;
        initial_guess.validate()?;
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let center = initial_guess.free();
        let initial: Vec<[f64; NPARAMS]> = (0..self.config.n_walkers)
            .map(|_| {
                let mut x = center;
                for (x, &spread) in x.iter_mut().zip(&self.config.initial_spread) {
                    *x += spread * rng.sample::<f64, _>(StandardNormal);
                }
                x
            })
            .collect();

        let posterior = TransitPosterior::new(ts, *initial_guess, &self.model, &self.prior);
        let sampler = EnsembleSampler::<NPARAMS>::new(
            self.config.n_walkers,
            self.config.stretch_scale,
        )?;
        let chain = sampler.run(&posterior, &initial, self.config.n_steps, &mut rng)?;
        let (evaluations, unstable) = (posterior.evaluations(), posterior.unstable());

        if unstable > 0 {
            if unstable == evaluations {
                return Err(TransitError::NumericalInstability {
                    unstable,
                    evaluations,
                });
            }
            warn!(
                "Transit model gave non-finite flux in {} of {} evaluations, they were rejected",
                unstable, evaluations
            );
        }

        let samples = chain.get_flat(self.config.burn_in, self.config.thin);
        if samples.is_degenerate() {
            return Err(NonConvergenceReason::DegenerateChain.into());
        }
        debug!(
            "Posterior sampling finished: {} samples, mean acceptance fraction {:.3}",
            samples.len(),
            chain.mean_acceptance_fraction()
        );
        Ok(PosteriorRun {
            chain,
            samples,
            evaluations,
            unstable,
        })
    }
}
