use crate::mcmc::sample_set::PosteriorSampleSet;

use log::warn;
use ndarray::{Array1, Array2, Array3, ArrayView1, Axis, s};

/// Autocorrelation window constant of the Sokal automatic windowing
pub const AUTOCORRELATION_WINDOW_C: f64 = 5.0;

/// Full history of an ensemble run
///
/// `chain` has shape `(n_steps, n_walkers, NPARAMS)`, `ln_prob` has shape `(n_steps, n_walkers)`.
#[derive(Clone, Debug)]
pub struct EnsembleChain<const NPARAMS: usize> {
    pub chain: Array3<f64>,
    pub ln_prob: Array2<f64>,
    pub(super) accepted: Array1<usize>,
}

impl<const NPARAMS: usize> EnsembleChain<NPARAMS> {
    pub fn n_steps(&self) -> usize {
        self.chain.shape()[0]
    }

    pub fn n_walkers(&self) -> usize {
        self.chain.shape()[1]
    }

    /// Fraction of accepted proposals per walker
    pub fn acceptance_fraction(&self) -> Array1<f64> {
        let n_steps = self.n_steps().max(1) as f64;
        self.accepted.mapv(|n| n as f64 / n_steps)
    }

    pub fn mean_acceptance_fraction(&self) -> f64 {
        self.acceptance_fraction().mean().unwrap_or(0.0)
    }

    /// Samples of all walkers pooled together, first `discard` steps are dropped and every
    /// `thin`-th step is kept
    ///
    /// Samples are ordered by step, then by walker.
    pub fn get_flat(&self, discard: usize, thin: usize) -> PosteriorSampleSet {
        let thin = thin.max(1) as isize;
        let discard = discard.min(self.n_steps());
        let chain = self.chain.slice(s![discard..;thin, .., ..]);
        let ln_prob = self.ln_prob.slice(s![discard..;thin, ..]);
        let n = chain.shape()[0] * chain.shape()[1];
        let samples = chain
            .as_standard_layout()
            .into_owned()
            .into_shape_with_order((n, NPARAMS))
            .unwrap_or_else(|_| Array2::zeros((0, NPARAMS)));
        let ln_prob = ln_prob.iter().copied().collect();
        PosteriorSampleSet::new(samples, ln_prob)
    }

    /// Integrated autocorrelation time of every parameter, in steps
    ///
    /// The normalized autocorrelation function is averaged over walkers and summed up to the
    /// smallest window $M \geq c \tau(M)$ with $c = 5$ (Sokal 1997). If the chain is too short for
    /// such a window the estimate for the longest window is returned. NaN is returned for
    /// parameters with no variance.
    pub fn autocorrelation_time(&self, discard: usize) -> [f64; NPARAMS] {
        let discard = discard.min(self.n_steps());
        let mut taus = [f64::NAN; NPARAMS];
        for (dim, tau) in taus.iter_mut().enumerate() {
            let series = self.chain.slice(s![discard.., .., dim]);
            *tau = integrated_time(series.axis_iter(Axis(1)), AUTOCORRELATION_WINDOW_C);
        }
        taus
    }
}

fn autocorrelation(x: &[f64], lag: usize) -> f64 {
    x.iter().zip(&x[lag..]).map(|(a, b)| a * b).sum::<f64>()
}

fn integrated_time<'a>(walkers: impl Iterator<Item = ArrayView1<'a, f64>>, c: f64) -> f64 {
    let centered: Vec<(Vec<f64>, f64)> = walkers
        .filter_map(|series| {
            let mean = series.mean()?;
            let x: Vec<f64> = series.iter().map(|&v| v - mean).collect();
            let variance = autocorrelation(&x, 0);
            (variance > 0.0).then_some((x, variance))
        })
        .collect();
    let Some(n) = centered.first().map(|(x, _)| x.len()) else {
        return f64::NAN;
    };
    let n_walkers = centered.len() as f64;

    let mut tau = 1.0;
    for lag in 1..n {
        let rho = centered
            .iter()
            .map(|(x, variance)| autocorrelation(x, lag) / variance)
            .sum::<f64>()
            / n_walkers;
        tau += 2.0 * rho;
        if lag as f64 >= c * tau {
            return tau;
        }
    }
    warn!(
        "Chain of {} steps is too short for a reliable autocorrelation time estimate",
        n
    );
    tau
}
