use crate::error::TransitError;
use crate::mcmc::chain::EnsembleChain;

use log::debug;
use ndarray::{Array1, Array2, Array3};
use rand::prelude::*;
use rayon::prelude::*;

/// Unnormalized log-probability density sampled by [EnsembleSampler]
///
/// Minus infinity marks zero probability, NaN is treated the same way.
pub trait LnProbability<const NPARAMS: usize>: Sync {
    fn ln_prob(&self, params: &[f64; NPARAMS]) -> f64;
}

impl<F, const NPARAMS: usize> LnProbability<NPARAMS> for F
where
    F: Fn(&[f64; NPARAMS]) -> f64 + Sync,
{
    fn ln_prob(&self, params: &[f64; NPARAMS]) -> f64 {
        self(params)
    }
}

/// Affine-invariant ensemble sampler with the stretch move
///
/// Walkers are randomly split into two halves on every step. Each walker $X_k$ of the first half
/// gets a proposal $Y = X_j + z (X_k - X_j)$, where $X_j$ is a random walker of the second half
/// and $z$ is drawn from $g(z) \propto 1/\sqrt{z}$ on $[1/a, a]$. The proposal is accepted with
/// the probability $\min(1, z^{N - 1} p(Y) / p(X_k))$. Then the halves swap roles
/// (Goodman & Weare 2010, Foreman-Mackey et al. 2013).
///
/// All random numbers are drawn from the single generator before the log-probabilities of a half
/// are evaluated in parallel, so the chain depends on the generator state only.
#[derive(Clone, Debug)]
pub struct EnsembleSampler<const NPARAMS: usize> {
    n_walkers: usize,
    stretch_scale: f64,
}

impl<const NPARAMS: usize> EnsembleSampler<NPARAMS> {
    pub fn new(n_walkers: usize, stretch_scale: f64) -> Result<Self, TransitError> {
        if n_walkers < 2 * NPARAMS {
            return Err(TransitError::invalid_parameter(
                "n_walkers",
                format!(
                    "must be at least twice the number of parameters {NPARAMS}, got {n_walkers}"
                ),
            ));
        }
        if !(stretch_scale.is_finite() && stretch_scale > 1.0) {
            return Err(TransitError::invalid_parameter(
                "stretch_scale",
                format!("must be finite and larger than unity, got {stretch_scale}"),
            ));
        }
        Ok(Self {
            n_walkers,
            stretch_scale,
        })
    }

    pub fn n_walkers(&self) -> usize {
        self.n_walkers
    }

    /// Advance walkers from `initial` positions for `n_steps` steps
    pub fn run<P, R>(
        &self,
        ln_prob: &P,
        initial: &[[f64; NPARAMS]],
        n_steps: usize,
        rng: &mut R,
    ) -> Result<EnsembleChain<NPARAMS>, TransitError>
    where
        P: LnProbability<NPARAMS>,
        R: Rng,
    {
        if initial.len() != self.n_walkers {
            return Err(TransitError::invalid_parameter(
                "initial",
                format!(
                    "expected {} walker positions, got {}",
                    self.n_walkers,
                    initial.len()
                ),
            ));
        }

        let mut positions = initial.to_vec();
        let mut current_ln_prob: Vec<f64> = positions
            .par_iter()
            .map(|x| sanitize(ln_prob.ln_prob(x)))
            .collect();

        let mut chain = Array3::zeros((n_steps, self.n_walkers, NPARAMS));
        let mut chain_ln_prob = Array2::zeros((n_steps, self.n_walkers));
        let mut accepted = Array1::zeros(self.n_walkers);

        let mut order: Vec<usize> = (0..self.n_walkers).collect();
        let half = self.n_walkers / 2;
        for step in 0..n_steps {
            order.shuffle(rng);
            let (first, second) = order.split_at(half);
            for (active, complementary) in [(first, second), (second, first)] {
                let proposals: Vec<Proposal<NPARAMS>> = active
                    .iter()
                    .map(|&k| {
                        let j = complementary[rng.random_range(0..complementary.len())];
                        let z = self.draw_stretch(rng);
                        let mut params = [0.0; NPARAMS];
                        for ((y, &x_k), &x_j) in
                            params.iter_mut().zip(&positions[k]).zip(&positions[j])
                        {
                            *y = x_j + z * (x_k - x_j);
                        }
                        Proposal {
                            walker: k,
                            params,
                            ln_z: z.ln(),
                            ln_u: rng.random::<f64>().ln(),
                        }
                    })
                    .collect();
                let proposal_ln_prob: Vec<f64> = proposals
                    .par_iter()
                    .map(|proposal| sanitize(ln_prob.ln_prob(&proposal.params)))
                    .collect();
                for (proposal, new_ln_prob) in proposals.into_iter().zip(proposal_ln_prob) {
                    let k = proposal.walker;
                    let old_ln_prob = current_ln_prob[k];
                    let ln_q = if new_ln_prob == f64::NEG_INFINITY {
                        f64::NEG_INFINITY
                    } else if old_ln_prob == f64::NEG_INFINITY {
                        f64::INFINITY
                    } else {
                        (NPARAMS - 1) as f64 * proposal.ln_z + new_ln_prob - old_ln_prob
                    };
                    if proposal.ln_u < ln_q {
                        positions[k] = proposal.params;
                        current_ln_prob[k] = new_ln_prob;
                        accepted[k] += 1;
                    }
                }
            }
            for (k, (x, &lp)) in positions.iter().zip(&current_ln_prob).enumerate() {
                for (i, &value) in x.iter().enumerate() {
                    chain[(step, k, i)] = value;
                }
                chain_ln_prob[(step, k)] = lp;
            }
        }

        let chain = EnsembleChain {
            chain,
            ln_prob: chain_ln_prob,
            accepted,
        };
        debug!(
            "Ensemble of {} walkers made {} steps, mean acceptance fraction {:.3}",
            self.n_walkers,
            n_steps,
            chain.mean_acceptance_fraction()
        );
        Ok(chain)
    }

    /// Draw from $g(z) \propto 1/\sqrt{z}$ on $[1/a, a]$ by inverse transform
    fn draw_stretch<R: Rng>(&self, rng: &mut R) -> f64 {
        let a = self.stretch_scale;
        ((a - 1.0) * rng.random::<f64>() + 1.0).powi(2) / a
    }
}

struct Proposal<const NPARAMS: usize> {
    walker: usize,
    params: [f64; NPARAMS],
    ln_z: f64,
    ln_u: f64,
}

fn sanitize(ln_prob: f64) -> f64 {
    if ln_prob.is_nan() {
        f64::NEG_INFINITY
    } else {
        ln_prob
    }
}

#[cfg(test)]
#[allow(clippy::unreadable_literal)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use rand_distr::StandardNormal;

    fn gaussian_start(n_walkers: usize, seed: u64) -> Vec<[f64; 2]> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n_walkers)
            .map(|_| {
                [
                    rng.sample::<f64, _>(StandardNormal),
                    rng.sample::<f64, _>(StandardNormal),
                ]
            })
            .collect()
    }

    // correlated 2-D Gaussian with means (1, -2), unit variances and correlation 0.9
    fn ln_prob_gaussian(x: &[f64; 2]) -> f64 {
        let (dx, dy) = (x[0] - 1.0, x[1] + 2.0);
        let rho: f64 = 0.9;
        -0.5 * (dx * dx - 2.0 * rho * dx * dy + dy * dy) / (1.0 - rho * rho)
    }

    #[test]
    fn samples_correlated_gaussian() {
        let sampler = EnsembleSampler::<2>::new(16, 2.0).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let chain = sampler
            .run(&ln_prob_gaussian, &gaussian_start(16, 1), 3000, &mut rng)
            .unwrap();
        let samples = chain.get_flat(500, 1);
        let medians = samples.medians();
        assert_abs_diff_eq!(medians[0], 1.0, epsilon = 0.15);
        assert_abs_diff_eq!(medians[1], -2.0, epsilon = 0.15);
        // IQR of the unit normal distribution
        let iqrs = samples.iqrs();
        assert_abs_diff_eq!(iqrs[0], 1.349, epsilon = 0.15);
        assert_abs_diff_eq!(iqrs[1], 1.349, epsilon = 0.15);
        let acceptance = chain.mean_acceptance_fraction();
        assert!(acceptance > 0.2 && acceptance < 0.9, "{acceptance}");
    }

    #[test]
    fn same_seed_same_chain() {
        let sampler = EnsembleSampler::<2>::new(8, 2.0).unwrap();
        let run = |seed| {
            sampler
                .run(
                    &ln_prob_gaussian,
                    &gaussian_start(8, 2),
                    200,
                    &mut StdRng::seed_from_u64(seed),
                )
                .unwrap()
        };
        let a = run(3);
        let b = run(3);
        let c = run(4);
        assert_eq!(a.chain, b.chain);
        assert_eq!(a.ln_prob, b.ln_prob);
        assert_ne!(a.chain, c.chain);
    }

    #[test]
    fn walkers_escape_zero_probability_start() {
        // half of the walkers start outside of the support
        let ln_prob = |x: &[f64; 2]| {
            if x[0] > 0.0 {
                -0.5 * (x[0] - 1.0).powi(2) - 0.5 * x[1].powi(2)
            } else {
                f64::NEG_INFINITY
            }
        };
        let initial: Vec<[f64; 2]> = (0..8)
            .map(|i| [if i % 2 == 0 { 1.0 } else { -1.0 } + 0.01 * i as f64, 0.01 * i as f64])
            .collect();
        let sampler = EnsembleSampler::<2>::new(8, 2.0).unwrap();
        let chain = sampler
            .run(&ln_prob, &initial, 500, &mut StdRng::seed_from_u64(5))
            .unwrap();
        let last = chain.ln_prob.row(499);
        assert!(last.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn all_walkers_outside_support_stay() {
        let ln_prob = |_: &[f64; 2]| f64::NEG_INFINITY;
        let sampler = EnsembleSampler::<2>::new(4, 2.0).unwrap();
        let chain = sampler
            .run(
                &ln_prob,
                &gaussian_start(4, 6),
                50,
                &mut StdRng::seed_from_u64(7),
            )
            .unwrap();
        assert!(chain.get_flat(10, 1).is_degenerate());
        assert_eq!(chain.mean_acceptance_fraction(), 0.0);
    }

    #[test]
    fn invalid_sampler() {
        assert!(EnsembleSampler::<4>::new(7, 2.0).is_err());
        assert!(EnsembleSampler::<4>::new(8, 1.0).is_err());
        let sampler = EnsembleSampler::<2>::new(4, 2.0).unwrap();
        assert!(
            sampler
                .run(
                    &ln_prob_gaussian,
                    &gaussian_start(5, 0),
                    1,
                    &mut StdRng::seed_from_u64(0)
                )
                .is_err()
        );
    }
}
