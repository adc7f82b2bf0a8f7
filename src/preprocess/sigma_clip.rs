use crate::error::TransitError;

use ndarray::ArrayView1;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Mean / standard deviation sigma clipping
///
/// An observation is rejected if its value deviates from the mean of the currently retained
/// observations by more than `sigma` standard deviations. With `max_iterations = Some(1)` this is
/// a single pass, `None` repeats the clipping until no more observations are rejected.
///
/// A single pass can leave a moderate outlier masked by the scatter of a larger one, so only
/// `None` guarantees that clipping the retained values again rejects nothing.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename = "OutlierClip")]
pub struct OutlierClip {
    pub sigma: f64,
    pub max_iterations: Option<usize>,
}

impl OutlierClip {
    pub fn new(sigma: f64, max_iterations: Option<usize>) -> Result<Self, TransitError> {
        let clip = Self {
            sigma,
            max_iterations,
        };
        clip.validate()?;
        Ok(clip)
    }

    #[inline]
    pub fn default_sigma() -> f64 {
        5.0
    }

    #[inline]
    pub fn default_max_iterations() -> Option<usize> {
        Some(1)
    }

    pub fn validate(&self) -> Result<(), TransitError> {
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(TransitError::invalid_parameter(
                "sigma",
                format!("must be positive and finite, got {}", self.sigma),
            ));
        }
        if self.max_iterations == Some(0) {
            return Err(TransitError::invalid_parameter(
                "max_iterations",
                "must be positive",
            ));
        }
        Ok(())
    }

    /// Mask of retained observations
    pub fn keep_mask(&self, values: ArrayView1<f64>) -> Vec<bool> {
        let mut keep = vec![true; values.len()];
        let mut iteration = 0;
        while self.max_iterations.is_none_or(|max| iteration < max) {
            iteration += 1;
            let Some((mean, std)) = masked_mean_std(values, &keep) else {
                break;
            };
            let threshold = self.sigma * std;
            let mut changed = false;
            for (k, &x) in keep.iter_mut().zip(values) {
                if *k && (x - mean).abs() > threshold {
                    *k = false;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        keep
    }
}

impl Default for OutlierClip {
    fn default() -> Self {
        Self {
            sigma: Self::default_sigma(),
            max_iterations: Self::default_max_iterations(),
        }
    }
}

/// Mean and standard deviation (ddof = 1) of the retained values
pub(super) fn masked_mean_std(values: ArrayView1<f64>, keep: &[bool]) -> Option<(f64, f64)> {
    let (n, sum) = values
        .iter()
        .zip(keep)
        .filter(|(_, k)| **k)
        .fold((0usize, 0.0), |(n, sum), (&x, _)| (n + 1, sum + x));
    if n < 2 {
        return None;
    }
    let mean = sum / n as f64;
    let sum2 = values
        .iter()
        .zip(keep)
        .filter(|(_, k)| **k)
        .fold(0.0, |acc, (&x, _)| acc + (x - mean).powi(2));
    let std = f64::sqrt(sum2 / (n - 1) as f64);
    (std.is_finite() && std > 0.0).then_some((mean, std))
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::Array1;
    use rand::prelude::*;
    use rand_distr::StandardNormal;

    fn noise_with_outliers(seed: u64) -> Array1<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut flux: Array1<f64> = (0..1000)
            .map(|_| 1.0 + 1e-3 * rng.sample::<f64, _>(StandardNormal))
            .collect();
        flux[100] = 1.05;
        flux[500] = 0.95;
        flux
    }

    #[test]
    fn outliers_are_removed() {
        let flux = noise_with_outliers(0);
        let keep = OutlierClip::default().keep_mask(flux.view());
        assert!(!keep[100]);
        assert!(!keep[500]);
        assert_eq!(keep.iter().filter(|&&k| !k).count(), 2);
    }

    #[test]
    fn second_pass_removes_nothing() {
        let flux = noise_with_outliers(1);
        let clip = OutlierClip::default();
        let keep = clip.keep_mask(flux.view());
        let retained: Array1<f64> = flux
            .iter()
            .zip(&keep)
            .filter_map(|(&x, &k)| k.then_some(x))
            .collect();
        let keep_again = clip.keep_mask(retained.view());
        assert!(keep_again.iter().all(|&k| k));
        // looser threshold doesn't remove anything either
        let looser = OutlierClip::new(6.0, Some(1)).unwrap();
        assert!(looser.keep_mask(retained.view()).iter().all(|&k| k));
    }

    #[test]
    fn iterating_converges() {
        let mut flux = noise_with_outliers(2);
        // a moderate outlier hidden behind the large ones
        flux[700] = 1.0 + 8e-3;
        let single = OutlierClip::new(5.0, Some(1)).unwrap().keep_mask(flux.view());
        let converged = OutlierClip::new(5.0, None).unwrap().keep_mask(flux.view());
        assert!(!converged[700]);
        assert!(single.iter().zip(&converged).all(|(&s, &c)| s || !c));
    }

    fn retained(values: &Array1<f64>, keep: &[bool]) -> Array1<f64> {
        values
            .iter()
            .zip(keep)
            .filter_map(|(&x, &k)| k.then_some(x))
            .collect()
    }

    #[test]
    fn nested_outliers_need_iterations() {
        let mut flux: Array1<f64> = (0..100)
            .map(|i| 1.0 + 1e-3 * f64::sin(0.3 * i as f64))
            .collect();
        flux[10] = 1.2;
        // hidden by the std inflated by the first outlier
        flux[50] = 1.0 + 6e-3;

        let single = OutlierClip::new(5.0, Some(1)).unwrap();
        let keep = single.keep_mask(flux.view());
        assert!(!keep[10]);
        assert!(keep[50]);
        assert_eq!(keep.iter().filter(|&&k| !k).count(), 1);
        let keep_again = single.keep_mask(retained(&flux, &keep).view());
        assert_eq!(keep_again.iter().filter(|&&k| !k).count(), 1);

        let converged = OutlierClip::new(5.0, None).unwrap();
        let keep = converged.keep_mask(flux.view());
        assert!(!keep[10]);
        assert!(!keep[50]);
        assert_eq!(keep.iter().filter(|&&k| !k).count(), 2);
        let cleaned = retained(&flux, &keep);
        assert!(converged.keep_mask(cleaned.view()).iter().all(|&k| k));
        assert!(
            OutlierClip::new(6.0, None)
                .unwrap()
                .keep_mask(cleaned.view())
                .iter()
                .all(|&k| k)
        );
    }

    #[test]
    fn constant_flux_keeps_everything() {
        let flux = Array1::from_elem(20, 1.0);
        let keep = OutlierClip::default().keep_mask(flux.view());
        assert!(keep.iter().all(|&k| k));
    }

    #[test]
    fn invalid_sigma() {
        assert!(OutlierClip::new(0.0, Some(1)).is_err());
        assert!(OutlierClip::new(f64::NAN, None).is_err());
        assert!(OutlierClip::new(3.0, Some(0)).is_err());
    }
}
