use ndarray::{Array1, ArrayView1};
use std::ops::Deref;

// Underlying array is guaranteed to be sorted and contiguous
#[derive(Clone, Debug, PartialEq)]
pub struct SortedArray(pub Array1<f64>);

impl SortedArray {
    pub fn maximum(&self) -> f64 {
        self[self.len() - 1]
    }

    pub fn minimum(&self) -> f64 {
        self[0]
    }

    pub fn median(&self) -> f64 {
        assert_ne!(self.len(), 0);
        let i = (self.len() - 1) / 2;
        if self.len() % 2 == 0 {
            0.5 * (self[i] + self[i + 1])
        } else {
            self[i]
        }
    }

    // R-5 from https://en.wikipedia.org/wiki/Quantile
    pub fn ppf(&self, q: f64) -> f64 {
        assert_ne!(self.len(), 0);
        assert!(
            (0.0..=1.0).contains(&q),
            "quantile should be between zero and unity"
        );
        let h = (self.len() as f64) * q - 0.5;
        let h_floor = h.floor();
        if h_floor < 0.0 {
            self.minimum()
        } else {
            #[allow(clippy::cast_sign_loss)]
            let i = h_floor as usize;
            if i >= self.len() - 1 {
                self.maximum()
            } else {
                self[i] + (h - h_floor) * (self[i + 1] - self[i])
            }
        }
    }

    /// Interquartile range, `ppf(0.75) - ppf(0.25)`
    pub fn iqr(&self) -> f64 {
        self.ppf(0.75) - self.ppf(0.25)
    }
}

impl From<Vec<f64>> for SortedArray {
    fn from(mut v: Vec<f64>) -> Self {
        v[..].sort_unstable_by(f64::total_cmp);
        Self(Array1::from_vec(v))
    }
}

impl From<&[f64]> for SortedArray {
    fn from(s: &[f64]) -> Self {
        s.to_vec().into()
    }
}

impl From<ArrayView1<'_, f64>> for SortedArray {
    fn from(v: ArrayView1<'_, f64>) -> Self {
        v.to_vec().into()
    }
}

impl Deref for SortedArray {
    type Target = [f64];

    fn deref(&self) -> &Self::Target {
        self.0
            .as_slice()
            .expect("SortedArray is always built from a Vec, so it is contiguous")
    }
}

impl AsRef<[f64]> for SortedArray {
    fn as_ref(&self) -> &[f64] {
        self
    }
}

#[allow(clippy::float_cmp)]
#[cfg(test)]
mod tests {
    use super::*;

    use light_curve_common::all_close;
    use rand::prelude::*;

    #[test]
    fn median_is_ppf_half() {
        let mut rng = StdRng::seed_from_u64(0);
        for i in 0..10 {
            let a: SortedArray = (0..100 + i)
                .map(|_| rng.random::<f64>())
                .collect::<Vec<_>>()
                .into();
            assert_eq!(a.median(), a.ppf(0.5));
        }
    }

    #[test]
    fn extremes_are_ppf_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let a: SortedArray = (0..101)
            .map(|_| rng.random::<f64>())
            .collect::<Vec<_>>()
            .into();
        assert_eq!(a.minimum(), a.ppf(0.0));
        assert_eq!(a.maximum(), a.ppf(1.0));
    }

    #[test]
    fn ppf_tenths() {
        let a: SortedArray = Array1::linspace(0.0, 1.0, 11).to_vec().into();
        let q = Array1::linspace(0.0, 1.0, 11);
        let actual: Vec<_> = q.iter().map(|&q| a.ppf(q)).collect();
        // from scipy.stats.mstats import mquantiles
        // mquantiles(np.linspace(0, 1, 11), prob=np.linspace(0, 1, 11), alphap=0.5, betap=0.5)
        let desired = [0., 0.06, 0.17, 0.28, 0.39, 0.5, 0.61, 0.72, 0.83, 0.94, 1.];
        all_close(&actual, &desired, 1e-7);
    }

    #[test]
    fn iqr_of_uniform_grid() {
        let a: SortedArray = Array1::linspace(0.0, 1.0, 11).to_vec().into();
        // ppf(0.75) = 0.775, ppf(0.25) = 0.225
        assert!((a.iqr() - 0.55).abs() < 1e-12);
    }
}
