use crate::data::SortedArray;

use ndarray::{Array1, Array2, ArrayView1, Axis};

/// Pooled posterior samples, one row per retained walker position
#[derive(Clone, Debug)]
pub struct PosteriorSampleSet {
    samples: Array2<f64>,
    ln_prob: Array1<f64>,
}

impl PosteriorSampleSet {
    pub fn new(samples: Array2<f64>, ln_prob: Array1<f64>) -> Self {
        assert_eq!(
            samples.nrows(),
            ln_prob.len(),
            "samples and ln_prob should have the same length"
        );
        Self { samples, ln_prob }
    }

    pub fn len(&self) -> usize {
        self.samples.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn samples(&self) -> &Array2<f64> {
        &self.samples
    }

    pub fn ln_prob(&self) -> &Array1<f64> {
        &self.ln_prob
    }

    pub fn column(&self, i: usize) -> ArrayView1<'_, f64> {
        self.samples.column(i)
    }

    /// No sample has a non-zero posterior probability
    pub fn is_degenerate(&self) -> bool {
        self.ln_prob.iter().all(|&x| x == f64::NEG_INFINITY || x.is_nan())
    }

    fn sorted_columns(&self) -> impl Iterator<Item = SortedArray> + '_ {
        self.samples.axis_iter(Axis(1)).map(SortedArray::from)
    }

    fn per_column(&self, f: impl Fn(&SortedArray) -> f64) -> Array1<f64> {
        if self.is_empty() {
            return Array1::from_elem(self.samples.ncols(), f64::NAN);
        }
        self.sorted_columns().map(|sorted| f(&sorted)).collect()
    }

    /// Median of every parameter, NaN for an empty set
    pub fn medians(&self) -> Array1<f64> {
        self.per_column(SortedArray::median)
    }

    /// `q`-th quantile of every parameter, NaN for an empty set
    pub fn quantiles(&self, q: f64) -> Array1<f64> {
        self.per_column(|sorted| sorted.ppf(q))
    }

    /// Interquartile range of every parameter, NaN for an empty set
    pub fn iqrs(&self) -> Array1<f64> {
        self.per_column(SortedArray::iqr)
    }

    /// Sample of the maximum posterior probability
    pub fn max_ln_prob_sample(&self) -> Option<ArrayView1<'_, f64>> {
        let (i, _) = self
            .ln_prob
            .iter()
            .enumerate()
            .filter(|(_, x)| !x.is_nan())
            .max_by(|(_, a), (_, b)| a.total_cmp(b))?;
        Some(self.samples.row(i))
    }
}
