use crate::data::sorted_array::SortedArray;

use conv::prelude::*;
use ndarray::{Array1, ArrayView1, s};

/// A [`TimeSeries`](crate::TimeSeries) component
#[derive(Clone, Debug)]
pub struct DataSample {
    pub sample: Array1<f64>,
    sorted: Option<SortedArray>,
    min: Option<f64>,
    max: Option<f64>,
    mean: Option<f64>,
    median: Option<f64>,
    std: Option<f64>,
    std2: Option<f64>,
}

macro_rules! data_sample_getter {
    ($attr: ident, $getter: ident, $func: expr, $method_sorted: ident) => {
        pub fn $getter(&mut self) -> f64 {
            match self.$attr {
                Some(x) => x,
                None => {
                    let value = match self.sorted.as_ref() {
                        Some(sorted) => sorted.$method_sorted(),
                        None => $func(self),
                    };
                    self.$attr = Some(value);
                    value
                }
            }
        }
    };
    ($attr: ident, $getter: ident, $func: expr) => {
        pub fn $getter(&mut self) -> f64 {
            match self.$attr {
                Some(x) => x,
                None => {
                    let value = $func(self);
                    self.$attr = Some(value);
                    value
                }
            }
        }
    };
}

impl DataSample {
    pub fn new(sample: Array1<f64>) -> Self {
        Self {
            sample,
            sorted: None,
            min: None,
            max: None,
            mean: None,
            median: None,
            std: None,
            std2: None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sample.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sample.is_empty()
    }

    pub fn get_sorted(&mut self) -> &SortedArray {
        self.sorted
            .get_or_insert_with(|| self.sample.to_vec().into())
    }

    fn set_min_max(&mut self) {
        let (min, max) =
            self.sample
                .slice(s![1..])
                .fold((self.sample[0], self.sample[0]), |(min, max), &x| {
                    if x > max {
                        (min, x)
                    } else if x < min {
                        (x, max)
                    } else {
                        (min, max)
                    }
                });
        self.min = Some(min);
        self.max = Some(max);
    }

    data_sample_getter!(
        min,
        get_min,
        |ds: &mut DataSample| {
            ds.set_min_max();
            ds.min.unwrap_or(f64::NAN)
        },
        minimum
    );
    data_sample_getter!(
        max,
        get_max,
        |ds: &mut DataSample| {
            ds.set_min_max();
            ds.max.unwrap_or(f64::NAN)
        },
        maximum
    );
    data_sample_getter!(mean, get_mean, |ds: &mut DataSample| {
        ds.sample.mean().unwrap_or(f64::NAN)
    });
    data_sample_getter!(median, get_median, |ds: &mut DataSample| {
        ds.get_sorted().median()
    });
    data_sample_getter!(std, get_std, |ds: &mut DataSample| {
        ds.get_std2().sqrt()
    });
    data_sample_getter!(std2, get_std2, |ds: &mut DataSample| {
        let mean = ds.get_mean();
        let ddof: f64 = ds.sample.len().saturating_sub(1).approx().unwrap_or(f64::NAN);
        ds.sample
            .fold(0.0, |sum, &x| sum + (x - mean).powi(2))
            / ddof
    });

    /// Index of the first non-finite value
    pub fn position_non_finite(&self) -> Option<usize> {
        self.sample.iter().position(|x| !x.is_finite())
    }
}

impl From<&[f64]> for DataSample {
    fn from(s: &[f64]) -> Self {
        ArrayView1::from(s).into()
    }
}

impl From<&Vec<f64>> for DataSample {
    fn from(v: &Vec<f64>) -> Self {
        v.as_slice().into()
    }
}

impl<const N: usize> From<&[f64; N]> for DataSample {
    fn from(a: &[f64; N]) -> Self {
        a.as_slice().into()
    }
}

impl From<Vec<f64>> for DataSample {
    fn from(v: Vec<f64>) -> Self {
        Array1::from(v).into()
    }
}

impl From<ArrayView1<'_, f64>> for DataSample {
    fn from(a: ArrayView1<'_, f64>) -> Self {
        Self::new(a.to_owned())
    }
}

impl From<&Array1<f64>> for DataSample {
    fn from(a: &Array1<f64>) -> Self {
        Self::new(a.clone())
    }
}

impl From<Array1<f64>> for DataSample {
    fn from(a: Array1<f64>) -> Self {
        Self::new(a)
    }
}
