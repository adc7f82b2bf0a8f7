//! Simple array statistics functions

use crate::data::SortedArray;

use ndarray::{ArrayView1, Zip};

/// Compute the weighted mean of an array
pub fn weighted_mean(values: ArrayView1<f64>, weights: ArrayView1<f64>) -> Option<f64> {
    if values.is_empty() || values.len() != weights.len() {
        return None;
    }

    let (sum, weight_sum) = Zip::from(values)
        .and(weights)
        .fold((0.0, 0.0), |(sum, weight_sum), &v, &w| {
            (sum + v * w, weight_sum + w)
        });

    if weight_sum == 0.0 {
        None
    } else {
        Some(sum / weight_sum)
    }
}

/// Pearson correlation coefficient of two equally sized arrays
///
/// Returns [None] for arrays shorter than two elements or if any of them is constant
pub fn pearson_correlation(x: ArrayView1<f64>, y: ArrayView1<f64>) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let x_mean = x.mean()?;
    let y_mean = y.mean()?;
    let (cov, x_var, y_var) =
        Zip::from(x)
            .and(y)
            .fold((0.0, 0.0, 0.0), |(cov, x_var, y_var), &a, &b| {
                let dx = a - x_mean;
                let dy = b - y_mean;
                (cov + dx * dy, x_var + dx * dx, y_var + dy * dy)
            });
    if x_var == 0.0 || y_var == 0.0 {
        None
    } else {
        Some(cov / f64::sqrt(x_var * y_var))
    }
}

/// Median difference of consecutive elements, typical cadence of a time grid
pub fn median_step(t: ArrayView1<f64>) -> Option<f64> {
    if t.len() < 2 {
        return None;
    }
    let steps: Vec<_> = t
        .windows(2)
        .into_iter()
        .map(|w| w[1] - w[0])
        .collect();
    Some(SortedArray::from(steps).median())
}
