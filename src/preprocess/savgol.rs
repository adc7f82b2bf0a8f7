use crate::error::TransitError;
use crate::poly_fit::{eval_polynomial, fit_polynomial};

use conv::prelude::*;
use macro_const::macro_const;
use ndarray::{Array1, ArrayView1, s};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

macro_const! {
    const DOC: &str = r"
Savitzky–Golay smoothing filter

Every point is replaced by the value of the least-squares polynomial of order $k$ fitted to the
$w$ points centred on it. Interior points use a fixed convolution kernel, the first and the last
$\lfloor w/2 \rfloor$ points are evaluated from a polynomial fitted to the first (last) $w$ points
of the series, so the output has the same length as the input.

The filter is index-based: it assumes the series is close to uniformly sampled.

- Window length $w$ must be odd and larger than $k$
- The series must have at least $w$ points
";
}

#[doc = DOC!()]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename = "SavGol")]
pub struct SavGolConfig {
    pub window_length: usize,
    pub polyorder: usize,
}

impl SavGolConfig {
    pub fn new(window_length: usize, polyorder: usize) -> Result<Self, TransitError> {
        let config = Self {
            window_length,
            polyorder,
        };
        config.validate()?;
        Ok(config)
    }

    #[inline]
    pub fn default_window_length() -> usize {
        51
    }

    #[inline]
    pub fn default_polyorder() -> usize {
        2
    }

    pub const fn doc() -> &'static str {
        DOC
    }

    pub fn validate(&self) -> Result<(), TransitError> {
        if self.window_length % 2 == 0 {
            return Err(TransitError::invalid_parameter(
                "window_length",
                format!("must be odd, got {}", self.window_length),
            ));
        }
        if self.window_length <= self.polyorder {
            return Err(TransitError::invalid_parameter(
                "window_length",
                format!(
                    "must be larger than polyorder {}, got {}",
                    self.polyorder, self.window_length
                ),
            ));
        }
        Ok(())
    }

    /// Smooth `y`, see [SavGolConfig] for details
    pub fn filter(&self, y: ArrayView1<f64>) -> Result<Array1<f64>, TransitError> {
        self.validate()?;
        let n = y.len();
        let w = self.window_length;
        if n < w {
            return Err(TransitError::invalid_parameter(
                "window_length",
                format!("{w} is longer than the series of {n} points"),
            ));
        }
        let half = w / 2;
        let kernel = savgol_kernel(w, self.polyorder)?;

        let mut smoothed = Array1::zeros(n);
        for i in half..n - half {
            let window = y.slice(s![i - half..=i + half]);
            smoothed[i] = kernel.dot(&window);
        }

        // Edges are evaluated from polynomials fitted to the first and the last windows
        let x = window_abscissa(w);
        let fit_edge = |window: ArrayView1<f64>| {
            let values: Vec<_> = window.iter().copied().collect();
            fit_polynomial(&x, &values, self.polyorder).ok_or_else(|| {
                TransitError::invalid_parameter(
                    "polyorder",
                    "Savitzky-Golay edge fit is singular",
                )
            })
        };
        let head = fit_edge(y.slice(s![..w]))?;
        let tail = fit_edge(y.slice(s![n - w..]))?;
        for i in 0..half {
            smoothed[i] = eval_polynomial(&head, x[i]);
            smoothed[n - w + half + 1 + i] = eval_polynomial(&tail, x[half + 1 + i]);
        }
        Ok(smoothed)
    }
}

impl Default for SavGolConfig {
    fn default() -> Self {
        Self {
            window_length: Self::default_window_length(),
            polyorder: Self::default_polyorder(),
        }
    }
}

/// Window positions scaled to [-1, 1]
fn window_abscissa(window_length: usize) -> Vec<f64> {
    let half = window_length / 2;
    let scale: f64 = half.max(1).approx().unwrap_or(1.0);
    (0..window_length)
        .map(|j| (j as f64 - half as f64) / scale)
        .collect()
}

/// Convolution kernel giving the value of the fitted polynomial at the window centre
fn savgol_kernel(window_length: usize, polyorder: usize) -> Result<Array1<f64>, TransitError> {
    let x = window_abscissa(window_length);
    // The centre value is linear in y, so the kernel is the response to unit impulses
    (0..window_length)
        .map(|j| {
            let mut impulse = vec![0.0; window_length];
            impulse[j] = 1.0;
            fit_polynomial(&x, &impulse, polyorder)
                .map(|coeffs| coeffs[0])
                .ok_or_else(|| {
                    TransitError::invalid_parameter("polyorder", "Savitzky-Golay fit is singular")
                })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unreadable_literal)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use light_curve_common::all_close;

    #[test]
    fn even_window_is_rejected() {
        let err = SavGolConfig::new(50, 2).unwrap_err();
        assert!(matches!(
            err,
            TransitError::InvalidParameter {
                name: "window_length",
                ..
            }
        ));
    }

    #[test]
    fn window_not_longer_than_polyorder_is_rejected() {
        assert!(SavGolConfig::new(3, 3).is_err());
        assert!(SavGolConfig::new(1, 2).is_err());
        assert!(SavGolConfig::new(5, 4).is_ok());
    }

    #[test]
    fn window_longer_than_series_is_rejected() {
        let y = Array1::zeros(10);
        assert!(SavGolConfig::new(11, 2).unwrap().filter(y.view()).is_err());
    }

    #[test]
    fn kernel_5_2_is_classic() {
        // scipy.signal.savgol_coeffs(5, 2)
        let desired = [-3.0 / 35.0, 12.0 / 35.0, 17.0 / 35.0, 12.0 / 35.0, -3.0 / 35.0];
        let kernel = savgol_kernel(5, 2).unwrap();
        all_close(kernel.as_slice().unwrap(), &desired, 1e-12);
    }

    #[test]
    fn polynomial_is_preserved() {
        let x = Array1::linspace(-2.0, 3.0, 40);
        let y = x.mapv(|x| 0.3 + 1.5 * x - 0.7 * x * x);
        let smoothed = SavGolConfig::new(9, 2).unwrap().filter(y.view()).unwrap();
        assert_relative_eq!(smoothed, y, epsilon = 1e-9);
    }

    #[test]
    fn noise_is_reduced() {
        use rand::prelude::*;
        use rand_distr::StandardNormal;

        let mut rng = StdRng::seed_from_u64(0);
        let y: Array1<f64> = (0..500)
            .map(|_| 1.0 + 0.01 * rng.sample::<f64, _>(StandardNormal))
            .collect();
        let smoothed = SavGolConfig::new(51, 2).unwrap().filter(y.view()).unwrap();
        let std = |a: &Array1<f64>| a.std(1.0);
        assert!(std(&smoothed) < 0.5 * std(&y));
    }

    #[test]
    fn single_point_window_is_identity() {
        let y = Array1::from(vec![1.0, 3.0, 2.0]);
        let smoothed = SavGolConfig::new(1, 0).unwrap().filter(y.view()).unwrap();
        assert_relative_eq!(smoothed, y, epsilon = 1e-12);
    }
}
