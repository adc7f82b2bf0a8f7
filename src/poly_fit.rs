//! Linear least-squares polynomial fit used by the Savitzky–Golay smoother

use ndarray::{Array1, Array2};

/// Solve a square linear system with Gaussian elimination and partial pivoting
///
/// Returns [None] if the matrix is singular to working precision.
pub fn solve_linear(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    assert_eq!(a.dim(), (n, n), "matrix should be square and match the vector");

    let scale = a.iter().fold(0.0_f64, |acc, &x| acc.max(x.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return None;
    }
    let tolerance = scale * (n as f64) * f64::EPSILON;

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))?;
        if a[[pivot, col]].abs() <= tolerance {
            return None;
        }
        if pivot != col {
            for k in 0..n {
                a.swap([pivot, k], [col, k]);
            }
            b.swap(pivot, col);
        }
        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[[row, k]] * x[k]).sum();
        x[row] = (b[row] - tail) / a[[row, row]];
    }
    Some(x)
}

/// Least-squares polynomial coefficients, lowest power first
///
/// `x` should be of order unity for the normal equations to be well-conditioned.
pub fn fit_polynomial(x: &[f64], y: &[f64], order: usize) -> Option<Array1<f64>> {
    assert_eq!(x.len(), y.len(), "x and y should have the same size");
    let n = order + 1;
    if x.len() < n {
        return None;
    }
    let mut normal = Array2::zeros((n, n));
    let mut rhs = Array1::zeros(n);
    let mut powers = vec![0.0; 2 * order + 1];
    for (&xi, &yi) in x.iter().zip(y) {
        let mut p = 1.0;
        for power in powers.iter_mut() {
            *power = p;
            p *= xi;
        }
        for i in 0..n {
            rhs[i] += powers[i] * yi;
            for j in 0..n {
                normal[[i, j]] += powers[i + j];
            }
        }
    }
    solve_linear(normal, rhs)
}

/// Evaluate polynomial with coefficients in ascending power order using Horner's scheme
pub fn eval_polynomial(coeffs: &Array1<f64>, x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn solve_2x2() {
        let a = array![[2.0, 1.0], [1.0, 3.0]];
        let b = array![3.0, 5.0];
        let x = solve_linear(a, b).unwrap();
        assert_relative_eq!(x, array![0.8, 1.4], epsilon = 1e-12);
    }

    #[test]
    fn solve_needs_pivoting() {
        let a = array![[0.0, 1.0], [1.0, 0.0]];
        let b = array![2.0, 3.0];
        let x = solve_linear(a, b).unwrap();
        assert_relative_eq!(x, array![3.0, 2.0], epsilon = 1e-12);
    }

    #[test]
    fn singular_matrix() {
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        let b = array![1.0, 2.0];
        assert!(solve_linear(a, b).is_none());
    }

    #[test]
    fn exact_quadratic() {
        let x: Vec<_> = (0..7).map(|i| (i as f64 - 3.0) / 3.0).collect();
        let y: Vec<_> = x.iter().map(|&x| 1.0 - 2.0 * x + 0.5 * x * x).collect();
        let coeffs = fit_polynomial(&x, &y, 2).unwrap();
        assert_relative_eq!(coeffs, array![1.0, -2.0, 0.5], epsilon = 1e-12);
        assert_relative_eq!(eval_polynomial(&coeffs, 2.0), 1.0 - 4.0 + 2.0, epsilon = 1e-12);
    }

    #[test]
    fn too_few_points() {
        assert!(fit_polynomial(&[0.0, 1.0], &[1.0, 2.0], 2).is_none());
    }
}
