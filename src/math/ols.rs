//! Weighted least squares solver.
//!
//! Light-curve bands are fitted with small linear models of the form:
//!
//! ```text
//! minimize Σ w_i (y_i - x_i^T β)^2,   w_i = 1 / σ_i^2
//! ```
//!
//! Implementation choices:
//! - Rows are scaled by `sqrt(w_i)` and the resulting ordinary least squares
//!   problem is solved with SVD, which tolerates tall design matrices.
//! - With `w_i = 1/σ_i^2` the coefficient covariance is `(X_w^T X_w)^{-1}`;
//!   it is returned alongside β so callers can propagate uncertainties.

use nalgebra::{DMatrix, DVector};

/// Solution of a weighted least squares problem.
#[derive(Debug, Clone)]
pub struct WlsSolution {
    pub beta: DVector<f64>,
    pub covariance: DMatrix<f64>,
    /// Weighted sum of squared residuals (χ² when `w = 1/σ²`).
    pub chi2: f64,
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // High-degree polynomial columns can be nearly collinear; loosen step by step.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Weighted least squares with coefficient covariance.
///
/// `x` is the unweighted design matrix (one row per observation).
pub fn weighted_least_squares(x: &DMatrix<f64>, y: &[f64], w: &[f64]) -> Option<WlsSolution> {
    let n = x.nrows();
    if n == 0 || y.len() != n || w.len() != n {
        return None;
    }
    if w.iter().any(|v| !v.is_finite() || *v <= 0.0) {
        return None;
    }

    let mut xw = x.clone();
    let mut yw = DVector::<f64>::zeros(n);
    for i in 0..n {
        let sw = w[i].sqrt();
        for j in 0..x.ncols() {
            xw[(i, j)] *= sw;
        }
        yw[i] = y[i] * sw;
    }

    let beta = solve_least_squares(&xw, &yw)?;
    let covariance = (xw.transpose() * &xw).try_inverse()?;
    if covariance.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let fitted = &xw * &beta;
    let chi2 = (&yw - fitted).norm_squared();

    Some(WlsSolution {
        beta,
        covariance,
        chi2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn weighted_fit_covariance_matches_mean_error() {
        // Constant model: β is the weighted mean, var(β) = 1 / Σw.
        let x = DMatrix::from_element(4, 1, 1.0);
        let y = [1.0, 2.0, 3.0, 4.0];
        let w = [1.0, 1.0, 4.0, 4.0];

        let sol = weighted_least_squares(&x, &y, &w).unwrap();
        let mean = (1.0 + 2.0 + 12.0 + 16.0) / 10.0;
        assert!((sol.beta[0] - mean).abs() < 1e-12);
        assert!((sol.covariance[(0, 0)] - 0.1).abs() < 1e-12);
        assert!(sol.chi2 > 0.0);
    }

    #[test]
    fn weighted_fit_rejects_bad_weights() {
        let x = DMatrix::from_element(2, 1, 1.0);
        assert!(weighted_least_squares(&x, &[1.0, 2.0], &[1.0, 0.0]).is_none());
        assert!(weighted_least_squares(&x, &[1.0], &[1.0, 1.0]).is_none());
    }
}
