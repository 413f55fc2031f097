//! Polynomial models used for per-band light-curve fits.
//!
//! A band model is `m(t) = Σ_k c_k u^k` with `u = (t - t0) / scale`. Centering
//! and scaling keep the design matrix well conditioned when `t` is an MJD.

use nalgebra::DMatrix;

/// Fill the design row `[1, u, u^2, ..., u^degree]`.
///
/// # Panics
/// Panics if `out.len() != degree + 1`.
pub fn fill_poly_row(u: f64, degree: usize, out: &mut [f64]) {
    assert_eq!(out.len(), degree + 1, "design row has wrong length");
    let mut p = 1.0;
    for slot in out.iter_mut() {
        *slot = p;
        p *= u;
    }
}

/// Fill the row of `d/du [1, u, ..., u^degree]`.
pub fn fill_poly_derivative_row(u: f64, degree: usize, out: &mut [f64]) {
    assert_eq!(out.len(), degree + 1, "derivative row has wrong length");
    out[0] = 0.0;
    let mut p = 1.0;
    for k in 1..=degree {
        out[k] = k as f64 * p;
        p *= u;
    }
}

/// Evaluate a polynomial with Horner's rule.
pub fn eval_poly(coeffs: &[f64], u: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * u + c)
}

/// Coefficients of `d/du` of a polynomial.
pub fn derivative_coeffs(coeffs: &[f64]) -> Vec<f64> {
    coeffs
        .iter()
        .enumerate()
        .skip(1)
        .map(|(k, c)| k as f64 * c)
        .collect()
}

/// Quadratic form `rᵀ C r`: variance of a linear combination of coefficients.
pub fn quadratic_form(row: &[f64], cov: &DMatrix<f64>) -> f64 {
    let n = row.len().min(cov.nrows());
    let mut acc = 0.0;
    for i in 0..n {
        for j in 0..n {
            acc += row[i] * cov[(i, j)] * row[j];
        }
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_and_horner_agree() {
        let coeffs = [1.0, -2.0, 0.5];
        let mut row = [0.0; 3];
        fill_poly_row(3.0, 2, &mut row);
        let direct: f64 = row.iter().zip(coeffs.iter()).map(|(r, c)| r * c).sum();
        assert!((direct - eval_poly(&coeffs, 3.0)).abs() < 1e-12);

        // d/du (1 - 2u + 0.5u^2) = -2 + u
        fill_poly_derivative_row(3.0, 2, &mut row);
        let slope: f64 = row.iter().zip(coeffs.iter()).map(|(r, c)| r * c).sum();
        assert!((slope - 1.0).abs() < 1e-12);
    }

    #[test]
    fn derivative_of_cubic() {
        // 1 + 2u + 3u^2 + 4u^3 -> 2 + 6u + 12u^2 -> 6 + 24u
        let d1 = derivative_coeffs(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(d1, vec![2.0, 6.0, 12.0]);
        assert_eq!(derivative_coeffs(&d1), vec![6.0, 24.0]);
        assert!(derivative_coeffs(&[5.0]).is_empty());
    }

    #[test]
    fn quadratic_form_diagonal() {
        let cov = DMatrix::from_diagonal(&nalgebra::DVector::from_row_slice(&[4.0, 9.0]));
        let v = quadratic_form(&[1.0, 2.0], &cov);
        assert!((v - (4.0 + 36.0)).abs() < 1e-12);
    }
}
