//! Model evaluation for polynomial band fits.
//!
//! The fitter and plots rely on a few primitive operations:
//! - map an observation time to the scaled polynomial variable
//! - predict `m(t)` and its 1σ model uncertainty
//! - locate the brightest point of the model on a time grid

use nalgebra::DMatrix;

use crate::domain::BandFit;
use crate::math::{eval_poly, fill_poly_row, quadratic_form};

/// Scaled polynomial variable `u = (t - t0) / scale`.
pub fn scaled_time(fit: &BandFit, t: f64) -> f64 {
    (t - fit.t0) / fit.scale
}

pub fn degree(fit: &BandFit) -> usize {
    fit.coeffs.len().saturating_sub(1)
}

/// Predict the magnitude at time `t`.
pub fn predict(fit: &BandFit, t: f64) -> f64 {
    eval_poly(&fit.coeffs, scaled_time(fit, t))
}

/// 1σ model uncertainty at time `t`, from the coefficient covariance.
pub fn predict_error(fit: &BandFit, t: f64) -> f64 {
    let mut row = vec![0.0; fit.coeffs.len()];
    fill_poly_row(scaled_time(fit, t), degree(fit), &mut row);
    quadratic_form(&row, &covariance_matrix(fit)).max(0.0).sqrt()
}

/// Coefficient covariance as a matrix.
pub fn covariance_matrix(fit: &BandFit) -> DMatrix<f64> {
    let n = fit.coeffs.len();
    DMatrix::from_fn(n, n, |i, j| {
        fit.covariance
            .get(i)
            .and_then(|row| row.get(j))
            .copied()
            .unwrap_or(0.0)
    })
}

/// Evenly spaced times covering `[t_first, t_last]`, at most `max_points`.
pub fn model_grid(fit: &BandFit, step: f64, max_points: usize) -> Vec<f64> {
    let span = fit.t_last - fit.t_first;
    if span <= 0.0 || max_points < 2 {
        return vec![fit.t_first];
    }
    let n = ((span / step).ceil() as usize + 1).clamp(2, max_points);
    (0..n)
        .map(|i| fit.t_first + span * i as f64 / (n - 1) as f64)
        .collect()
}

/// Brightest (smallest magnitude) model point on a grid, as `(t, m)`.
pub fn brightest_point(fit: &BandFit, step: f64, max_points: usize) -> (f64, f64) {
    model_grid(fit, step, max_points)
        .into_iter()
        .map(|t| (t, predict(fit, t)))
        .fold((fit.t_first, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parabola() -> BandFit {
        // m(u) = 15 + 0.5 u^2 with u = (t - 10) / 5
        BandFit {
            band: "B".to_string(),
            rest_band: "B".to_string(),
            t0: 10.0,
            scale: 5.0,
            coeffs: vec![15.0, 0.0, 0.5],
            covariance: vec![vec![0.01, 0.0, 0.0], vec![0.0, 0.0, 0.0], vec![0.0, 0.0, 0.0]],
            t_first: 0.0,
            t_last: 30.0,
            t_peak: 10.0,
            m_peak: 15.0,
            e_m_peak: 0.1,
            chi2: 0.0,
            n_points: 10,
        }
    }

    #[test]
    fn predict_uses_scaled_time() {
        let fit = parabola();
        assert!((predict(&fit, 10.0) - 15.0).abs() < 1e-12);
        assert!((predict(&fit, 15.0) - 15.5).abs() < 1e-12);
        assert!((predict_error(&fit, 20.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn brightest_point_finds_vertex() {
        let (t, m) = brightest_point(&parabola(), 0.01, 10_000);
        assert!((t - 10.0).abs() < 0.01);
        assert!((m - 15.0).abs() < 1e-5);
    }

    #[test]
    fn grid_spans_data_range() {
        let g = model_grid(&parabola(), 1.0, 1000);
        assert_eq!(g.len(), 31);
        assert_eq!(g[0], 0.0);
        assert_eq!(*g.last().unwrap(), 30.0);
    }
}
