//! Straight-line fit with an explicit outlier population.
//!
//! Generative model (Hogg, Bovy & Lang 2010, arXiv:1008.4686): each point is
//! either an inlier drawn around the line `y = m x + b` with its own error, or,
//! with probability `Pb`, an outlier drawn from a broad Gaussian centred at
//! `Yb` with variance `exp(eVb) + σ_i²`. The outlier variance is sampled in log
//! space because its plausible range spans many orders of magnitude.

use nalgebra::DMatrix;

use crate::error::{AppError, ensure_same_len};
use crate::math::{SimplexOptions, minimize, weighted_least_squares};

/// Observed points with y-errors.
#[derive(Debug, Clone, PartialEq)]
pub struct LineData {
    x: Vec<f64>,
    y: Vec<f64>,
    sigma_y: Vec<f64>,
}

impl LineData {
    pub fn new(x: Vec<f64>, y: Vec<f64>, sigma_y: Vec<f64>) -> Result<Self, AppError> {
        if x.is_empty() {
            return Err(AppError::new(3, "No data points for the line fit."));
        }
        ensure_same_len("x/y", x.len(), y.len())?;
        ensure_same_len("x/sigma_y", x.len(), sigma_y.len())?;
        if sigma_y.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return Err(AppError::new(2, "Line fit errors must be finite and > 0."));
        }
        Ok(Self { x, y, sigma_y })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// `(m, b, Pb, Yb, eVb)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixtureParams {
    pub slope: f64,
    pub intercept: f64,
    /// Outlier probability `Pb`.
    pub outlier_prob: f64,
    /// Outlier mean `Yb`.
    pub outlier_mean: f64,
    /// Log outlier variance `eVb`.
    pub outlier_log_var: f64,
}

impl MixtureParams {
    fn to_vec(self) -> Vec<f64> {
        vec![
            self.slope,
            self.intercept,
            self.outlier_prob,
            self.outlier_mean,
            self.outlier_log_var,
        ]
    }

    fn from_slice(p: &[f64]) -> Self {
        Self {
            slope: p[0],
            intercept: p[1],
            outlier_prob: p[2],
            outlier_mean: p[3],
            outlier_log_var: p[4],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub params: MixtureParams,
    pub ln_likelihood: f64,
}

/// Mixture log-likelihood. Returns `-inf` for `Pb` outside `[0, 1]`.
pub fn ln_likelihood(params: &MixtureParams, data: &LineData) -> f64 {
    let pb = params.outlier_prob;
    if !(0.0..=1.0).contains(&pb) {
        return f64::NEG_INFINITY;
    }
    let ln_in = (1.0 - pb).ln();
    let ln_out = pb.ln();
    let vb = params.outlier_log_var.exp();

    let mut total = 0.0;
    for i in 0..data.len() {
        let s2 = data.sigma_y[i] * data.sigma_y[i];
        let line = params.slope * data.x[i] + params.intercept;
        let a = ln_in + ln_normal(data.y[i], line, s2);
        let b = ln_out + ln_normal(data.y[i], params.outlier_mean, vb + s2);
        total += log_add_exp(a, b);
    }
    total
}

/// Maximize [`ln_likelihood`] with the simplex minimizer.
///
/// Without an explicit starting point, the slope and intercept start from a
/// weighted least-squares line, `Pb` from 0.1, `Yb` from the mean of `y` and
/// `exp(eVb)` from the variance of `y`.
pub fn fit_line_with_outliers(data: &LineData, initial: Option<MixtureParams>) -> Result<LineFit, AppError> {
    let start = match initial {
        Some(p) => p,
        None => default_start(data)?,
    };
    if !(start.outlier_prob > 0.0 && start.outlier_prob < 1.0) {
        return Err(AppError::new(2, "Initial outlier probability must be in (0, 1)."));
    }

    let min = minimize(
        |p| {
            if !(p[2] > 0.0 && p[2] < 1.0) {
                return f64::INFINITY;
            }
            -ln_likelihood(&MixtureParams::from_slice(p), data)
        },
        &start.to_vec(),
        &SimplexOptions::default(),
    )?;

    Ok(LineFit {
        params: MixtureParams::from_slice(&min.params),
        ln_likelihood: -min.cost,
    })
}

fn default_start(data: &LineData) -> Result<MixtureParams, AppError> {
    let n = data.len();
    let mut x = DMatrix::<f64>::zeros(n, 2);
    for i in 0..n {
        x[(i, 0)] = 1.0;
        x[(i, 1)] = data.x[i];
    }
    let w: Vec<f64> = data.sigma_y.iter().map(|s| 1.0 / (s * s)).collect();
    let (intercept, slope) = match weighted_least_squares(&x, &data.y, &w) {
        Some(sol) => (sol.beta[0], sol.beta[1]),
        None => (crate::stats::mean(&data.y), 0.0),
    };

    let y_mean = crate::stats::mean(&data.y);
    let y_var = data.y.iter().map(|v| (v - y_mean).powi(2)).sum::<f64>() / n as f64;

    Ok(MixtureParams {
        slope,
        intercept,
        outlier_prob: 0.1,
        outlier_mean: y_mean,
        outlier_log_var: y_var.max(1e-6).ln(),
    })
}

fn ln_normal(y: f64, mean: f64, var: f64) -> f64 {
    -0.5 * (2.0 * std::f64::consts::PI * var).ln() - (y - mean).powi(2) / (2.0 * var)
}

fn log_add_exp(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    let hi = a.max(b);
    hi + ((a - hi).exp() + (b - hi).exp()).ln()
}
