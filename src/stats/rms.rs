//! RMS and weighted RMS with uncertainties.
//!
//! Analytic uncertainties propagate the per-point measurement errors; the
//! bootstrap variants measure the sampling spread by resampling with
//! replacement. Bootstrap draws use a seeded `StdRng`, so identical inputs
//! always give identical results.

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::error::{AppError, ensure_same_len};

/// Seed used by the bootstrap estimators unless told otherwise.
pub const BOOTSTRAP_SEED: u64 = 12345;

/// `sqrt(Σ x² / N)`.
pub fn rms(x: &[f64]) -> Result<f64, AppError> {
    ensure_non_empty(x)?;
    Ok(rms_unchecked(x))
}

/// Uncertainty on the RMS from per-point errors: `sqrt(Σ (xσ)² / (N Σ x²))`.
pub fn err_rms(x: &[f64], sigma: &[f64]) -> Result<f64, AppError> {
    ensure_non_empty(x)?;
    ensure_same_len("x/sigma", x.len(), sigma.len())?;
    let sum_x2: f64 = x.iter().map(|v| v * v).sum();
    if sum_x2 <= 0.0 {
        return Err(AppError::new(4, "RMS uncertainty is undefined when all data are zero."));
    }
    let num: f64 = x.iter().zip(sigma).map(|(a, s)| (a * s).powi(2)).sum();
    Ok((num / (x.len() as f64 * sum_x2)).sqrt())
}

/// Bootstrap uncertainty on the RMS with the default seed.
pub fn err_rms_boot(x: &[f64], loopsize: usize) -> Result<f64, AppError> {
    err_rms_boot_seeded(x, loopsize, BOOTSTRAP_SEED)
}

pub fn err_rms_boot_seeded(x: &[f64], loopsize: usize, seed: u64) -> Result<f64, AppError> {
    ensure_non_empty(x)?;
    ensure_loopsize(loopsize)?;

    let n = x.len();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut sample = vec![0.0; n];
    let mut stats = Vec::with_capacity(loopsize);

    for _ in 0..loopsize {
        for slot in sample.iter_mut() {
            *slot = x[rng.gen_range(0..n)];
        }
        stats.push(rms_unchecked(&sample));
    }

    Ok(population_std(&stats))
}

/// `sqrt(Σ w x² / Σ w)`.
pub fn wrms(x: &[f64], w: &[f64]) -> Result<f64, AppError> {
    ensure_non_empty(x)?;
    ensure_same_len("x/w", x.len(), w.len())?;
    wrms_checked(x, w)
}

/// Uncertainty on the weighted RMS: `sqrt(1 / Σ w)`.
///
/// `sigma` is accepted for symmetry with [`err_rms`] and only checked for length.
pub fn err_wrms(x: &[f64], w: &[f64], sigma: &[f64]) -> Result<f64, AppError> {
    ensure_non_empty(x)?;
    ensure_same_len("x/w", x.len(), w.len())?;
    ensure_same_len("x/sigma", x.len(), sigma.len())?;
    let sum_w: f64 = w.iter().sum();
    if !(sum_w > 0.0) {
        return Err(AppError::new(4, "Sum of weights must be > 0."));
    }
    Ok((1.0 / sum_w).sqrt())
}

/// Bootstrap uncertainty on the weighted RMS with the default seed.
pub fn err_wrms_boot(x: &[f64], w: &[f64], loopsize: usize) -> Result<f64, AppError> {
    err_wrms_boot_seeded(x, w, loopsize, BOOTSTRAP_SEED)
}

/// Bootstrap on (x, w) pairs: each draw picks the same index for both arrays.
pub fn err_wrms_boot_seeded(x: &[f64], w: &[f64], loopsize: usize, seed: u64) -> Result<f64, AppError> {
    ensure_non_empty(x)?;
    ensure_same_len("x/w", x.len(), w.len())?;
    ensure_loopsize(loopsize)?;

    let n = x.len();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut xs = vec![0.0; n];
    let mut ws = vec![0.0; n];
    let mut stats = Vec::with_capacity(loopsize);

    for _ in 0..loopsize {
        for i in 0..n {
            let k = rng.gen_range(0..n);
            xs[i] = x[k];
            ws[i] = w[k];
        }
        stats.push(wrms_checked(&xs, &ws)?);
    }

    Ok(population_std(&stats))
}

/// Population standard deviation (ddof = 0).
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn rms_unchecked(x: &[f64]) -> f64 {
    (x.iter().map(|v| v * v).sum::<f64>() / x.len() as f64).sqrt()
}

fn wrms_checked(x: &[f64], w: &[f64]) -> Result<f64, AppError> {
    let den: f64 = w.iter().sum();
    if !(den > 0.0) {
        return Err(AppError::new(4, "Sum of weights must be > 0."));
    }
    let num: f64 = x.iter().zip(w).map(|(a, b)| b * a * a).sum();
    Ok((num / den).sqrt())
}

fn ensure_non_empty(x: &[f64]) -> Result<(), AppError> {
    if x.is_empty() {
        return Err(AppError::new(3, "No data points."));
    }
    Ok(())
}

fn ensure_loopsize(loopsize: usize) -> Result<(), AppError> {
    if loopsize == 0 {
        return Err(AppError::new(2, "Bootstrap loop size must be > 0."));
    }
    Ok(())
}
