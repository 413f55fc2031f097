//! Fit summaries, per-point residuals and formatted text output.

use crate::domain::{LcFitResult, LightCurve};
use crate::error::AppError;
use crate::models::predict;

/// Observed minus model magnitude of one photometric point.
#[derive(Debug, Clone, PartialEq)]
pub struct BandResidual {
    pub band: String,
    pub time: f64,
    pub mag: f64,
    pub mag_fit: f64,
    pub err: f64,
    pub residual: f64,
}

impl BandResidual {
    /// Residual in units of the photometric error.
    pub fn pull(&self) -> f64 {
        self.residual / self.err
    }
}

/// Residuals of every fitted band, in light-curve order.
pub fn compute_residuals(lc: &LightCurve, fit: &LcFitResult) -> Result<Vec<BandResidual>, AppError> {
    let mut out = Vec::new();
    for band_fit in &fit.bands {
        let Some(band) = lc.band(&band_fit.band) else {
            return Err(AppError::new(
                3,
                format!("Fitted band {} missing from light curve {}.", band_fit.band, lc.name),
            ));
        };
        for o in &band.points {
            let mag_fit = predict(band_fit, o.time);
            if !mag_fit.is_finite() {
                return Err(AppError::new(4, "Non-finite model prediction during residual computation."));
            }
            out.push(BandResidual {
                band: band.name.clone(),
                time: o.time,
                mag: o.mag,
                mag_fit,
                err: o.err,
                residual: o.mag - mag_fit,
            });
        }
    }
    Ok(out)
}

/// The `top_n` points with the largest |pull|.
pub fn largest_pulls(residuals: &[BandResidual], top_n: usize) -> Vec<BandResidual> {
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| {
        b.pull()
            .abs()
            .partial_cmp(&a.pull().abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted.truncate(top_n);
    sorted
}

/// Full fit summary (shape parameters, distance, per-band table).
pub fn format_fit_summary(fit: &LcFitResult) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== {} ({}) ===\n", fit.sn, fit.model));
    out.push_str(&format!("z            = {:.5}\n", fit.z));
    out.push_str(&format!("Tmax         = {:.3} +/- {:.3}  (band {})\n", fit.tmax, fit.e_tmax, fit.reference_band));
    out.push_str(&format!("dm15         = {:.3} +/- {:.3}\n", fit.dm15, fit.e_dm15));
    out.push_str(&format!("DM           = {:.3} +/- {:.3}  (M_abs = {:.2})\n", fit.dm, fit.e_dm, fit.absolute_mag));
    out.push_str(&format!(
        "mu(z)        = {:.3}  (Om={}, w={}, H0={})\n",
        fit.mu_model, fit.cosmology.omega_m, fit.cosmology.w, fit.cosmology.h0
    ));
    out.push_str(&format!("DM - mu(z)   = {:.3}\n", fit.hubble_residual()));

    out.push_str("\nBands:\n");
    out.push_str(
        format!(
            "{:<8} {:<8} {:>4} {:>10} {:>8} {:>8} {:>10} {:>8}\n",
            "band", "rest", "n", "t_peak", "m_peak", "e_m", "chi2", "K(Tmax)"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<8} {:-<8} {:-<4} {:-<10} {:-<8} {:-<8} {:-<10} {:-<8}\n", "", "", "", "", "", "", "", "").trim_end());
    out.push('\n');

    for b in &fit.bands {
        let k_peak = fit
            .kcorr(&b.band)
            .and_then(|k| nearest_value(&k.times, &k.values, fit.tmax))
            .map(|v| format!("{v:>8.3}"))
            .unwrap_or_else(|| format!("{:>8}", "-"));
        out.push_str(
            format!(
                "{:<8} {:<8} {:>4} {:>10.3} {:>8.3} {:>8.3} {:>10.3} {}\n",
                truncate(&b.band, 8),
                truncate(&b.rest_band, 8),
                b.n_points,
                b.t_peak,
                b.m_peak,
                b.e_m_peak,
                b.chi2,
                k_peak
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// Format a residual table.
pub fn format_residual_table(rows: &[BandResidual]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<8} {:>10} {:>8} {:>8} {:>8} {:>8}\n",
            "band", "time", "mag", "mag_fit", "resid", "pull"
        )
        .trim_end(),
    );
    out.push('\n');
    for r in rows {
        out.push_str(
            format!(
                "{:<8} {:>10.3} {:>8.3} {:>8.3} {:>8.3} {:>8.2}\n",
                truncate(&r.band, 8),
                r.time,
                r.mag,
                r.mag_fit,
                r.residual,
                r.pull()
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// Text lines drawn on the annotated fit figure.
pub fn fit_annotation(fit: &LcFitResult) -> Vec<String> {
    vec![
        format!("dm15 = {:.3} +/- {:.3}", fit.dm15, fit.e_dm15),
        format!("z = {:.4}", fit.z),
        format!("mu(z) = {:.3}", fit.mu_model),
        format!("Tmax = {:.2} +/- {:.2}", fit.tmax, fit.e_tmax),
        format!("DM = {:.3} +/- {:.3}", fit.dm, fit.e_dm),
    ]
}

fn nearest_value(times: &[f64], values: &[f64], t: f64) -> Option<f64> {
    times
        .iter()
        .zip(values)
        .min_by(|a, b| {
            (a.0 - t)
                .abs()
                .partial_cmp(&(b.0 - t).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(_, v)| *v)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
