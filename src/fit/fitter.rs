//! Light-curve fitting.
//!
//! A [`LightCurveFitter`] turns multi-band photometry into an [`LcFitResult`]:
//! time of maximum, decline rate `Δm15`, peak magnitudes, k-corrections and a
//! distance modulus. The pipeline only talks to the trait, so the model behind
//! it can be swapped.
//!
//! [`PeakPolynomialFitter`] is the built-in model:
//! - each band is fitted with a weighted polynomial in `u = (t - t0) / scale`
//! - `Tmax` is the brightest model point of the reference band (`B` when
//!   fitted, otherwise the first fitted band)
//! - `Δm15 = m(Tmax + 15 (1+z)) - m(Tmax)` in the reference band
//! - `DM = m_max - K(Tmax) - M_abs`
//!
//! Uncertainties come from the coefficient covariance of each band fit.

use log::{debug, warn};
use nalgebra::DMatrix;

use super::kcorr::{KcorrOptions, compute_kcorrections, kcorr_at};
use crate::cosmology::{CosmoParams, distance_modulus};
use crate::domain::{BandData, BandFit, LcFitResult, LightCurve};
use crate::error::AppError;
use crate::math::{
    derivative_coeffs, eval_poly, fill_poly_derivative_row, fill_poly_row, quadratic_form,
    weighted_least_squares,
};
use crate::models::{brightest_point, covariance_matrix, predict, predict_error, scaled_time};

/// Peak absolute B magnitude of a normal SN Ia.
pub const DEFAULT_ABSOLUTE_MAG: f64 = -19.3;
pub const DEFAULT_POLY_DEGREE: usize = 4;
/// Reference band used for `Tmax` and `Δm15` when it was fitted.
pub const PREFERRED_REFERENCE_BAND: &str = "B";

const GRID_STEP_DAYS: f64 = 0.01;
const MAX_GRID_POINTS: usize = 200_000;

/// A light-curve model that can be fitted to a set of bands.
///
/// `Sync` so one fitter can serve parallel Monte Carlo refits.
pub trait LightCurveFitter: Sync {
    /// Model label recorded in outputs.
    fn name(&self) -> String;

    /// Fit the named bands of `lc`.
    fn fit(&self, lc: &LightCurve, bands: &[String]) -> Result<LcFitResult, AppError>;
}

/// Options of the polynomial peak fitter.
#[derive(Debug, Clone)]
pub struct FitOptions {
    pub poly_degree: usize,
    pub kcorr: KcorrOptions,
    pub cosmology: CosmoParams,
    pub absolute_mag: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            poly_degree: DEFAULT_POLY_DEGREE,
            kcorr: KcorrOptions::default(),
            cosmology: CosmoParams::default(),
            absolute_mag: DEFAULT_ABSOLUTE_MAG,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PeakPolynomialFitter {
    opts: FitOptions,
}

impl PeakPolynomialFitter {
    pub fn new(opts: FitOptions) -> Self {
        Self { opts }
    }
}

impl LightCurveFitter for PeakPolynomialFitter {
    fn name(&self) -> String {
        format!("poly{}", self.opts.poly_degree)
    }

    fn fit(&self, lc: &LightCurve, bands: &[String]) -> Result<LcFitResult, AppError> {
        if !(lc.z.is_finite() && lc.z > 0.0) {
            return Err(AppError::new(
                2,
                format!("{}: redshift must be positive (got {}).", lc.name, lc.z),
            ));
        }
        self.opts.cosmology.validate()?;

        let mut fits: Vec<BandFit> = Vec::new();
        let mut data: Vec<&BandData> = Vec::new();
        for name in bands {
            let Some(band) = lc.band(name) else {
                warn!("{}: band {name} not in light curve; skipped", lc.name);
                continue;
            };
            match fit_band(band, lc.rest_band(name), self.opts.poly_degree) {
                Ok(fit) => {
                    debug!(
                        "{} {name}: {} points, chi2={:.3}, peak {:.3} at {:.2}",
                        lc.name, fit.n_points, fit.chi2, fit.m_peak, fit.t_peak
                    );
                    fits.push(fit);
                    data.push(band);
                }
                Err(e) => warn!("{}: band {name} skipped: {e}", lc.name),
            }
        }
        if fits.is_empty() {
            return Err(AppError::new(
                4,
                format!("{}: no band could be fitted from {bands:?}.", lc.name),
            ));
        }

        let ref_idx = fits
            .iter()
            .position(|f| f.band == PREFERRED_REFERENCE_BAND)
            .unwrap_or(0);
        let reference = &fits[ref_idx];

        let (tmax, e_tmax) = time_of_maximum(reference)?;
        let (dm15, e_dm15) = decline_rate(reference, tmax, e_tmax, lc.z);

        let kcorrs = compute_kcorrections(&fits, &data, lc.z, self.opts.kcorr);
        let k_peak = kcorr_at(&fits, reference, tmax, lc.z, self.opts.kcorr);
        let dm = reference.m_peak - k_peak - self.opts.absolute_mag;
        let mu_model = distance_modulus(lc.z, &self.opts.cosmology)?;

        Ok(LcFitResult {
            sn: lc.name.clone(),
            z: lc.z,
            model: self.name(),
            reference_band: reference.band.clone(),
            tmax,
            e_tmax,
            dm15,
            e_dm15,
            dm,
            e_dm: reference.e_m_peak,
            mu_model,
            absolute_mag: self.opts.absolute_mag,
            cosmology: self.opts.cosmology,
            bands: fits,
            kcorrs,
        })
    }
}

/// Weighted polynomial fit of one band (`w = 1/σ²`).
pub fn fit_band(band: &BandData, rest_band: &str, degree: usize) -> Result<BandFit, AppError> {
    let n = band.points.len();
    let p = degree + 1;
    if n < p {
        return Err(AppError::new(
            3,
            format!("{n} points cannot constrain a degree-{degree} polynomial."),
        ));
    }
    if band
        .points
        .iter()
        .any(|o| !(o.time.is_finite() && o.mag.is_finite() && o.err.is_finite() && o.err > 0.0))
    {
        return Err(AppError::new(
            2,
            format!("Band {} has non-finite values or non-positive errors.", band.name),
        ));
    }

    let times = band.times();
    let mags = band.mags();
    let weights: Vec<f64> = band.errs().iter().map(|e| 1.0 / (e * e)).collect();

    // Points are time-sorted by `BandData::new`.
    let t_first = times[0];
    let t_last = times[n - 1];
    let t0 = times.iter().sum::<f64>() / n as f64;
    let half_span = 0.5 * (t_last - t_first);
    let scale = if half_span > 0.0 { half_span } else { 1.0 };

    let mut x = DMatrix::<f64>::zeros(n, p);
    let mut row = vec![0.0; p];
    for (i, &t) in times.iter().enumerate() {
        fill_poly_row((t - t0) / scale, degree, &mut row);
        for (j, v) in row.iter().enumerate() {
            x[(i, j)] = *v;
        }
    }

    let sol = weighted_least_squares(&x, &mags, &weights).ok_or_else(|| {
        AppError::new(4, format!("Polynomial fit of band {} is singular.", band.name))
    })?;

    let mut fit = BandFit {
        band: band.name.clone(),
        rest_band: rest_band.to_string(),
        t0,
        scale,
        coeffs: sol.beta.iter().copied().collect(),
        covariance: (0..p)
            .map(|i| (0..p).map(|j| sol.covariance[(i, j)]).collect())
            .collect(),
        t_first,
        t_last,
        t_peak: t_first,
        m_peak: mags[0],
        e_m_peak: 0.0,
        chi2: sol.chi2,
        n_points: n,
    };

    let (t_peak, m_peak) = brightest_point(&fit, GRID_STEP_DAYS, MAX_GRID_POINTS);
    fit.t_peak = t_peak;
    fit.m_peak = m_peak;
    fit.e_m_peak = predict_error(&fit, t_peak);
    Ok(fit)
}

/// `Tmax` and its error from the curvature of the model at the peak.
///
/// With `m'(Tmax) = 0`, a perturbation `δm'` moves the root by
/// `δm' / m''`, so `σ_T = σ(m') / |m''|`.
fn time_of_maximum(fit: &BandFit) -> Result<(f64, f64), AppError> {
    let tmax = fit.t_peak;
    if tmax <= fit.t_first + GRID_STEP_DAYS || tmax >= fit.t_last - GRID_STEP_DAYS {
        return Err(AppError::new(
            4,
            format!(
                "Maximum of band {} is not bracketed by data ({:.2} in [{:.2}, {:.2}]).",
                fit.band, tmax, fit.t_first, fit.t_last
            ),
        ));
    }

    let u = scaled_time(fit, tmax);
    let d1 = derivative_coeffs(&fit.coeffs);
    let curvature = eval_poly(&derivative_coeffs(&d1), u);
    if !(curvature.is_finite() && curvature > 0.0) {
        return Err(AppError::new(
            4,
            format!("Band {} has no magnitude minimum near {:.2}.", fit.band, tmax),
        ));
    }

    let mut row = vec![0.0; fit.coeffs.len()];
    fill_poly_derivative_row(u, fit.coeffs.len() - 1, &mut row);
    let var_slope = quadratic_form(&row, &covariance_matrix(fit)).max(0.0);
    Ok((tmax, fit.scale * var_slope.sqrt() / curvature))
}

/// `Δm15` in the reference band and its error.
fn decline_rate(fit: &BandFit, tmax: f64, e_tmax: f64, z: f64) -> (f64, f64) {
    let t15 = tmax + 15.0 * (1.0 + z);
    if t15 > fit.t_last {
        warn!(
            "band {}: Tmax+15 ({t15:.2}) is past the last point ({:.2}); Δm15 is extrapolated",
            fit.band, fit.t_last
        );
    }
    let dm15 = predict(fit, t15) - predict(fit, tmax);

    let p = fit.coeffs.len();
    let degree = p - 1;
    let mut r15 = vec![0.0; p];
    let mut rmax = vec![0.0; p];
    fill_poly_row(scaled_time(fit, t15), degree, &mut r15);
    fill_poly_row(scaled_time(fit, tmax), degree, &mut rmax);
    let diff: Vec<f64> = r15.iter().zip(&rmax).map(|(a, b)| a - b).collect();
    let var_coeffs = quadratic_form(&diff, &covariance_matrix(fit)).max(0.0);

    // The slope at Tmax is zero, so only m(Tmax + 15) moves with Tmax.
    let slope15 = eval_poly(&derivative_coeffs(&fit.coeffs), scaled_time(fit, t15)) / fit.scale;
    let var = var_coeffs + (slope15 * e_tmax).powi(2);
    (dm15, var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Observation;
    use std::collections::BTreeMap;

    fn band(name: &str, peak_mag: f64, t_peak: f64, curv: f64) -> BandData {
        let points = (0..31)
            .map(|i| {
                let t = 80.0 + 2.0 * i as f64;
                Observation {
                    time: t,
                    mag: peak_mag + curv * (t - t_peak).powi(2),
                    err: 0.05,
                }
            })
            .collect();
        BandData::new(name, points)
    }

    fn light_curve() -> LightCurve {
        LightCurve {
            name: "sn2005el".to_string(),
            z: 0.01,
            ra: 0.0,
            dec: 0.0,
            bands: vec![band("V", 14.8, 102.0, 0.008), band("B", 15.0, 100.0, 0.01)],
            rest_bands: BTreeMap::new(),
        }
    }

    fn no_kcorr() -> PeakPolynomialFitter {
        PeakPolynomialFitter::new(FitOptions {
            kcorr: KcorrOptions {
                apply: false,
                mangle: false,
            },
            ..FitOptions::default()
        })
    }

    #[test]
    fn recovers_peak_and_decline_of_reference_band() {
        let lc = light_curve();
        let res = no_kcorr().fit(&lc, &lc.band_names()).unwrap();

        assert_eq!(res.reference_band, "B");
        assert!((res.tmax - 100.0).abs() < 0.011, "tmax={}", res.tmax);
        let expected_dm15 = 0.01 * (15.0_f64 * 1.01).powi(2);
        assert!((res.dm15 - expected_dm15).abs() < 1e-2, "dm15={}", res.dm15);
        assert!(res.e_tmax > 0.0 && res.e_tmax.is_finite());
        assert!(res.e_dm15 > 0.0 && res.e_dm15.is_finite());

        // No k-correction: DM is the peak magnitude minus M_abs.
        assert!((res.dm - (15.0 + 19.3)).abs() < 1e-5);
        assert_eq!(res.kcorrs.len(), 2);
        assert!(res.kcorrs.iter().all(|k| k.values.iter().all(|v| *v == 0.0)));
        assert!((res.mu_model - distance_modulus(0.01, &CosmoParams::default()).unwrap()).abs() < 1e-12);
    }

    #[test]
    fn falls_back_to_first_band_without_b() {
        let lc = light_curve();
        let res = no_kcorr().fit(&lc, &["V".to_string()]).unwrap();
        assert_eq!(res.reference_band, "V");
        assert!((res.tmax - 102.0).abs() < 0.011);
    }

    #[test]
    fn kcorrections_shift_distance_modulus() {
        let lc = light_curve();
        let res = PeakPolynomialFitter::default().fit(&lc, &lc.band_names()).unwrap();
        let k = res.kcorr("B").unwrap();
        assert_eq!(k.times.len(), 31);
        assert!(k.values.iter().all(|v| v.is_finite() && *v != 0.0));
        assert!((res.dm - (15.0 + 19.3)).abs() > 1e-4);
    }

    #[test]
    fn sparse_bands_are_skipped() {
        let mut lc = light_curve();
        lc.bands.push(BandData::new(
            "H",
            vec![Observation { time: 90.0, mag: 15.0, err: 0.1 }],
        ));
        let res = no_kcorr().fit(&lc, &lc.band_names()).unwrap();
        assert_eq!(res.fitted_bands(), vec!["V", "B"]);

        let err = no_kcorr().fit(&lc, &["H".to_string()]).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn unbracketed_maximum_is_an_error() {
        let mut lc = light_curve();
        lc.bands = vec![band("B", 15.0, 70.0, 0.01)];
        assert!(no_kcorr().fit(&lc, &["B".to_string()]).is_err());
    }

    #[test]
    fn rejects_non_positive_redshift() {
        let mut lc = light_curve();
        lc.z = 0.0;
        assert_eq!(no_kcorr().fit(&lc, &["B".to_string()]).unwrap_err().exit_code(), 2);
    }
}
