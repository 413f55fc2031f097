//! Power-law k-corrections.
//!
//! For an SED `f_ν ∝ ν^α` observed in band X at redshift z and referred to
//! rest-frame band R:
//!
//! ```text
//! K_XR = -2.5 log10(1+z) - 2.5 α log10((1+z) ν_X / ν_R)
//! ```
//!
//! `α` is measured from the model colour between a band and its nearest
//! fitted neighbour in wavelength ("mangling" the flat SED to the observed
//! colours). Without mangling `α = 0`, which leaves only the bandwidth term.

use log::warn;

use super::filters::lookup_filter;
use crate::domain::{BandData, BandFit, KcorrCurve};
use crate::models::predict;

/// How k-corrections are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KcorrOptions {
    /// When false all k-corrections are zero.
    pub apply: bool,
    /// Fit the spectral index to the model colours.
    pub mangle: bool,
}

impl Default for KcorrOptions {
    fn default() -> Self {
        Self {
            apply: true,
            mangle: true,
        }
    }
}

/// K-correction of a power-law SED.
pub fn power_law_kcorr(z: f64, alpha: f64, lambda_obs: f64, lambda_rest: f64) -> f64 {
    // ν_X / ν_R = λ_R / λ_X
    -2.5 * (1.0 + z).log10() - 2.5 * alpha * ((1.0 + z) * lambda_rest / lambda_obs).log10()
}

/// Spectral index `α` from the colour `m1 - m2` of two bands.
pub fn spectral_index(m1: f64, m2: f64, lambda1: f64, lambda2: f64) -> f64 {
    // m1 - m2 = -2.5 α log10(ν1/ν2) = -2.5 α log10(λ2/λ1)
    -(m1 - m2) / (2.5 * (lambda2 / lambda1).log10())
}

/// K-correction curve of every fitted band at its observed epochs.
///
/// `data` must hold the photometry for each entry of `fits`.
pub fn compute_kcorrections(
    fits: &[BandFit],
    data: &[&BandData],
    z: f64,
    opts: KcorrOptions,
) -> Vec<KcorrCurve> {
    fits.iter()
        .zip(data)
        .map(|(fit, band)| {
            let times = band.times();
            let values = times
                .iter()
                .map(|&t| kcorr_at(fits, fit, t, z, opts))
                .collect();
            KcorrCurve {
                band: fit.band.clone(),
                rest_band: fit.rest_band.clone(),
                times,
                values,
            }
        })
        .collect()
}

/// K-correction of band `fit` at time `t`.
pub fn kcorr_at(fits: &[BandFit], fit: &BandFit, t: f64, z: f64, opts: KcorrOptions) -> f64 {
    if !opts.apply {
        return 0.0;
    }
    let (Some(obs), Some(rest)) = (lookup_filter(&fit.band), lookup_filter(&fit.rest_band)) else {
        // Unknown passbands: only the (1+z) bandwidth term is defined.
        return -2.5 * (1.0 + z).log10();
    };

    let alpha = if opts.mangle {
        match nearest_neighbour(fits, fit, obs.lambda_eff) {
            Some((other, lambda_other)) => {
                let m_self = predict(fit, clamp_to_data(fit, t));
                let m_other = predict(other, clamp_to_data(other, t));
                spectral_index(m_self, m_other, obs.lambda_eff, lambda_other)
            }
            None => 0.0,
        }
    } else {
        0.0
    };

    let k = power_law_kcorr(z, alpha, obs.lambda_eff, rest.lambda_eff);
    if k.is_finite() {
        k
    } else {
        warn!("non-finite k-correction for {} at t={t:.2}; using flat SED", fit.band);
        -2.5 * (1.0 + z).log10()
    }
}

fn nearest_neighbour<'a>(fits: &'a [BandFit], fit: &BandFit, lambda: f64) -> Option<(&'a BandFit, f64)> {
    fits.iter()
        .filter(|other| other.band != fit.band)
        .filter_map(|other| {
            let info = lookup_filter(&other.band)?;
            if (info.lambda_eff - lambda).abs() < 1.0 {
                // Same effective wavelength gives no colour leverage.
                return None;
            }
            Some((other, info.lambda_eff))
        })
        .min_by(|a, b| {
            (a.1 - lambda)
                .abs()
                .partial_cmp(&(b.1 - lambda).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

fn clamp_to_data(fit: &BandFit, t: f64) -> f64 {
    t.clamp(fit.t_first, fit.t_last)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_band(name: &str, mag: f64) -> BandFit {
        BandFit {
            band: name.to_string(),
            rest_band: name.to_string(),
            t0: 0.0,
            scale: 1.0,
            coeffs: vec![mag],
            covariance: vec![vec![0.0]],
            t_first: -10.0,
            t_last: 30.0,
            t_peak: 0.0,
            m_peak: mag,
            e_m_peak: 0.0,
            chi2: 0.0,
            n_points: 5,
        }
    }

    #[test]
    fn flat_sed_gives_bandwidth_term_only() {
        let z = 0.05;
        let k = power_law_kcorr(z, 0.0, 4380.0, 4380.0);
        assert!((k + 2.5 * 1.05_f64.log10()).abs() < 1e-12);
    }

    #[test]
    fn spectral_index_recovers_power_law() {
        // f_ν ∝ ν^-2: m = 5 log10(ν) + c = -5 log10(λ) + c'
        let m = |lambda: f64| -5.0 * lambda.log10();
        let alpha = spectral_index(m(4380.0), m(5450.0), 4380.0, 5450.0);
        assert!((alpha + 2.0).abs() < 1e-12, "alpha={alpha}");
    }

    #[test]
    fn equal_colours_mean_flat_sed() {
        let fits = vec![flat_band("B", 15.0), flat_band("V", 15.0)];
        let opts = KcorrOptions::default();
        let k = kcorr_at(&fits, &fits[0], 0.0, 0.1, opts);
        assert!((k + 2.5 * 1.1_f64.log10()).abs() < 1e-12);

        let off = KcorrOptions { apply: false, mangle: true };
        assert_eq!(kcorr_at(&fits, &fits[0], 0.0, 0.1, off), 0.0);
    }

    #[test]
    fn red_colour_changes_kcorrection() {
        let fits = vec![flat_band("B", 15.5), flat_band("V", 15.0)];
        let mangled = kcorr_at(&fits, &fits[0], 0.0, 0.1, KcorrOptions::default());
        let flat = kcorr_at(&fits, &fits[0], 0.0, 0.1, KcorrOptions { apply: true, mangle: false });
        assert!((mangled - flat).abs() > 1e-3);
    }
}
