//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON
//! - reloaded later for plotting or comparisons

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cosmology::CosmoParams;
use crate::error::{AppError, ensure_same_len};

/// One photometric point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Observation time (MJD or phase, days).
    pub time: f64,
    pub mag: f64,
    pub err: f64,
}

/// Time-ordered photometry in one observer-frame band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandData {
    pub name: String,
    pub points: Vec<Observation>,
}

impl BandData {
    pub fn new(name: impl Into<String>, mut points: Vec<Observation>) -> Self {
        points.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(std::cmp::Ordering::Equal));
        Self {
            name: name.into(),
            points,
        }
    }

    pub fn times(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.time).collect()
    }

    pub fn mags(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.mag).collect()
    }

    pub fn errs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.err).collect()
    }
}

/// A supernova light curve: metadata plus per-band photometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightCurve {
    pub name: String,
    /// Heliocentric redshift.
    pub z: f64,
    pub ra: f64,
    pub dec: f64,
    pub bands: Vec<BandData>,
    /// Observer band -> rest-frame band. Bands not listed map to themselves.
    #[serde(default)]
    pub rest_bands: BTreeMap<String, String>,
}

impl LightCurve {
    pub fn band(&self, name: &str) -> Option<&BandData> {
        self.bands.iter().find(|b| b.name == name)
    }

    pub fn band_names(&self) -> Vec<String> {
        self.bands.iter().map(|b| b.name.clone()).collect()
    }

    pub fn rest_band<'a>(&'a self, observed: &'a str) -> &'a str {
        self.rest_bands
            .get(observed)
            .map(String::as_str)
            .unwrap_or(observed)
    }

    /// Fit `observed` photometry with the `rest` band as reference.
    pub fn set_rest_band(&mut self, observed: &str, rest: &str) -> Result<(), AppError> {
        if self.band(observed).is_none() {
            return Err(AppError::new(
                3,
                format!("Cannot map band '{observed}' to '{rest}': no such band in {}.", self.name),
            ));
        }
        self.rest_bands.insert(observed.to_string(), rest.to_string());
        Ok(())
    }

    /// Bands to fit, in light-curve order.
    ///
    /// An empty request selects every band. A non-empty request that matches
    /// nothing is an error.
    pub fn select_bands(&self, requested: &[String]) -> Result<Vec<String>, AppError> {
        if requested.is_empty() {
            return Ok(self.band_names());
        }
        let selected: Vec<String> = self
            .bands
            .iter()
            .filter(|b| requested.iter().any(|r| r == &b.name))
            .map(|b| b.name.clone())
            .collect();
        if selected.is_empty() {
            return Err(AppError::new(
                3,
                format!(
                    "None of the requested bands {requested:?} exist in {} (available: {:?}).",
                    self.name,
                    self.band_names()
                ),
            ));
        }
        Ok(selected)
    }
}

/// Parallel per-supernova Hubble residual arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct HubbleResiduals {
    residuals: Vec<f64>,
    sigma_vpec: Vec<f64>,
    sigma_mag: Vec<f64>,
}

impl HubbleResiduals {
    pub fn new(residuals: Vec<f64>, sigma_vpec: Vec<f64>, sigma_mag: Vec<f64>) -> Result<Self, AppError> {
        if residuals.is_empty() {
            return Err(AppError::new(3, "No Hubble residuals."));
        }
        ensure_same_len("residuals/sigma_vpec", residuals.len(), sigma_vpec.len())?;
        ensure_same_len("residuals/sigma_mag", residuals.len(), sigma_mag.len())?;
        Ok(Self {
            residuals,
            sigma_vpec,
            sigma_mag,
        })
    }

    pub fn len(&self) -> usize {
        self.residuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residuals.is_empty()
    }

    /// Iterate `(residual, σ_vpec, σ_mag)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.residuals
            .iter()
            .zip(&self.sigma_vpec)
            .zip(&self.sigma_mag)
            .map(|((&r, &v), &m)| (r, v, m))
    }

    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }
}

/// Polynomial model of one band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandFit {
    pub band: String,
    pub rest_band: String,
    /// Time origin of the polynomial variable `u = (t - t0) / scale`.
    pub t0: f64,
    pub scale: f64,
    pub coeffs: Vec<f64>,
    /// Coefficient covariance (row-major).
    pub covariance: Vec<Vec<f64>>,
    /// Time range covered by the data.
    pub t_first: f64,
    pub t_last: f64,
    /// Time and magnitude of the brightest model point.
    pub t_peak: f64,
    pub m_peak: f64,
    pub e_m_peak: f64,
    pub chi2: f64,
    pub n_points: usize,
}

/// K-corrections of one band at its observed epochs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KcorrCurve {
    pub band: String,
    pub rest_band: String,
    pub times: Vec<f64>,
    pub values: Vec<f64>,
}

/// Complete light-curve fit output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LcFitResult {
    pub sn: String,
    pub z: f64,
    pub model: String,
    pub reference_band: String,
    pub tmax: f64,
    pub e_tmax: f64,
    pub dm15: f64,
    pub e_dm15: f64,
    /// Distance modulus from the k-corrected peak of the reference band.
    pub dm: f64,
    pub e_dm: f64,
    /// Model distance modulus μ(z).
    pub mu_model: f64,
    pub absolute_mag: f64,
    pub cosmology: CosmoParams,
    pub bands: Vec<BandFit>,
    pub kcorrs: Vec<KcorrCurve>,
}

impl LcFitResult {
    pub fn band(&self, name: &str) -> Option<&BandFit> {
        self.bands.iter().find(|b| b.band == name)
    }

    pub fn kcorr(&self, name: &str) -> Option<&KcorrCurve> {
        self.kcorrs.iter().find(|k| k.band == name)
    }

    pub fn fitted_bands(&self) -> Vec<String> {
        self.bands.iter().map(|b| b.band.clone()).collect()
    }

    /// Hubble residual `DM - μ(z)`.
    pub fn hubble_residual(&self) -> f64 {
        self.dm - self.mu_model
    }
}

/// Per-epoch k-correction mean and standard deviation over simulations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KcorrStats {
    pub times: Vec<f64>,
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

/// band -> simulation index -> values (one per observed epoch).
pub type SimulatedSeries = BTreeMap<String, BTreeMap<usize, Vec<f64>>>;

#[cfg(test)]
mod tests {
    use super::*;

    fn lc() -> LightCurve {
        let pts = vec![Observation { time: 1.0, mag: 15.0, err: 0.1 }];
        LightCurve {
            name: "sn2011fe".to_string(),
            z: 0.001,
            ra: 0.0,
            dec: 0.0,
            bands: vec![BandData::new("B", pts.clone()), BandData::new("V", pts)],
            rest_bands: BTreeMap::new(),
        }
    }

    #[test]
    fn select_bands_keeps_light_curve_order() {
        let lc = lc();
        assert_eq!(lc.select_bands(&[]).unwrap(), vec!["B", "V"]);
        let req = vec!["V".to_string(), "B".to_string(), "H".to_string()];
        assert_eq!(lc.select_bands(&req).unwrap(), vec!["B", "V"]);
        assert!(lc.select_bands(&["H".to_string()]).is_err());
    }

    #[test]
    fn rest_band_defaults_to_observed() {
        let mut lc = lc();
        assert_eq!(lc.rest_band("B"), "B");
        lc.set_rest_band("V", "Y").unwrap();
        assert_eq!(lc.rest_band("V"), "Y");
        assert!(lc.set_rest_band("J", "J").is_err());
    }

    #[test]
    fn band_data_is_time_sorted() {
        let b = BandData::new(
            "B",
            vec![
                Observation { time: 3.0, mag: 1.0, err: 0.1 },
                Observation { time: 1.0, mag: 2.0, err: 0.1 },
            ],
        );
        assert_eq!(b.times(), vec![1.0, 3.0]);
    }

    #[test]
    fn hubble_residuals_validate_lengths() {
        assert!(HubbleResiduals::new(vec![0.1, 0.2], vec![0.05], vec![0.1, 0.1]).is_err());
        assert!(HubbleResiduals::new(vec![], vec![], vec![]).is_err());
        let h = HubbleResiduals::new(vec![0.1], vec![0.05], vec![0.2]).unwrap();
        assert_eq!(h.iter().next(), Some((0.1, 0.05, 0.2)));
    }
}
