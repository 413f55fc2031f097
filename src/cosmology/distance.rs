//! Luminosity distance and distance modulus.
//!
//! ```text
//! E(z)  = sqrt(Ωm (1+z)^3 + (1-Ωm) (1+z)^{3(1+w)})
//! d_L   = c (1+z) / H0 ∫_0^z dz' / E(z')          [Mpc]
//! μ(z)  = 5 log10(d_L) + 25
//! ```

use serde::{Deserialize, Serialize};

use super::SPEED_OF_LIGHT_KMS;
use crate::error::AppError;
use crate::math::{QuadOptions, integrate};

/// Flat wCDM parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CosmoParams {
    /// Matter density Ωm.
    pub omega_m: f64,
    /// Dark-energy equation of state `w` (−1 for a cosmological constant).
    pub w: f64,
    /// Hubble constant in km/s/Mpc.
    pub h0: f64,
}

impl Default for CosmoParams {
    fn default() -> Self {
        Self {
            omega_m: 0.27,
            w: -1.0,
            h0: 72.0,
        }
    }
}

impl CosmoParams {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.omega_m.is_finite() && self.w.is_finite() && self.h0.is_finite()) {
            return Err(AppError::new(2, "Cosmological parameters must be finite."));
        }
        if self.h0 <= 0.0 {
            return Err(AppError::new(2, format!("H0 must be > 0 (got {}).", self.h0)));
        }
        Ok(())
    }
}

/// Inverse of the dimensionless Hubble parameter, `1/E(z)`.
pub fn inv_e_hubble(z: f64, omega_m: f64, w: f64) -> f64 {
    let zp1 = 1.0 + z;
    let e2 = omega_m * zp1.powi(3) + (1.0 - omega_m) * zp1.powf(3.0 * (1.0 + w));
    1.0 / e2.sqrt()
}

/// Luminosity distance in Mpc.
pub fn luminosity_distance(z: f64, params: &CosmoParams) -> Result<f64, AppError> {
    params.validate()?;
    if !z.is_finite() || z < 0.0 {
        return Err(AppError::new(2, format!("Redshift must be finite and >= 0 (got {z}).")));
    }
    let q = integrate(
        |zp| inv_e_hubble(zp, params.omega_m, params.w),
        0.0,
        z,
        &QuadOptions::default(),
    )?;
    Ok(SPEED_OF_LIGHT_KMS * (1.0 + z) * q.value / params.h0)
}

/// Distance modulus `5 log10(d_L / Mpc) + 25`.
pub fn distance_modulus(z: f64, params: &CosmoParams) -> Result<f64, AppError> {
    if z <= 0.0 {
        return Err(AppError::new(
            2,
            format!("Distance modulus is undefined for z <= 0 (got {z})."),
        ));
    }
    let dl = luminosity_distance(z, params)?;
    let mu = 5.0 * dl.log10() + 25.0;
    if !mu.is_finite() {
        return Err(AppError::new(4, format!("Non-finite distance modulus at z={z}.")));
    }
    Ok(mu)
}

/// Distance modulus for each redshift.
pub fn distance_modulus_vec(zs: &[f64], params: &CosmoParams) -> Result<Vec<f64>, AppError> {
    zs.iter().map(|&z| distance_modulus(z, params)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn einstein_de_sitter_matches_closed_form() {
        // Ωm = 1: D_C = 2c/H0 (1 - 1/sqrt(1+z)).
        let params = CosmoParams { omega_m: 1.0, w: -1.0, h0: 70.0 };
        for &z in &[0.01, 0.1, 0.5, 1.0, 2.0] {
            let dc = 2.0 * SPEED_OF_LIGHT_KMS / 70.0 * (1.0 - 1.0 / (1.0_f64 + z).sqrt());
            let dl = luminosity_distance(z, &params).unwrap();
            assert!((dl - (1.0 + z) * dc).abs() / dl < 1e-9, "z={z}: {dl}");
        }
    }

    #[test]
    fn distance_modulus_increases_with_redshift() {
        let params = CosmoParams::default();
        let zs: Vec<f64> = (1..=60).map(|i| i as f64 * 0.025).collect();
        let mus = distance_modulus_vec(&zs, &params).unwrap();
        for pair in mus.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn low_redshift_follows_hubble_law() {
        // d_L ≈ cz/H0 for z << 1.
        let params = CosmoParams::default();
        let z = 1e-4;
        let mu = distance_modulus(z, &params).unwrap();
        let expected = 5.0 * (SPEED_OF_LIGHT_KMS * z / params.h0).log10() + 25.0;
        assert!((mu - expected).abs() < 1e-3);
    }

    #[test]
    fn rejects_non_positive_redshift_and_h0() {
        assert!(distance_modulus(0.0, &CosmoParams::default()).is_err());
        let bad = CosmoParams { h0: 0.0, ..CosmoParams::default() };
        assert!(distance_modulus(0.1, &bad).is_err());
    }
}
