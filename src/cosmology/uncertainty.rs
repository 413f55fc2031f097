//! Distance-modulus uncertainty from peculiar velocity and redshift errors.

use super::SPEED_OF_LIGHT_KMS;

/// Default peculiar-velocity dispersion in km/s.
pub const DEFAULT_SIGMA_VPEC: f64 = 150.0;

/// `σ_μ = 5 / (z ln 10) · sqrt((σ_v / c)^2 + σ_z^2)`.
pub fn sigma_mu_vpec(z_cmb: f64, err_z_cmb: f64, sigma_vpec: f64) -> f64 {
    5.0 / (z_cmb * std::f64::consts::LN_10)
        * ((sigma_vpec / SPEED_OF_LIGHT_KMS).powi(2) + err_z_cmb.powi(2)).sqrt()
}
