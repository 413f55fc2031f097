//! Intrinsic scatter of Hubble residuals by maximum likelihood.
//!
//! With per-supernova variance `V_i = σ_mag,i² + σ_int² + σ_vpec,i²`:
//!
//! ```text
//! -2 ln L(σ_int) = Σ ln V_i + r_i² / V_i
//! F(σ_int)       = Σ r_i² / V_i³ - 1 / (2 V_i²)
//! σ(σ_int)       = sqrt( (1/F) / (4 σ_int²) )
//! ```
//!
//! (Blondin, Mandel & Kirshner 2011, appendix B.)

use log::debug;

use crate::domain::HubbleResiduals;
use crate::error::AppError;
use crate::math::{SimplexOptions, minimize};

/// Starting point for the simplex search.
pub const DEFAULT_INITIAL_GUESS: f64 = 0.15;

/// Best estimate and its uncertainty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterEstimate {
    pub value: f64,
    pub error: f64,
}

/// `-2 ln L` as a function of the intrinsic scatter.
pub fn neg2_ln_likelihood(intrinsic_scatter: f64, data: &HubbleResiduals) -> f64 {
    let s2 = intrinsic_scatter * intrinsic_scatter;
    data.iter()
        .map(|(r, vpec, mag)| {
            let v = mag * mag + s2 + vpec * vpec;
            v.ln() + r * r / v
        })
        .sum()
}

/// Fisher information for the variance parameter at `intrinsic_scatter`.
pub fn fisher_information(intrinsic_scatter: f64, data: &HubbleResiduals) -> f64 {
    let s2 = intrinsic_scatter * intrinsic_scatter;
    data.iter()
        .map(|(r, vpec, mag)| {
            let v = mag * mag + s2 + vpec * vpec;
            r * r / v.powi(3) - 1.0 / (2.0 * v * v)
        })
        .sum()
}

/// Minimize `-2 ln L` with a Nelder–Mead simplex.
///
/// The likelihood depends on `σ_int²` only, so the sign of the minimizer is
/// arbitrary; the absolute value is returned.
pub fn estimate_intrinsic_scatter(data: &HubbleResiduals, initial_guess: f64) -> Result<f64, AppError> {
    let min = minimize(
        |p| neg2_ln_likelihood(p[0], data),
        &[initial_guess],
        &SimplexOptions::default(),
    )?;
    let value = min.params[0].abs();
    debug!(
        "intrinsic scatter: {value:.5} after {} iterations (-2lnL={:.4})",
        min.iterations, min.cost
    );
    Ok(value)
}

/// Uncertainty on the scatter estimate from the inverse Fisher information.
pub fn intrinsic_scatter_error(intrinsic_scatter: f64, data: &HubbleResiduals) -> Result<f64, AppError> {
    if intrinsic_scatter == 0.0 {
        return Err(AppError::new(
            4,
            "Intrinsic scatter uncertainty is undefined for a scatter of exactly 0.",
        ));
    }
    let fisher = fisher_information(intrinsic_scatter, data);
    if !(fisher.is_finite() && fisher > 0.0) {
        return Err(AppError::new(
            4,
            format!("Fisher information is not positive ({fisher:.4e}); no uncertainty available."),
        ));
    }
    let variance = 1.0 / fisher;
    Ok((variance / (4.0 * intrinsic_scatter * intrinsic_scatter)).sqrt())
}

/// Estimate plus uncertainty in one call.
pub fn intrinsic_scatter(data: &HubbleResiduals, initial_guess: f64) -> Result<ScatterEstimate, AppError> {
    let value = estimate_intrinsic_scatter(data, initial_guess)?;
    let error = intrinsic_scatter_error(value, data)?;
    Ok(ScatterEstimate { value, error })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, Normal};

    fn synthetic(n: usize, sigma_int: f64, seed: u64) -> HubbleResiduals {
        let mut rng = StdRng::seed_from_u64(seed);
        let sigma_vpec = vec![0.05; n];
        let sigma_mag: Vec<f64> = (0..n).map(|i| 0.08 + 0.04 * (i % 3) as f64).collect();
        let residuals = sigma_mag
            .iter()
            .zip(&sigma_vpec)
            .map(|(m, v)| {
                let total = (sigma_int * sigma_int + m * m + v * v).sqrt();
                Normal::new(0.0, total).unwrap().sample(&mut rng)
            })
            .collect();
        HubbleResiduals::new(residuals, sigma_vpec, sigma_mag).unwrap()
    }

    #[test]
    fn recovers_injected_scatter() {
        let data = synthetic(1500, 0.15, 11);
        let est = intrinsic_scatter(&data, DEFAULT_INITIAL_GUESS).unwrap();
        assert!(est.error > 0.0 && est.error < 0.05);
        assert!(
            (est.value - 0.15).abs() < 4.0 * est.error,
            "estimate {} ± {}",
            est.value,
            est.error
        );
    }

    #[test]
    fn minimum_has_zero_slope() {
        let data = synthetic(300, 0.2, 5);
        let s = estimate_intrinsic_scatter(&data, 0.1).unwrap();
        let h = 1e-4;
        let slope = (neg2_ln_likelihood(s + h, &data) - neg2_ln_likelihood(s - h, &data)) / (2.0 * h);
        assert!(slope.abs() < 1e-2, "slope {slope}");
    }

    #[test]
    fn zero_scatter_has_no_uncertainty() {
        let data = HubbleResiduals::new(vec![0.1, -0.1], vec![0.05, 0.05], vec![0.1, 0.1]).unwrap();
        assert!(intrinsic_scatter_error(0.0, &data).is_err());
    }
}
