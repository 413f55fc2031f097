//! Monte Carlo k-correction uncertainties.
//!
//! Each simulation redraws every magnitude as `m + σ·N(0,1)`, refits the
//! light curve and records the simulated magnitudes and the k-corrections.
//! Simulations run in parallel; simulation `i` is seeded with `seed + i`, so
//! results do not depend on the thread count. Any failed refit aborts the run.

use std::collections::BTreeMap;

use log::{debug, info};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use rayon::prelude::*;

use super::fitter::LightCurveFitter;
use crate::domain::{BandData, KcorrStats, LightCurve, Observation, SimulatedSeries};
use crate::error::AppError;
use crate::stats::{mean, population_std};

pub const DEFAULT_NUM_SIM: usize = 100;
pub const DEFAULT_MC_SEED: u64 = 20_240_601;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonteCarloConfig {
    pub num_sim: usize,
    pub seed: u64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            num_sim: DEFAULT_NUM_SIM,
            seed: DEFAULT_MC_SEED,
        }
    }
}

/// Outputs of a Monte Carlo run.
#[derive(Debug, Clone, Default)]
pub struct MonteCarloOutput {
    pub sim_mags: SimulatedSeries,
    pub sim_kcorrs: SimulatedSeries,
    pub kcorr_stats: BTreeMap<String, KcorrStats>,
}

struct Simulation {
    mags: Vec<(String, Vec<f64>)>,
    kcorrs: Vec<(String, Vec<f64>, Vec<f64>)>,
}

/// Redraw every magnitude of `lc` from its Gaussian error.
pub fn resimulate(lc: &LightCurve, rng: &mut StdRng) -> Result<LightCurve, AppError> {
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Failed to create normal distribution: {e}")))?;
    let bands = lc
        .bands
        .iter()
        .map(|b| {
            let points = b
                .points
                .iter()
                .map(|o| Observation {
                    time: o.time,
                    mag: o.mag + o.err * normal.sample(rng),
                    err: o.err,
                })
                .collect();
            BandData::new(b.name.clone(), points)
        })
        .collect();
    Ok(LightCurve {
        bands,
        ..lc.clone()
    })
}

/// Run `cfg.num_sim` resimulate-and-refit cycles.
pub fn run_monte_carlo(
    fitter: &dyn LightCurveFitter,
    lc: &LightCurve,
    bands: &[String],
    cfg: MonteCarloConfig,
) -> Result<MonteCarloOutput, AppError> {
    if cfg.num_sim == 0 {
        return Err(AppError::new(2, "Monte Carlo needs at least one simulation."));
    }
    info!("{}: running {} Monte Carlo simulations", lc.name, cfg.num_sim);

    let sims: Vec<Simulation> = (0..cfg.num_sim)
        .into_par_iter()
        .map(|i| {
            let mut rng = StdRng::seed_from_u64(cfg.seed.wrapping_add(i as u64));
            let sim = resimulate(lc, &mut rng)?;
            let fit = fitter.fit(&sim, bands).map_err(|e| {
                AppError::new(
                    e.exit_code(),
                    format!("Monte Carlo simulation {i} failed: {}", e.message()),
                )
            })?;
            let mags = fit
                .bands
                .iter()
                .filter_map(|b| sim.band(&b.band).map(|d| (b.band.clone(), d.mags())))
                .collect();
            let kcorrs = fit
                .kcorrs
                .into_iter()
                .map(|k| (k.band, k.times, k.values))
                .collect();
            Ok(Simulation { mags, kcorrs })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    let mut out = MonteCarloOutput::default();
    let mut times: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (i, sim) in sims.into_iter().enumerate() {
        for (band, mags) in sim.mags {
            out.sim_mags.entry(band).or_default().insert(i, mags);
        }
        for (band, t, values) in sim.kcorrs {
            times.entry(band.clone()).or_insert(t);
            out.sim_kcorrs.entry(band).or_default().insert(i, values);
        }
    }

    for (band, per_sim) in &out.sim_kcorrs {
        let Some(t) = times.get(band) else { continue };
        let stats = kcorr_statistics(t, per_sim);
        debug!(
            "{} {band}: mean k-correction std {:.4}",
            lc.name,
            mean(&stats.std)
        );
        out.kcorr_stats.insert(band.clone(), stats);
    }
    Ok(out)
}

/// Per-epoch mean and population standard deviation across simulations.
pub fn kcorr_statistics(times: &[f64], per_sim: &BTreeMap<usize, Vec<f64>>) -> KcorrStats {
    let mut mean_k = Vec::with_capacity(times.len());
    let mut std_k = Vec::with_capacity(times.len());
    for j in 0..times.len() {
        let column: Vec<f64> = per_sim.values().filter_map(|v| v.get(j).copied()).collect();
        mean_k.push(mean(&column));
        std_k.push(population_std(&column));
    }
    KcorrStats {
        times: times.to_vec(),
        mean: mean_k,
        std: std_k,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::PeakPolynomialFitter;

    fn light_curve() -> LightCurve {
        let band = |name: &str, peak: f64, curv: f64| {
            let points = (0..21)
                .map(|i| {
                    let t = 50.0 + 2.0 * i as f64;
                    Observation {
                        time: t,
                        mag: peak + curv * (t - 68.0).powi(2),
                        err: 0.02,
                    }
                })
                .collect();
            BandData::new(name, points)
        };
        LightCurve {
            name: "sn2006D".to_string(),
            z: 0.02,
            ra: 0.0,
            dec: 0.0,
            bands: vec![band("B", 15.0, 0.01), band("V", 14.9, 0.007)],
            rest_bands: BTreeMap::new(),
        }
    }

    #[test]
    fn resimulation_keeps_times_and_errors() {
        let lc = light_curve();
        let mut rng = StdRng::seed_from_u64(1);
        let sim = resimulate(&lc, &mut rng).unwrap();
        assert_eq!(sim.bands[0].times(), lc.bands[0].times());
        assert_eq!(sim.bands[0].errs(), lc.bands[0].errs());
        assert_ne!(sim.bands[0].mags(), lc.bands[0].mags());
    }

    #[test]
    fn same_seed_same_output() {
        let lc = light_curve();
        let fitter = PeakPolynomialFitter::default();
        let bands = lc.band_names();
        let cfg = MonteCarloConfig { num_sim: 8, seed: 7 };

        let a = run_monte_carlo(&fitter, &lc, &bands, cfg).unwrap();
        let b = run_monte_carlo(&fitter, &lc, &bands, cfg).unwrap();
        assert_eq!(a.sim_kcorrs, b.sim_kcorrs);
        assert_eq!(a.sim_mags["B"].len(), 8);

        let stats = &a.kcorr_stats["B"];
        assert_eq!(stats.times.len(), 21);
        assert!(stats.std.iter().all(|s| s.is_finite() && *s >= 0.0));
    }

    #[test]
    fn statistics_per_epoch() {
        let mut per_sim = BTreeMap::new();
        per_sim.insert(0, vec![1.0, 0.0]);
        per_sim.insert(1, vec![3.0, 0.0]);
        let s = kcorr_statistics(&[10.0, 11.0], &per_sim);
        assert_eq!(s.mean, vec![2.0, 0.0]);
        assert_eq!(s.std, vec![1.0, 0.0]);
    }

    #[test]
    fn zero_simulations_rejected() {
        let lc = light_curve();
        let cfg = MonteCarloConfig { num_sim: 0, seed: 1 };
        assert!(run_monte_carlo(&PeakPolynomialFitter::default(), &lc, &lc.band_names(), cfg).is_err());
    }
}
