//! The light-curve fit driver.
//!
//! One call fits one supernova end to end:
//! read light curve -> remap rest bands -> select bands -> fit -> JSON ->
//! figures -> summary (+ optional Monte Carlo k-correction uncertainties)
//!
//! Front-ends only build a [`FitRequest`] and print the returned [`FitRun`].

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::domain::{LcFitResult, LightCurve};
use crate::error::AppError;
use crate::fit::{
    FitOptions, LightCurveFitter, MonteCarloConfig, MonteCarloOutput, PeakPolynomialFitter,
    run_monte_carlo,
};
use crate::io::{SummaryMeta, read_light_curve, write_fit_json, write_json, write_summary};
use crate::plot::{
    PlotStyle, plot_filters, plot_fit, plot_kcorrs, plot_mc_kcorr_std, plot_mc_kcorrs, plot_over,
};
use crate::report::{compute_residuals, fit_annotation, format_fit_summary, format_residual_table, largest_pulls};

pub const DEFAULT_DPI: u32 = 100;
pub const DEFAULT_DPI_FILTERS: u32 = 60;
/// Points listed in the summary's residual table.
const SUMMARY_TOP_PULLS: usize = 10;

/// Everything needed to fit one light curve.
#[derive(Debug, Clone)]
pub struct FitRequest {
    pub lc_file: PathBuf,
    pub out_dir: PathBuf,
    /// Bands to fit; empty means all bands in the file.
    pub bands: Vec<String>,
    /// Observer band -> rest-frame band remappings.
    pub obs_rest_bands: Vec<(String, String)>,
    pub fit: FitOptions,
    pub monte_carlo: Option<MonteCarloConfig>,
    pub dpi: u32,
    pub dpi_filters: u32,
    /// Name written in the summary footer.
    pub author: String,
    /// Characters cut from the end of the file name to form the output stem;
    /// `None` uses the file stem.
    pub name_trim: Option<usize>,
}

impl FitRequest {
    pub fn new(lc_file: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            lc_file: lc_file.into(),
            out_dir: out_dir.into(),
            bands: Vec::new(),
            obs_rest_bands: Vec::new(),
            fit: FitOptions::default(),
            monte_carlo: None,
            dpi: DEFAULT_DPI,
            dpi_filters: DEFAULT_DPI_FILTERS,
            author: crate::io::DEFAULT_AUTHOR.to_string(),
            name_trim: None,
        }
    }
}

/// Monte Carlo outputs and where they were written.
#[derive(Debug, Clone)]
pub struct MonteCarloRun {
    pub output: MonteCarloOutput,
    pub num_sim: usize,
}

/// Outputs of a single `run_lc_fit` call.
#[derive(Debug, Clone)]
pub struct FitRun {
    /// File stem shared by all outputs.
    pub stem: String,
    pub fit: LcFitResult,
    pub written: Vec<PathBuf>,
    pub monte_carlo: Option<MonteCarloRun>,
}

/// Fit one light curve and write every artifact into `req.out_dir`.
pub fn run_lc_fit(req: &FitRequest) -> Result<FitRun, AppError> {
    let stem = output_stem(&req.lc_file, req.name_trim)?;

    // 1) Light curve.
    let mut lc = read_light_curve(&req.lc_file)?;
    debug!("{stem}: read {} with bands {:?}", lc.name, lc.band_names());

    // 2) Rest-frame remapping.
    for (obs, rest) in &req.obs_rest_bands {
        lc.set_rest_band(obs, rest)?;
        debug!("{stem}: fitting {obs} as rest-frame {rest}");
    }

    // 3) Band subset.
    let bands = lc.select_bands(&req.bands)?;
    debug!("{stem}: bands to fit {bands:?}");

    // 4) Fit.
    let fitter = PeakPolynomialFitter::new(req.fit.clone());
    let fit = fitter.fit(&lc, &bands)?;
    debug!(
        "{stem}: Tmax={:.3} dm15={:.3} DM={:.3}",
        fit.tmax, fit.dm15, fit.dm
    );

    std::fs::create_dir_all(&req.out_dir).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create output directory '{}': {e}", req.out_dir.display()),
        )
    })?;
    let out = |suffix: &str| req.out_dir.join(format!("{stem}{suffix}"));
    let mut written = Vec::new();

    // 5) Fit result.
    let path = out("_Fit.json");
    write_fit_json(&path, &fit)?;
    written.push(path);

    // 6) Figures.
    let lc_style = PlotStyle {
        dpi: req.dpi,
        ..PlotStyle::default().with_labels("time (days)", "mag")
    };
    let path = out("_PlotFit.svg");
    let msg = plot_fit(&path, &lc, &fit, None, &lc_style)?;
    debug!("{msg}");
    written.push(path);

    let path = out("_PlotFitText.svg");
    let notes = fit_annotation(&fit);
    let msg = plot_fit(&path, &lc, &fit, Some(notes.as_slice()), &lc_style)?;
    debug!("{msg}");
    written.push(path);

    let path = out("_PlotOver.svg");
    let over_style = lc_style.clone().with_title(format!("{}: offsets of 1 mag per band", fit.sn));
    let msg = plot_over(&path, &lc, &fit, &over_style)?;
    debug!("{msg}");
    written.push(path);

    let path = out("_PlotKcorrs.svg");
    let k_style = lc_style.clone().with_title("K-corrections").with_labels("time (days)", "K (mag)");
    let msg = plot_kcorrs(&path, &fit, &k_style)?;
    debug!("{msg}");
    written.push(path);

    let path = out("_Filters.svg");
    let filter_style = PlotStyle {
        dpi: req.dpi_filters,
        ..PlotStyle::default()
            .with_title(format!("{} filters (z = {:.4})", fit.sn, fit.z))
            .with_labels("wavelength (Å)", "transmission")
    };
    let msg = plot_filters(&path, &fit, &filter_style)?;
    debug!("{msg}");
    written.push(path);

    // 7) Summary.
    let path = out("_SummaryFit_.txt");
    write_summary(&path, &summary_body(&lc, &fit)?, &summary_meta(req, &bands, &fit))?;
    written.push(path);

    // 8) Monte Carlo.
    let monte_carlo = match req.monte_carlo {
        Some(cfg) => {
            let output = run_monte_carlo(&fitter, &lc, &bands, cfg)?;
            write_monte_carlo(&output, &out, &lc_style, &mut written)?;
            Some(MonteCarloRun {
                output,
                num_sim: cfg.num_sim,
            })
        }
        None => None,
    };

    info!("{stem}: fit done, {} files written to {}", written.len(), req.out_dir.display());
    Ok(FitRun {
        stem,
        fit,
        written,
        monte_carlo,
    })
}

/// Output stem for `path`: the file name minus its last `trim` characters, or
/// the file stem when no trim is given or the trim would leave nothing.
pub fn output_stem(path: &Path, trim: Option<usize>) -> Result<String, AppError> {
    let bad = || AppError::new(2, format!("Bad light-curve file name '{}'.", path.display()));
    let name = path.file_name().and_then(|s| s.to_str()).ok_or_else(bad)?;
    if let Some(n) = trim {
        let keep = name.chars().count().saturating_sub(n);
        if keep > 0 {
            return Ok(name.chars().take(keep).collect());
        }
    }
    path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(bad)
}

fn summary_body(lc: &LightCurve, fit: &LcFitResult) -> Result<String, AppError> {
    let residuals = compute_residuals(lc, fit)?;
    let mut body = format_fit_summary(fit);
    body.push_str("\nLargest residuals:\n");
    body.push_str(&format_residual_table(&largest_pulls(&residuals, SUMMARY_TOP_PULLS)));
    Ok(body)
}

fn summary_meta(req: &FitRequest, bands: &[String], fit: &LcFitResult) -> SummaryMeta {
    SummaryMeta {
        model: fit.model.clone(),
        specified_bands: if req.bands.is_empty() {
            bands.to_vec()
        } else {
            req.bands.clone()
        },
        fitted_bands: fit.fitted_bands(),
        rest_matches: req.obs_rest_bands.clone(),
        apply_kcorr: req.fit.kcorr.apply,
        mangled_kcorr: req.fit.kcorr.mangle,
        h0: req.fit.cosmology.h0,
        author: req.author.clone(),
        script_name: "snia".to_string(),
        script_version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

fn write_monte_carlo(
    output: &MonteCarloOutput,
    out: &dyn Fn(&str) -> PathBuf,
    style: &PlotStyle,
    written: &mut Vec<PathBuf>,
) -> Result<(), AppError> {
    let path = out("_MC_SimMags.json");
    write_json(&path, &output.sim_mags)?;
    written.push(path);

    let path = out("_MC_SimKcorrs.json");
    write_json(&path, &output.sim_kcorrs)?;
    written.push(path);

    let path = out("_MC_KcorrStats.json");
    write_json(&path, &output.kcorr_stats)?;
    written.push(path);

    let path = out("_MC_Kcorrs.svg");
    let mc_style = style
        .clone()
        .with_title("Monte Carlo k-corrections")
        .with_labels("time (days)", "K (mag)");
    let msg = plot_mc_kcorrs(&path, &output.sim_kcorrs, &output.kcorr_stats, &mc_style)?;
    debug!("{msg}");
    written.push(path);

    let path = out("_MC_KcorrStd.svg");
    let std_style = style
        .clone()
        .with_title("Monte Carlo k-correction std")
        .with_labels("time (days)", "std(K) (mag)");
    let msg = plot_mc_kcorr_std(&path, &output.kcorr_stats, &std_style)?;
    debug!("{msg}");
    written.push(path);
    Ok(())
}
