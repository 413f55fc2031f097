//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - turns them into plain config values
//! - runs the requested computation and prints its result

use clap::Parser;
use log::debug;

use crate::cli::{
    ColumnInput, Command, CosmoArgs, DistmuArgs, FitArgs, LineArgs, PlotArgs, RmsArgs, ScatterArgs,
};
use crate::cosmology::{CosmoParams, distance_modulus_vec, sigma_mu_vpec};
use crate::domain::HubbleResiduals;
use crate::error::AppError;
use crate::fit::{FitOptions, KcorrOptions, MonteCarloConfig};
use crate::io::{DEFAULT_AUTHOR, read_columns};
use crate::plot::{
    BandStyle, ErrorSeries, PlotStyle, SeriesStyle, default_errorbar_series, default_overlay_series,
    parse_color, plot_band, plot_errorbars, plot_errorbars2,
};
use crate::stats::{
    LineData, err_rms, err_rms_boot_seeded, err_wrms, err_wrms_boot_seeded, fit_line_with_outliers,
    intrinsic_scatter, rms, wrms,
};

pub mod pipeline;

/// Environment variable naming the author written in fit summaries.
pub const AUTHOR_ENV: &str = "SNIA_AUTHOR";

/// Entry point for the `snia` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Distmu(args) => handle_distmu(args),
        Command::Rms(args) => handle_rms(args),
        Command::Scatter(args) => handle_scatter(args),
        Command::Line(args) => handle_line(args),
        Command::Fit(args) => handle_fit(args),
        Command::Plot(args) => handle_plot(args),
    }
}

fn handle_distmu(args: DistmuArgs) -> Result<(), AppError> {
    let params = cosmo_params_from_args(&args.cosmo);
    let mus = distance_modulus_vec(&args.z, &params)?;
    println!("# z  mu  sigma_mu");
    for (&z, mu) in args.z.iter().zip(mus) {
        let sigma = sigma_mu_vpec(z, args.err_z, args.sigma_vpec);
        println!("{z:.6}  {mu:.6}  {sigma:.6}");
    }
    Ok(())
}

fn handle_rms(args: RmsArgs) -> Result<(), AppError> {
    let mut cols = vec![args.col];
    cols.extend(args.err_col);
    cols.extend(args.weight_col);
    let mut data = read_input(&args.input, &cols)?.into_iter();
    let x = data.next().unwrap_or_default();
    let sigma = args.err_col.and_then(|_| data.next());
    let weights = args.weight_col.and_then(|_| data.next());

    match weights {
        Some(w) => {
            println!("wrms = {:.6}", wrms(&x, &w)?);
            if let Some(sigma) = &sigma {
                println!("err_wrms = {:.6}", err_wrms(&x, &w, sigma)?);
            }
            println!("err_wrms_boot = {:.6}", err_wrms_boot_seeded(&x, &w, args.boot, args.seed)?);
        }
        None => {
            println!("rms = {:.6}", rms(&x)?);
            if let Some(sigma) = &sigma {
                println!("err_rms = {:.6}", err_rms(&x, sigma)?);
            }
            println!("err_rms_boot = {:.6}", err_rms_boot_seeded(&x, args.boot, args.seed)?);
        }
    }
    Ok(())
}

fn handle_scatter(args: ScatterArgs) -> Result<(), AppError> {
    let [r, v, m] = three_columns(read_input(&args.input, &args.cols)?)?;
    let data = HubbleResiduals::new(r, v, m)?;
    let est = intrinsic_scatter(&data, args.initial)?;
    println!("sigma_int = {:.6} +/- {:.6}", est.value, est.error);
    Ok(())
}

fn handle_line(args: LineArgs) -> Result<(), AppError> {
    let [x, y, s] = three_columns(read_input(&args.input, &args.cols)?)?;
    let fit = fit_line_with_outliers(&LineData::new(x, y, s)?, None)?;
    let p = fit.params;
    println!("m   = {:.6}", p.slope);
    println!("b   = {:.6}", p.intercept);
    println!("Pb  = {:.6}", p.outlier_prob);
    println!("Yb  = {:.6}", p.outlier_mean);
    println!("eVb = {:.6}", p.outlier_log_var);
    println!("lnL = {:.6}", fit.ln_likelihood);
    Ok(())
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let request = fit_request_from_args(&args, author_from_env())?;
    let run = pipeline::run_lc_fit(&request)?;

    println!("{}", crate::report::format_fit_summary(&run.fit));
    if let Some(mc) = &run.monte_carlo {
        println!("# Monte Carlo: {} simulations, {} bands", mc.num_sim, mc.output.kcorr_stats.len());
    }
    for path in &run.written {
        debug!("wrote {}", path.display());
    }
    println!("#---- {} done ----", run.stem);
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let [x, y, err] = three_columns(read_input(&args.input, &args.cols)?)?;
    let data = ErrorSeries::new(x, y, err)?;
    let color = match &args.color {
        Some(name) => Some(
            parse_color(name).ok_or_else(|| AppError::new(2, format!("Unknown colour '{name}'.")))?,
        ),
        None => None,
    };

    let base = if args.band { PlotStyle::band() } else { PlotStyle::default() };
    let mut style = PlotStyle {
        dpi: args.dpi,
        ..base.with_labels(args.xlabel.as_str(), args.ylabel.as_str())
    };
    if let Some(title) = &args.title {
        style.title = title.clone();
    }

    let msg = if let Some(second) = &args.overlay {
        let input = ColumnInput {
            file: second.clone(),
            skip_header: args.input.skip_header,
        };
        let [x2, y2, err2] = three_columns(read_input(&input, &args.cols)?)?;
        let other = ErrorSeries::new(x2, y2, err2)?;
        let mut series = default_overlay_series();
        if let Some(c) = color {
            series[0].color = c;
        }
        plot_errorbars2(&args.out, &data, &other, &style, &series)?
    } else if args.band {
        let fill = BandStyle {
            color: color.unwrap_or(BandStyle::default().color),
            ..BandStyle::default()
        };
        plot_band(&args.out, &data, &style, fill)?
    } else {
        let series = match color {
            Some(c) => SeriesStyle::new(c, default_errorbar_series().alpha),
            None => default_errorbar_series(),
        };
        plot_errorbars(&args.out, &data, &style, &series)?
    };
    println!("{msg}");
    Ok(())
}

pub fn cosmo_params_from_args(args: &CosmoArgs) -> CosmoParams {
    CosmoParams {
        omega_m: args.omega_m,
        w: args.w,
        h0: args.h0,
    }
}

pub fn fit_request_from_args(args: &FitArgs, author: String) -> Result<pipeline::FitRequest, AppError> {
    let obs_rest_bands = args
        .rest
        .iter()
        .map(|s| parse_band_match(s))
        .collect::<Result<Vec<_>, _>>()?;

    let mut request = pipeline::FitRequest::new(&args.lc_file, &args.out_dir);
    request.bands = args.bands.iter().map(|b| b.trim().to_string()).filter(|b| !b.is_empty()).collect();
    request.obs_rest_bands = obs_rest_bands;
    request.fit = FitOptions {
        poly_degree: args.degree,
        kcorr: KcorrOptions {
            apply: !args.no_kcorr,
            mangle: !args.no_mangle,
        },
        cosmology: cosmo_params_from_args(&args.cosmo),
        absolute_mag: args.abs_mag,
    };
    request.monte_carlo = args.mc.map(|num_sim| MonteCarloConfig {
        num_sim,
        seed: args.seed,
    });
    request.dpi = args.dpi;
    request.dpi_filters = args.dpi_filters;
    request.author = author;
    request.name_trim = args.trim;
    Ok(request)
}

/// Parse an `OBS:REST` band match such as `J:Y`.
pub fn parse_band_match(s: &str) -> Result<(String, String), AppError> {
    match s.split_once(':') {
        Some((obs, rest)) if !obs.trim().is_empty() && !rest.trim().is_empty() => {
            Ok((obs.trim().to_string(), rest.trim().to_string()))
        }
        _ => Err(AppError::new(2, format!("Bad band match '{s}', expected OBS:REST."))),
    }
}

/// Summary author from `SNIA_AUTHOR` (a `.env` file is honoured).
fn author_from_env() -> String {
    dotenvy::dotenv().ok();
    std::env::var(AUTHOR_ENV)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_AUTHOR.to_string())
}

fn read_input(input: &ColumnInput, cols: &[usize]) -> Result<Vec<Vec<f64>>, AppError> {
    let data = read_columns(&input.file, input.skip_header, cols)?;
    debug!("read {} rows from {}", data.first().map_or(0, Vec::len), input.file.display());
    Ok(data)
}

fn three_columns(data: Vec<Vec<f64>>) -> Result<[Vec<f64>; 3], AppError> {
    <[Vec<f64>; 3]>::try_from(data)
        .map_err(|d| AppError::new(2, format!("Expected 3 columns, got {}.", d.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> crate::cli::Cli {
        crate::cli::Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn parses_band_matches() {
        assert_eq!(parse_band_match("J:Y").unwrap(), ("J".to_string(), "Y".to_string()));
        assert_eq!(parse_band_match(" H : J ").unwrap(), ("H".to_string(), "J".to_string()));
        assert_eq!(parse_band_match("J").unwrap_err().exit_code(), 2);
        assert_eq!(parse_band_match(":Y").unwrap_err().exit_code(), 2);
    }

    #[test]
    fn fit_args_become_a_request() {
        let cli = parse(&[
            "snia", "fit", "sn2005el.dat", "-o", "out", "-b", "B,V,J", "--rest", "J:Y", "--no-mangle",
            "--w", "-0.9", "--h0", "70", "--mc", "20", "--seed", "7", "--dpi-filters", "50", "--trim", "11",
        ]);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        let req = fit_request_from_args(&args, "tester".to_string()).unwrap();
        assert_eq!(req.bands, vec!["B", "V", "J"]);
        assert_eq!(req.obs_rest_bands, vec![("J".to_string(), "Y".to_string())]);
        assert!(req.fit.kcorr.apply);
        assert!(!req.fit.kcorr.mangle);
        assert_eq!(req.fit.cosmology.w, -0.9);
        assert_eq!(req.fit.cosmology.h0, 70.0);
        assert_eq!(req.fit.cosmology.omega_m, 0.27);
        assert_eq!(req.monte_carlo, Some(MonteCarloConfig { num_sim: 20, seed: 7 }));
        assert_eq!(req.dpi, pipeline::DEFAULT_DPI);
        assert_eq!(req.dpi_filters, 50);
        assert_eq!(req.author, "tester");
        assert_eq!(req.name_trim, Some(11));
    }

    #[test]
    fn fit_defaults() {
        let Command::Fit(args) = parse(&["snia", "fit", "lc.dat"]).command else {
            panic!("expected fit");
        };
        let req = fit_request_from_args(&args, DEFAULT_AUTHOR.to_string()).unwrap();
        assert!(req.bands.is_empty());
        assert!(req.monte_carlo.is_none());
        assert_eq!(req.fit.poly_degree, crate::fit::DEFAULT_POLY_DEGREE);
        assert_eq!(req.fit.absolute_mag, crate::fit::DEFAULT_ABSOLUTE_MAG);
        assert_eq!(req.out_dir, std::path::PathBuf::from("."));
        assert_eq!(req.name_trim, None);
    }

    #[test]
    fn bad_rest_match_is_rejected() {
        let Command::Fit(args) = parse(&["snia", "fit", "lc.dat", "--rest", "JY"]).command else {
            panic!("expected fit");
        };
        assert_eq!(fit_request_from_args(&args, String::new()).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn cosmology_defaults() {
        let Command::Distmu(args) = parse(&["snia", "distmu", "0.1", "0.5"]).command else {
            panic!("expected distmu");
        };
        assert_eq!(args.z, vec![0.1, 0.5]);
        assert_eq!(args.sigma_vpec, crate::cosmology::DEFAULT_SIGMA_VPEC);
        let p = cosmo_params_from_args(&args.cosmo);
        assert_eq!((p.omega_m, p.w, p.h0), (0.27, -1.0, 72.0));
    }

    #[test]
    fn plot_args_default_to_error_bars() {
        let Command::Plot(args) = parse(&["snia", "plot", "data.txt", "--overlay", "other.txt"]).command else {
            panic!("expected plot");
        };
        assert!(!args.band);
        assert_eq!(args.cols, vec![0, 1, 2]);
        assert_eq!(args.overlay, Some(std::path::PathBuf::from("other.txt")));
        assert!(crate::cli::Cli::try_parse_from(["snia", "plot", "d.txt", "--band", "--overlay", "o.txt"]).is_err());
    }

    #[test]
    fn three_columns_checks_count() {
        assert!(three_columns(vec![vec![1.0], vec![2.0], vec![3.0]]).is_ok());
        assert_eq!(three_columns(vec![vec![1.0]]).unwrap_err().exit_code(), 2);
    }
}
