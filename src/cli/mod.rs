//! Command-line parsing for the SNe Ia toolbox.
//!
//! Argument parsing and command dispatch are kept separate from the numerical
//! code; `app` turns these structs into plain config values.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "snia", version, about = "SNe Ia cosmology toolbox")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Distance modulus μ(z) for flat wCDM.
    Distmu(DistmuArgs),
    /// RMS / weighted RMS of a column with analytic and bootstrap errors.
    Rms(RmsArgs),
    /// Maximum-likelihood intrinsic scatter of Hubble residuals.
    Scatter(ScatterArgs),
    /// Straight-line fit with an outlier mixture model.
    Line(LineArgs),
    /// Fit a light curve, write figures, JSON and summary.
    Fit(FitArgs),
    /// Error-bar or band plot of columns from a text file.
    Plot(PlotArgs),
}

/// Flat wCDM parameters.
#[derive(Debug, Args, Clone)]
pub struct CosmoArgs {
    /// Matter density Ωm.
    #[arg(long, default_value_t = 0.27)]
    pub omega_m: f64,

    /// Dark-energy equation of state w.
    #[arg(long, default_value_t = -1.0, allow_hyphen_values = true)]
    pub w: f64,

    /// Hubble constant (km/s/Mpc).
    #[arg(long, default_value_t = 72.0)]
    pub h0: f64,
}

#[derive(Debug, Args)]
pub struct DistmuArgs {
    /// Redshifts.
    #[arg(required = true, num_args = 1..)]
    pub z: Vec<f64>,

    /// Redshift uncertainty used for σ_μ.
    #[arg(long, default_value_t = 0.0)]
    pub err_z: f64,

    /// Peculiar-velocity dispersion (km/s) used for σ_μ.
    #[arg(long, default_value_t = crate::cosmology::DEFAULT_SIGMA_VPEC)]
    pub sigma_vpec: f64,

    #[command(flatten)]
    pub cosmo: CosmoArgs,
}

/// Column input shared by the statistics commands.
#[derive(Debug, Args, Clone)]
pub struct ColumnInput {
    /// Whitespace-separated text file (`#` comments ignored).
    pub file: PathBuf,

    /// Header lines to skip.
    #[arg(long, default_value_t = 0)]
    pub skip_header: usize,
}

#[derive(Debug, Args)]
pub struct RmsArgs {
    #[command(flatten)]
    pub input: ColumnInput,

    /// Column holding the values.
    #[arg(long, default_value_t = 0)]
    pub col: usize,

    /// Column holding per-value uncertainties (enables analytic errors).
    #[arg(long)]
    pub err_col: Option<usize>,

    /// Column holding weights (enables weighted RMS).
    #[arg(long)]
    pub weight_col: Option<usize>,

    /// Bootstrap resamples.
    #[arg(long, default_value_t = 1000)]
    pub boot: usize,

    /// Bootstrap seed.
    #[arg(long, default_value_t = crate::stats::BOOTSTRAP_SEED)]
    pub seed: u64,
}

#[derive(Debug, Args)]
pub struct ScatterArgs {
    #[command(flatten)]
    pub input: ColumnInput,

    /// Columns: Hubble residual, σ_vpec, σ_mag.
    #[arg(long, value_delimiter = ',', default_values_t = [0usize, 1, 2])]
    pub cols: Vec<usize>,

    /// Initial guess for the scatter.
    #[arg(long, default_value_t = crate::stats::DEFAULT_INITIAL_GUESS)]
    pub initial: f64,
}

#[derive(Debug, Args)]
pub struct LineArgs {
    #[command(flatten)]
    pub input: ColumnInput,

    /// Columns: x, y, σ_y.
    #[arg(long, value_delimiter = ',', default_values_t = [0usize, 1, 2])]
    pub cols: Vec<usize>,
}

#[derive(Debug, Args)]
pub struct FitArgs {
    /// Light-curve file (header `name z ra dec`, then `filter <band>` blocks).
    pub lc_file: PathBuf,

    /// Output directory.
    #[arg(short = 'o', long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Bands to fit (comma-separated); all bands when omitted.
    #[arg(short = 'b', long, value_delimiter = ',')]
    pub bands: Vec<String>,

    /// Observer-to-rest band match, e.g. `--rest J:Y` (repeatable).
    #[arg(long = "rest", value_name = "OBS:REST")]
    pub rest: Vec<String>,

    /// Polynomial degree of the band models.
    #[arg(long, default_value_t = crate::fit::DEFAULT_POLY_DEGREE)]
    pub degree: usize,

    /// Disable k-corrections.
    #[arg(long)]
    pub no_kcorr: bool,

    /// Use a flat SED instead of mangling to the model colours.
    #[arg(long)]
    pub no_mangle: bool,

    /// Peak absolute magnitude of the reference band.
    #[arg(long, default_value_t = crate::fit::DEFAULT_ABSOLUTE_MAG, allow_hyphen_values = true)]
    pub abs_mag: f64,

    #[command(flatten)]
    pub cosmo: CosmoArgs,

    /// Run this many Monte Carlo simulations for k-correction errors.
    #[arg(long)]
    pub mc: Option<usize>,

    /// Base seed of the Monte Carlo simulations.
    #[arg(long, default_value_t = crate::fit::DEFAULT_MC_SEED)]
    pub seed: u64,

    /// Resolution of the light-curve figures.
    #[arg(long, default_value_t = crate::app::pipeline::DEFAULT_DPI)]
    pub dpi: u32,

    /// Resolution of the filter figure.
    #[arg(long, default_value_t = crate::app::pipeline::DEFAULT_DPI_FILTERS)]
    pub dpi_filters: u32,

    /// Cut this many characters from the end of the file name to name the
    /// outputs (e.g. 12 turns `sn2005el_lc_snpy.txt` into `sn2005el`).
    #[arg(long)]
    pub trim: Option<usize>,
}

#[derive(Debug, Args)]
pub struct PlotArgs {
    #[command(flatten)]
    pub input: ColumnInput,

    /// Output SVG.
    #[arg(short = 'o', long, default_value = "plot_data_errorbars_.svg")]
    pub out: PathBuf,

    /// Columns: x, y, σ_y.
    #[arg(long, value_delimiter = ',', default_values_t = [0usize, 1, 2])]
    pub cols: Vec<usize>,

    /// Draw a filled band instead of error bars.
    #[arg(long, conflicts_with = "overlay")]
    pub band: bool,

    /// Second file drawn over the first, with a legend.
    #[arg(long)]
    pub overlay: Option<PathBuf>,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long, default_value = "x axis")]
    pub xlabel: String,

    #[arg(long, default_value = "y axis")]
    pub ylabel: String,

    /// Colour name or `#rrggbb`.
    #[arg(long)]
    pub color: Option<String>,

    #[arg(long, default_value_t = 100)]
    pub dpi: u32,
}
