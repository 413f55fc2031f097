//! SVG figures (Plotters).
//!
//! - generic helpers: error bars, bands, template panels
//! - light-curve fit and Monte Carlo figures used by the fit driver
//!
//! Every helper takes its data and a [`PlotStyle`] explicitly, writes one SVG
//! and returns a short status line.

pub mod band;
pub mod errorbars;
pub mod lightcurve;
pub mod style;
pub mod templates;

pub use band::*;
pub use errorbars::*;
pub use lightcurve::*;
pub use style::{ErrorSeries, PALETTE, PlotStyle, SeriesStyle, palette_color, parse_color};
pub use templates::*;
