//! Filled uncertainty band plots.

use std::error::Error;
use std::path::Path;

use plotters::prelude::*;

use super::style::{ErrorSeries, PlotStyle, axis_limits, configure_axes, draw_band, draw_error};
use crate::error::AppError;

/// Fill colour and opacity of a band.
#[derive(Debug, Clone, Copy)]
pub struct BandStyle {
    pub color: RGBColor,
    pub alpha: f64,
}

impl Default for BandStyle {
    fn default() -> Self {
        Self {
            color: RGBColor(0, 128, 0),
            alpha: 0.8,
        }
    }
}

/// Filled `y ± σ` band, written as SVG to `out`.
pub fn plot_band(out: &Path, band: &ErrorSeries, style: &PlotStyle, fill: BandStyle) -> Result<String, AppError> {
    draw(out, band, style, fill).map_err(|e| draw_error("band plot", out, e))?;
    Ok("# Plot band created.".to_string())
}

fn draw(out: &Path, band: &ErrorSeries, style: &PlotStyle, fill: BandStyle) -> Result<(), Box<dyn Error>> {
    let (x0, x1) = axis_limits(style.xlim, band.x_range());
    let (y0, y1) = axis_limits(style.ylim, band.y_range());

    let root = SVGBackend::new(out, style.pixel_size()).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(style.title.as_str(), ("sans-serif", style.font_size + 2))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, y0..y1)?;
    configure_axes(&mut chart, style, true)?;
    draw_band(&mut chart, band, fill.color, fill.alpha)?;
    root.present()?;
    Ok(())
}
