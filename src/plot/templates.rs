//! Multi-panel template figures.
//!
//! Each panel shows a template (mean line plus ±σ band) with a text label;
//! `templates_data` also overlays the photometry of a list of supernovae read
//! from a per-panel directory, each shifted by its apparent magnitude. All
//! panels share the x limits.

use std::error::Error;
use std::path::{Path, PathBuf};

use log::debug;
use plotters::prelude::*;

use super::style::{
    ErrorSeries, PlotStyle, SeriesStyle, axis_limits, configure_axes, draw_band, draw_error,
    draw_error_series, merge_ranges,
};
use crate::error::AppError;
use crate::io::read_template_photometry;

/// One panel: a template and its label.
#[derive(Debug, Clone)]
pub struct TemplatePanel {
    pub template: ErrorSeries,
    pub label: String,
}

/// Supernovae to overlay on one panel: names and apparent magnitudes.
#[derive(Debug, Clone)]
pub struct PanelPhotometry {
    pub dir: PathBuf,
    pub sne: Vec<(String, f64)>,
}

/// Colours of the template figures.
#[derive(Debug, Clone)]
pub struct TemplateStyle {
    /// Label anchor in data coordinates.
    pub label_pos: (f64, f64),
    pub label_color: RGBColor,
    pub band_color: RGBColor,
    pub band_alpha: f64,
    pub mean_color: RGBColor,
    pub mean_alpha: f64,
    pub data: SeriesStyle,
}

impl Default for TemplateStyle {
    fn default() -> Self {
        Self {
            label_pos: (-5.0, 2.0),
            label_color: BLUE,
            band_color: RGBColor(0, 128, 0),
            band_alpha: 0.5,
            mean_color: BLACK,
            mean_alpha: 1.0,
            data: SeriesStyle::new(BLACK, 0.6),
        }
    }
}

impl TemplateStyle {
    /// Defaults of the template-plus-data figure.
    pub fn with_data() -> Self {
        Self {
            label_color: BLACK,
            mean_alpha: 0.5,
            ..Self::default()
        }
    }
}

/// Side-by-side template panels, written as SVG to `out`.
pub fn plot_templates(
    out: &Path,
    panels: &[TemplatePanel],
    style: &PlotStyle,
    tstyle: &TemplateStyle,
) -> Result<String, AppError> {
    if panels.is_empty() {
        return Err(AppError::new(3, "No template panels to plot."));
    }
    let empty: Vec<Vec<ErrorSeries>> = vec![Vec::new(); panels.len()];
    draw_panels(out, panels, &empty, style, tstyle).map_err(|e| draw_error("template plot", out, e))?;
    Ok("# Plot template created.".to_string())
}

/// Template panels with photometry overlaid.
///
/// `photometry[i]` lists the supernovae drawn on panel `i`; their files are
/// `<dir>/<sn>.txt`.
pub fn templates_data(
    out: &Path,
    panels: &[TemplatePanel],
    photometry: &[PanelPhotometry],
    style: &PlotStyle,
    tstyle: &TemplateStyle,
) -> Result<String, AppError> {
    if panels.is_empty() {
        return Err(AppError::new(3, "No template panels to plot."));
    }
    if photometry.len() != panels.len() {
        return Err(AppError::new(
            3,
            format!(
                "Got photometry for {} panels but {} templates.",
                photometry.len(),
                panels.len()
            ),
        ));
    }

    let mut overlays = Vec::with_capacity(panels.len());
    for source in photometry {
        let mut sets = Vec::with_capacity(source.sne.len());
        for (sn, app_mag) in &source.sne {
            let obs = read_template_photometry(&source.dir, sn, *app_mag)?;
            debug!("{sn}: {} points from {}", obs.len(), source.dir.display());
            sets.push(ErrorSeries {
                x: obs.iter().map(|o| o.time).collect(),
                y: obs.iter().map(|o| o.mag).collect(),
                err: obs.iter().map(|o| o.err).collect(),
            });
        }
        overlays.push(sets);
    }

    draw_panels(out, panels, &overlays, style, tstyle)
        .map_err(|e| draw_error("template plot", out, e))?;
    Ok("# Plot template and data created.".to_string())
}

fn draw_panels(
    out: &Path,
    panels: &[TemplatePanel],
    overlays: &[Vec<ErrorSeries>],
    style: &PlotStyle,
    tstyle: &TemplateStyle,
) -> Result<(), Box<dyn Error>> {
    let all = panels
        .iter()
        .map(|p| &p.template)
        .chain(overlays.iter().flatten());
    let (x_data, y_data) = all.fold((None, None), |(xr, yr), s| {
        (merge_ranges(xr, s.x_range()), merge_ranges(yr, s.y_range()))
    });
    let (x0, x1) = axis_limits(style.xlim, x_data);
    let (y0, y1) = axis_limits(style.ylim, y_data);

    let root = SVGBackend::new(out, style.pixel_size()).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(style.title.as_str(), ("sans-serif", style.font_size + 2))?;
    let areas = root.split_evenly((1, panels.len()));

    for (i, ((panel, area), sets)) in panels.iter().zip(&areas).zip(overlays).enumerate() {
        let mut chart = ChartBuilder::on(area)
            .margin(5)
            .x_label_area_size(40)
            .y_label_area_size(if i == 0 { 60 } else { 10 })
            .build_cartesian_2d(x0..x1, y0..y1)?;
        configure_axes(&mut chart, style, i == 0)?;

        draw_band(&mut chart, &panel.template, tstyle.band_color, tstyle.band_alpha)?;
        let mean_style = tstyle.mean_color.mix(tstyle.mean_alpha).stroke_width(2);
        chart.draw_series(LineSeries::new(
            panel.template.x.iter().copied().zip(panel.template.y.iter().copied()),
            mean_style,
        ))?;

        for set in sets {
            draw_error_series(&mut chart, set, &tstyle.data, style)?;
        }

        chart.draw_series(std::iter::once(Text::new(
            panel.label.clone(),
            tstyle.label_pos,
            ("sans-serif", style.font_size + 2)
                .into_font()
                .color(&tstyle.label_color),
        )))?;
    }

    root.present()?;
    Ok(())
}
