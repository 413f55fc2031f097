//! Figure styles and shared drawing helpers.
//!
//! Every figure is an SVG whose pixel size is `figsize (inches) × dpi`.

use std::error::Error;

use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;

use crate::error::{AppError, ensure_same_len};

pub(crate) type XyChart<'a, 'b> = ChartContext<'a, SVGBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Colours cycled through for multi-band figures.
pub const PALETTE: [RGBColor; 8] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
];

pub fn palette_color(i: usize) -> RGBColor {
    PALETTE[i % PALETTE.len()]
}

/// Parse a colour name (`red`, `r`, `green`, `g`, ...) or `#rrggbb`.
pub fn parse_color(name: &str) -> Option<RGBColor> {
    let c = match name {
        "red" | "r" => RED,
        "green" | "g" => RGBColor(0, 128, 0),
        "blue" | "b" => BLUE,
        "black" | "k" => BLACK,
        "cyan" | "c" => CYAN,
        "magenta" | "m" => MAGENTA,
        "yellow" | "y" => YELLOW,
        "orange" => RGBColor(255, 165, 0),
        "gray" | "grey" => RGBColor(128, 128, 128),
        hex if hex.len() == 7 && hex.is_ascii() && hex.starts_with('#') => {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            RGBColor(channel(1)?, channel(3)?, channel(5)?)
        }
        _ => return None,
    };
    Some(c)
}

/// Axes and figure settings shared by all helpers.
#[derive(Debug, Clone)]
pub struct PlotStyle {
    pub title: String,
    pub xlabel: String,
    pub ylabel: String,
    pub xlim: Option<(f64, f64)>,
    pub ylim: Option<(f64, f64)>,
    /// Axis label size; the title is two points larger.
    pub font_size: u32,
    /// Figure size in inches.
    pub figsize: (f64, f64),
    pub dpi: u32,
    pub marker_size: u32,
    pub elinewidth: u32,
    pub capsize: u32,
    pub grid: bool,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            title: "Data with error bars".to_string(),
            xlabel: "x axis".to_string(),
            ylabel: "y axis".to_string(),
            xlim: None,
            ylim: None,
            font_size: 12,
            figsize: (6.4, 4.8),
            dpi: 100,
            marker_size: 6,
            elinewidth: 1,
            capsize: 2,
            grid: true,
        }
    }
}

impl PlotStyle {
    pub fn band() -> Self {
        Self {
            title: "Band plot".to_string(),
            ..Self::default()
        }
    }

    pub fn templates() -> Self {
        Self {
            title: "Templates".to_string(),
            figsize: (12.0, 5.0),
            dpi: 80,
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_labels(mut self, xlabel: impl Into<String>, ylabel: impl Into<String>) -> Self {
        self.xlabel = xlabel.into();
        self.ylabel = ylabel.into();
        self
    }

    /// Figure size in pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        let px = |inches: f64| ((inches * self.dpi as f64).round() as u32).max(1);
        (px(self.figsize.0), px(self.figsize.1))
    }
}

/// Colour, transparency and legend label of one data set.
#[derive(Debug, Clone)]
pub struct SeriesStyle {
    pub color: RGBColor,
    pub alpha: f64,
    pub label: Option<String>,
}

impl SeriesStyle {
    pub fn new(color: RGBColor, alpha: f64) -> Self {
        Self {
            color,
            alpha,
            label: None,
        }
    }

    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// `(x, y, σ_y)` data for error-bar and band plots.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorSeries {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub err: Vec<f64>,
}

impl ErrorSeries {
    pub fn new(x: Vec<f64>, y: Vec<f64>, err: Vec<f64>) -> Result<Self, AppError> {
        ensure_same_len("x/y", x.len(), y.len())?;
        ensure_same_len("y/err", y.len(), err.len())?;
        Ok(Self { x, y, err })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.x
            .iter()
            .zip(&self.y)
            .zip(&self.err)
            .map(|((&x, &y), &e)| (x, y, e))
    }

    /// Smallest and largest `x`.
    pub fn x_range(&self) -> Option<(f64, f64)> {
        min_max(self.x.iter().copied())
    }

    /// Smallest `y - σ` and largest `y + σ`.
    pub fn y_range(&self) -> Option<(f64, f64)> {
        min_max(self.points().flat_map(|(_, y, e)| [y - e, y + e]))
    }
}

pub(crate) fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

pub(crate) fn merge_ranges(a: Option<(f64, f64)>, b: Option<(f64, f64)>) -> Option<(f64, f64)> {
    match (a, b) {
        (Some(a), Some(b)) => Some((a.0.min(b.0), a.1.max(b.1))),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Widen a data range by `frac` of its span on each side.
pub(crate) fn padded(range: Option<(f64, f64)>, frac: f64) -> (f64, f64) {
    match range {
        Some((lo, hi)) if hi > lo => {
            let pad = (hi - lo) * frac;
            (lo - pad, hi + pad)
        }
        Some((lo, _)) => (lo - 0.5, lo + 0.5),
        None => (0.0, 1.0),
    }
}

/// Axis limits: the style's fixed limits, else the padded data range.
pub(crate) fn axis_limits(fixed: Option<(f64, f64)>, data: Option<(f64, f64)>) -> (f64, f64) {
    fixed.unwrap_or_else(|| padded(data, 0.05))
}

/// Limits for a magnitude axis, ordered `(faint, bright)` so brighter points
/// plot higher.
pub(crate) fn magnitude_limits(fixed: Option<(f64, f64)>, data: Option<(f64, f64)>) -> (f64, f64) {
    let (a, b) = axis_limits(fixed, data);
    (a.max(b), a.min(b))
}

pub(crate) fn configure_axes(chart: &mut XyChart<'_, '_>, style: &PlotStyle, show_y_labels: bool) -> Result<(), Box<dyn Error>> {
    let blank = |_: &f64| String::new();
    let mut mesh = chart.configure_mesh();
    mesh.x_desc(style.xlabel.as_str())
        .label_style(("sans-serif", style.font_size))
        .x_labels(6)
        .y_labels(6);
    if show_y_labels {
        mesh.y_desc(style.ylabel.as_str());
    } else {
        mesh.y_label_formatter(&blank);
    }
    if style.grid {
        mesh.bold_line_style(BLACK.mix(0.3)).light_line_style(WHITE.mix(0.0));
    } else {
        mesh.disable_mesh();
    }
    mesh.draw()?;
    Ok(())
}

pub(crate) fn draw_error_series(
    chart: &mut XyChart<'_, '_>,
    data: &ErrorSeries,
    series: &SeriesStyle,
    style: &PlotStyle,
) -> Result<(), Box<dyn Error>> {
    let color = series.color.mix(series.alpha);
    let bar_style = color.stroke_width(style.elinewidth);
    chart.draw_series(
        data.points()
            .map(|(x, y, e)| ErrorBar::new_vertical(x, y - e, y, y + e, bar_style, style.capsize * 2)),
    )?;
    let radius = (style.marker_size / 2).max(1);
    let drawn = chart.draw_series(data.points().map(|(x, y, _)| Circle::new((x, y), radius, color.filled())))?;
    if let Some(label) = &series.label {
        drawn
            .label(label.as_str())
            .legend(move |(x, y)| Circle::new((x, y), radius, color.filled()));
    }
    Ok(())
}

/// Filled `y ± σ` polygon.
pub(crate) fn draw_band(chart: &mut XyChart<'_, '_>, data: &ErrorSeries, color: RGBColor, alpha: f64) -> Result<(), Box<dyn Error>> {
    if data.is_empty() {
        return Ok(());
    }
    let lower = data.points().map(|(x, y, e)| (x, y - e));
    let upper: Vec<(f64, f64)> = data.points().map(|(x, y, e)| (x, y + e)).collect();
    let outline: Vec<(f64, f64)> = lower.chain(upper.into_iter().rev()).collect();
    chart.draw_series(std::iter::once(Polygon::new(outline, color.mix(alpha).filled())))?;
    Ok(())
}

/// Map a drawing error to an `AppError`.
pub(crate) fn draw_error(what: &str, path: &std::path::Path, e: Box<dyn Error>) -> AppError {
    AppError::new(2, format!("Failed to draw {what} '{}': {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_size_follows_figsize_and_dpi() {
        assert_eq!(PlotStyle::default().pixel_size(), (640, 480));
        assert_eq!(PlotStyle::templates().pixel_size(), (960, 400));
    }

    #[test]
    fn parses_colour_names() {
        assert_eq!(parse_color("r"), Some(RED));
        assert_eq!(parse_color("#102030"), Some(RGBColor(16, 32, 48)));
        assert_eq!(parse_color("#1020"), None);
        assert_eq!(parse_color("mauve"), None);
    }

    #[test]
    fn ranges_and_padding() {
        let s = ErrorSeries::new(vec![1.0, 3.0], vec![10.0, 12.0], vec![0.5, 1.0]).unwrap();
        assert_eq!(s.x_range(), Some((1.0, 3.0)));
        assert_eq!(s.y_range(), Some((9.5, 13.0)));
        assert_eq!(padded(Some((0.0, 10.0)), 0.1), (-1.0, 11.0));
        assert_eq!(padded(Some((2.0, 2.0)), 0.1), (1.5, 2.5));
        assert_eq!(axis_limits(Some((0.0, 5.0)), Some((1.0, 2.0))), (0.0, 5.0));
        let (faint, bright) = magnitude_limits(None, Some((14.0, 16.0)));
        assert!(faint > 16.0 && bright < 14.0);
        assert_eq!(magnitude_limits(Some((13.0, 17.0)), None), (17.0, 13.0));
        assert_eq!(magnitude_limits(Some((17.0, 13.0)), None), (17.0, 13.0));
        assert!(ErrorSeries::new(vec![1.0], vec![], vec![]).is_err());
    }
}
