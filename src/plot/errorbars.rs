//! Error-bar plots of one or two data sets.

use std::error::Error;
use std::path::Path;

use plotters::prelude::*;

use super::style::{
    ErrorSeries, PlotStyle, SeriesStyle, axis_limits, configure_axes, draw_error, draw_error_series,
    merge_ranges,
};
use crate::error::AppError;

/// Default look of `plot_errorbars`: red points, α 0.6.
pub fn default_errorbar_series() -> SeriesStyle {
    SeriesStyle::new(RED, 0.6)
}

/// Default looks of `plot_errorbars2`: blue (α 0.7) over red (α 0.5).
pub fn default_overlay_series() -> [SeriesStyle; 2] {
    [
        SeriesStyle::new(BLUE, 0.7).labelled("blue"),
        SeriesStyle::new(RED, 0.5).labelled("red"),
    ]
}

/// Error-bar plot of one data set, written as SVG to `out`.
pub fn plot_errorbars(
    out: &Path,
    data: &ErrorSeries,
    style: &PlotStyle,
    series: &SeriesStyle,
) -> Result<String, AppError> {
    draw_sets(out, &[(data, series)], style, false).map_err(|e| draw_error("error bar plot", out, e))?;
    Ok("# Error bar plot created.".to_string())
}

/// Two data sets overlaid, with a legend.
pub fn plot_errorbars2(
    out: &Path,
    first: &ErrorSeries,
    second: &ErrorSeries,
    style: &PlotStyle,
    series: &[SeriesStyle; 2],
) -> Result<String, AppError> {
    draw_sets(out, &[(first, &series[0]), (second, &series[1])], style, true)
        .map_err(|e| draw_error("overlay error bar plot", out, e))?;
    Ok("# Overlay error bar plots created.".to_string())
}

fn draw_sets(
    out: &Path,
    sets: &[(&ErrorSeries, &SeriesStyle)],
    style: &PlotStyle,
    legend: bool,
) -> Result<(), Box<dyn Error>> {
    let x_data = sets.iter().fold(None, |acc, (d, _)| merge_ranges(acc, d.x_range()));
    let y_data = sets.iter().fold(None, |acc, (d, _)| merge_ranges(acc, d.y_range()));
    let (x0, x1) = axis_limits(style.xlim, x_data);
    let (y0, y1) = axis_limits(style.ylim, y_data);

    let root = SVGBackend::new(out, style.pixel_size()).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(style.title.as_str(), ("sans-serif", style.font_size + 2))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, y0..y1)?;
    configure_axes(&mut chart, style, true)?;

    for (data, series) in sets {
        draw_error_series(&mut chart, data, series, style)?;
    }

    if legend {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }
    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(offset: f64) -> ErrorSeries {
        ErrorSeries::new(
            vec![0.0, 1.0, 2.0, 3.0],
            vec![offset, offset + 1.0, offset + 0.5, offset + 2.0],
            vec![0.1, 0.2, 0.1, 0.3],
        )
        .unwrap()
    }

    #[test]
    fn writes_single_and_overlay_svg() {
        let dir = std::env::temp_dir();
        let one = dir.join("snia_plot_errorbars_test.svg");
        let msg = plot_errorbars(&one, &data(0.0), &PlotStyle::default(), &default_errorbar_series()).unwrap();
        assert_eq!(msg, "# Error bar plot created.");
        let svg = std::fs::read_to_string(&one).unwrap();
        assert!(svg.contains("<svg") && svg.contains("Data with error bars"));

        let two = dir.join("snia_plot_errorbars2_test.svg");
        let msg = plot_errorbars2(&two, &data(0.0), &data(1.0), &PlotStyle::default(), &default_overlay_series()).unwrap();
        assert_eq!(msg, "# Overlay error bar plots created.");
        assert!(std::fs::read_to_string(&two).unwrap().contains("blue"));
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let out = Path::new("/nonexistent-dir-for-snia/plot.svg");
        let err = plot_errorbars(out, &data(0.0), &PlotStyle::default(), &default_errorbar_series()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
