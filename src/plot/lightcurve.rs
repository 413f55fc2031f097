//! Light-curve fit figures.
//!
//! Written by the fit driver for every supernova:
//! - `PlotFit` / `PlotFitText`: one panel per band, data plus model ±1σ
//!   (the second annotated with the fit parameters)
//! - `PlotOver`: every band on one panel, offset by 1 mag per band
//! - `PlotKcorrs`: k-corrections per band
//! - `Filters`: passbands of the fitted bands
//! - `MC_Kcorrs` / `MC_KcorrStd`: Monte Carlo k-corrections and their spread

use std::collections::BTreeMap;
use std::error::Error;
use std::path::Path;

use log::warn;
use plotters::prelude::*;

use super::style::{
    ErrorSeries, PlotStyle, SeriesStyle, XyChart, axis_limits, configure_axes, draw_band, draw_error,
    draw_error_series, magnitude_limits, merge_ranges, min_max, palette_color,
};
use crate::domain::{BandFit, KcorrStats, LcFitResult, LightCurve, SimulatedSeries};
use crate::error::AppError;
use crate::fit::lookup_filter;
use crate::models::{model_grid, predict, predict_error};

const MODEL_STEP_DAYS: f64 = 0.5;
const MODEL_MAX_POINTS: usize = 400;

/// Model curve of one band as `(t, m, σ_m)`.
fn model_series(fit: &BandFit, offset: f64) -> ErrorSeries {
    let x = model_grid(fit, MODEL_STEP_DAYS, MODEL_MAX_POINTS);
    let y = x.iter().map(|&t| predict(fit, t) + offset).collect();
    let err = x.iter().map(|&t| predict_error(fit, t)).collect();
    ErrorSeries { x, y, err }
}

fn data_series(lc: &LightCurve, band: &str, offset: f64) -> Option<ErrorSeries> {
    let data = lc.band(band)?;
    Some(ErrorSeries {
        x: data.times(),
        y: data.mags().iter().map(|m| m + offset).collect(),
        err: data.errs(),
    })
}

fn draw_model(chart: &mut XyChart<'_, '_>, model: &ErrorSeries, color: RGBColor) -> Result<(), Box<dyn Error>> {
    draw_band(chart, model, color, 0.25)?;
    chart.draw_series(LineSeries::new(
        model.x.iter().copied().zip(model.y.iter().copied()),
        color.stroke_width(2),
    ))?;
    Ok(())
}

/// One panel per fitted band; `annotation` lines are printed on the first.
pub fn plot_fit(
    out: &Path,
    lc: &LightCurve,
    fit: &LcFitResult,
    annotation: Option<&[String]>,
    style: &PlotStyle,
) -> Result<String, AppError> {
    draw_fit(out, lc, fit, annotation, style).map_err(|e| draw_error("light-curve fit", out, e))?;
    Ok(format!("# Light-curve fit plot of {} created.", fit.sn))
}

fn draw_fit(
    out: &Path,
    lc: &LightCurve,
    fit: &LcFitResult,
    annotation: Option<&[String]>,
    style: &PlotStyle,
) -> Result<(), Box<dyn Error>> {
    let n = fit.bands.len().max(1);
    let cols = (n as f64).sqrt().ceil() as usize;
    let rows = n.div_ceil(cols);

    let root = SVGBackend::new(out, style.pixel_size()).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(fit.sn.as_str(), ("sans-serif", style.font_size + 2))?;
    let areas = root.split_evenly((rows, cols));

    for (i, (band_fit, area)) in fit.bands.iter().zip(&areas).enumerate() {
        let color = palette_color(i);
        let model = model_series(band_fit, 0.0);
        let data = data_series(lc, &band_fit.band, 0.0);

        let x_data = merge_ranges(model.x_range(), data.as_ref().and_then(ErrorSeries::x_range));
        let y_data = merge_ranges(model.y_range(), data.as_ref().and_then(ErrorSeries::y_range));
        let (x0, x1) = axis_limits(style.xlim, x_data);
        let (faint, bright) = magnitude_limits(style.ylim, y_data);

        let mut chart = ChartBuilder::on(area)
            .caption(band_fit.band.as_str(), ("sans-serif", style.font_size))
            .margin(5)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(x0..x1, faint..bright)?;
        configure_axes(&mut chart, style, true)?;
        draw_model(&mut chart, &model, color)?;
        if let Some(data) = &data {
            draw_error_series(&mut chart, data, &SeriesStyle::new(BLACK, 0.8), style)?;
        }
    }

    if let (Some(lines), Some(first)) = (annotation, areas.first()) {
        for (k, line) in lines.iter().enumerate() {
            first.draw(&Text::new(
                line.as_str(),
                (60, 25 + 15 * k as i32),
                ("sans-serif", style.font_size.saturating_sub(1).max(8)),
            ))?;
        }
    }

    root.present()?;
    Ok(())
}

/// All bands on one panel, band `i` shifted by `i` magnitudes.
pub fn plot_over(out: &Path, lc: &LightCurve, fit: &LcFitResult, style: &PlotStyle) -> Result<String, AppError> {
    draw_over(out, lc, fit, style).map_err(|e| draw_error("light-curve overlay", out, e))?;
    Ok(format!("# Overlay light-curve plot of {} created.", fit.sn))
}

fn draw_over(out: &Path, lc: &LightCurve, fit: &LcFitResult, style: &PlotStyle) -> Result<(), Box<dyn Error>> {
    let sets: Vec<(ErrorSeries, Option<ErrorSeries>)> = fit
        .bands
        .iter()
        .enumerate()
        .map(|(i, b)| (model_series(b, i as f64), data_series(lc, &b.band, i as f64)))
        .collect();

    let (x_data, y_data) = sets.iter().fold((None, None), |(xr, yr), (m, d)| {
        let xr = merge_ranges(merge_ranges(xr, m.x_range()), d.as_ref().and_then(ErrorSeries::x_range));
        let yr = merge_ranges(merge_ranges(yr, m.y_range()), d.as_ref().and_then(ErrorSeries::y_range));
        (xr, yr)
    });
    let (x0, x1) = axis_limits(style.xlim, x_data);
    let (faint, bright) = magnitude_limits(style.ylim, y_data);

    let root = SVGBackend::new(out, style.pixel_size()).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(style.title.as_str(), ("sans-serif", style.font_size + 2))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, faint..bright)?;
    configure_axes(&mut chart, style, true)?;

    for (i, ((model, data), band_fit)) in sets.iter().zip(&fit.bands).enumerate() {
        let color = palette_color(i);
        draw_model(&mut chart, model, color)?;
        if let Some(data) = data {
            let series = SeriesStyle::new(color, 0.8).labelled(format!("{}+{i}", band_fit.band));
            draw_error_series(&mut chart, data, &series, style)?;
        }
    }
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

/// K-corrections of every band against observed time.
pub fn plot_kcorrs(out: &Path, fit: &LcFitResult, style: &PlotStyle) -> Result<String, AppError> {
    let curves: Vec<(String, Vec<(f64, f64)>)> = fit
        .kcorrs
        .iter()
        .map(|k| {
            let label = format!("{} -> {}", k.band, k.rest_band);
            (label, k.times.iter().copied().zip(k.values.iter().copied()).collect())
        })
        .collect();
    draw_curves(out, &curves, style).map_err(|e| draw_error("k-correction plot", out, e))?;
    Ok(format!("# K-correction plot of {} created.", fit.sn))
}

/// Labelled line curves on one panel.
fn draw_curves(out: &Path, curves: &[(String, Vec<(f64, f64)>)], style: &PlotStyle) -> Result<(), Box<dyn Error>> {
    let all = || curves.iter().flat_map(|(_, pts)| pts.iter());
    let (x0, x1) = axis_limits(style.xlim, min_max(all().map(|p| p.0)));
    let (y0, y1) = axis_limits(style.ylim, min_max(all().map(|p| p.1)));

    let root = SVGBackend::new(out, style.pixel_size()).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(style.title.as_str(), ("sans-serif", style.font_size + 2))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, y0..y1)?;
    configure_axes(&mut chart, style, true)?;

    for (i, (label, pts)) in curves.iter().enumerate() {
        let color = palette_color(i);
        chart
            .draw_series(LineSeries::new(pts.iter().copied(), color.stroke_width(2)))?
            .label(label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        chart.draw_series(pts.iter().map(|&p| Circle::new(p, 3, color.filled())))?;
    }
    if !curves.is_empty() {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }
    root.present()?;
    Ok(())
}

/// Passbands of the fitted bands (filled) and their rest-frame bands
/// redshifted into the observer frame (outline).
pub fn plot_filters(out: &Path, fit: &LcFitResult, style: &PlotStyle) -> Result<String, AppError> {
    draw_filters(out, fit, style).map_err(|e| draw_error("filter plot", out, e))?;
    Ok(format!("# Filter plot of {} created.", fit.sn))
}

fn draw_filters(out: &Path, fit: &LcFitResult, style: &PlotStyle) -> Result<(), Box<dyn Error>> {
    let mut boxes = Vec::new();
    for b in &fit.bands {
        let Some(obs) = lookup_filter(&b.band) else {
            warn!("no passband for {}; left out of the filter plot", b.band);
            continue;
        };
        let rest = lookup_filter(&b.rest_band).map(|r| (r.lambda_eff * (1.0 + fit.z), r.fwhm * (1.0 + fit.z)));
        boxes.push((b.band.clone(), (obs.lambda_eff, obs.fwhm), rest));
    }

    let edges = boxes.iter().flat_map(|(_, (l, w), rest)| {
        let mut v = vec![l - w, l + w];
        if let Some((rl, rw)) = rest {
            v.extend([rl - rw, rl + rw]);
        }
        v
    });
    let (x0, x1) = axis_limits(style.xlim, min_max(edges));

    let root = SVGBackend::new(out, style.pixel_size()).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(style.title.as_str(), ("sans-serif", style.font_size + 2))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(x0..x1, 0.0..1.2)?;
    configure_axes(&mut chart, style, true)?;

    for (i, (band, (lambda, width), rest)) in boxes.iter().enumerate() {
        let color = palette_color(i);
        let (lo, hi) = (lambda - width / 2.0, lambda + width / 2.0);
        chart
            .draw_series(std::iter::once(Polygon::new(
                vec![(lo, 0.0), (lo, 1.0), (hi, 1.0), (hi, 0.0)],
                color.mix(0.4).filled(),
            )))?
            .label(band.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], color.mix(0.4).filled()));
        if let Some((rl, rw)) = rest {
            let (lo, hi) = (rl - rw / 2.0, rl + rw / 2.0);
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(lo, 0.0), (lo, 0.9), (hi, 0.9), (hi, 0.0)],
                color.stroke_width(1),
            )))?;
        }
    }
    if !boxes.is_empty() {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }
    root.present()?;
    Ok(())
}

/// Every simulated k-correction curve (faint) with the per-epoch mean.
pub fn plot_mc_kcorrs(
    out: &Path,
    sim_kcorrs: &SimulatedSeries,
    stats: &BTreeMap<String, KcorrStats>,
    style: &PlotStyle,
) -> Result<String, AppError> {
    draw_mc_kcorrs(out, sim_kcorrs, stats, style).map_err(|e| draw_error("Monte Carlo k-correction plot", out, e))?;
    Ok("# Monte Carlo k-correction plot created.".to_string())
}

fn draw_mc_kcorrs(
    out: &Path,
    sim_kcorrs: &SimulatedSeries,
    stats: &BTreeMap<String, KcorrStats>,
    style: &PlotStyle,
) -> Result<(), Box<dyn Error>> {
    let x_data = stats.values().fold(None, |acc, s| merge_ranges(acc, min_max(s.times.iter().copied())));
    let y_data = min_max(sim_kcorrs.values().flat_map(|sims| sims.values().flatten().copied()));
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

    for (i, (band, band_stats)) in stats.iter().enumerate() {
        let color = palette_color(i);
        if let Some(sims) = sim_kcorrs.get(band) {
            for values in sims.values() {
                chart.draw_series(LineSeries::new(
                    band_stats.times.iter().copied().zip(values.iter().copied()),
                    color.mix(0.15),
                ))?;
            }
        }
        chart
            .draw_series(LineSeries::new(
                band_stats.times.iter().copied().zip(band_stats.mean.iter().copied()),
                color.stroke_width(2),
            ))?
            .label(band.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }
    if !stats.is_empty() {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }
    root.present()?;
    Ok(())
}

/// Per-epoch standard deviation of the simulated k-corrections.
pub fn plot_mc_kcorr_std(out: &Path, stats: &BTreeMap<String, KcorrStats>, style: &PlotStyle) -> Result<String, AppError> {
    let curves: Vec<(String, Vec<(f64, f64)>)> = stats
        .iter()
        .map(|(band, s)| (band.clone(), s.times.iter().copied().zip(s.std.iter().copied()).collect()))
        .collect();
    draw_curves(out, &curves, style).map_err(|e| draw_error("Monte Carlo k-correction std plot", out, e))?;
    Ok("# Monte Carlo k-correction std plot created.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BandData, Observation};
    use crate::fit::{LightCurveFitter, PeakPolynomialFitter};

    fn fitted() -> (LightCurve, LcFitResult) {
        let band = |name: &str, peak: f64| {
            let points = (0..16)
                .map(|i| {
                    let t = 53_000.0 + 3.0 * i as f64;
                    Observation {
                        time: t,
                        mag: peak + 0.004 * (t - 53_015.0).powi(2),
                        err: 0.03,
                    }
                })
                .collect();
            BandData::new(name, points)
        };
        let lc = LightCurve {
            name: "sn2007af".to_string(),
            z: 0.0055,
            ra: 0.0,
            dec: 0.0,
            bands: vec![band("B", 13.2), band("V", 13.1), band("J", 13.4)],
            rest_bands: BTreeMap::new(),
        };
        let fit = PeakPolynomialFitter::default().fit(&lc, &lc.band_names()).unwrap();
        (lc, fit)
    }

    #[test]
    fn writes_all_fit_figures() {
        let (lc, fit) = fitted();
        let dir = std::env::temp_dir().join("snia_lc_plots_test");
        std::fs::create_dir_all(&dir).unwrap();
        let style = PlotStyle::default().with_labels("MJD", "mag");
        let notes = vec!["dm15 = 1.0".to_string()];

        plot_fit(&dir.join("fit.svg"), &lc, &fit, None, &style).unwrap();
        plot_fit(&dir.join("fit_text.svg"), &lc, &fit, Some(notes.as_slice()), &style).unwrap();
        plot_over(&dir.join("over.svg"), &lc, &fit, &style).unwrap();
        plot_kcorrs(&dir.join("kcorrs.svg"), &fit, &style).unwrap();
        plot_filters(&dir.join("filters.svg"), &fit, &style).unwrap();

        assert!(std::fs::read_to_string(dir.join("fit_text.svg")).unwrap().contains("dm15 = 1.0"));
        assert!(std::fs::read_to_string(dir.join("over.svg")).unwrap().contains("J+2"));

        // Fixed magnitude limits in either order still put bright points on top.
        let fixed = PlotStyle {
            ylim: Some((13.0, 19.0)),
            ..style.clone()
        };
        plot_over(&dir.join("over_fixed.svg"), &lc, &fit, &fixed).unwrap();
        let fixed = PlotStyle {
            ylim: Some((19.0, 13.0)),
            ..style
        };
        plot_fit(&dir.join("fit_fixed.svg"), &lc, &fit, None, &fixed).unwrap();
        assert!(dir.join("fit_fixed.svg").exists());
    }

    #[test]
    fn writes_monte_carlo_figures() {
        let mut sims = BTreeMap::new();
        sims.insert(0, vec![-0.01, -0.02]);
        sims.insert(1, vec![-0.015, -0.01]);
        let mut sim_kcorrs = SimulatedSeries::new();
        sim_kcorrs.insert("B".to_string(), sims);
        let mut stats = BTreeMap::new();
        stats.insert(
            "B".to_string(),
            KcorrStats {
                times: vec![10.0, 12.0],
                mean: vec![-0.0125, -0.015],
                std: vec![0.0025, 0.005],
            },
        );

        let dir = std::env::temp_dir();
        let style = PlotStyle::default();
        plot_mc_kcorrs(&dir.join("snia_mc_kcorrs_test.svg"), &sim_kcorrs, &stats, &style).unwrap();
        let msg = plot_mc_kcorr_std(&dir.join("snia_mc_kcorr_std_test.svg"), &stats, &style).unwrap();
        assert!(msg.contains("std"));
    }
}
