//! Light-curve text files.
//!
//! Format (one light curve per file, `#` starts a comment):
//!
//! ```text
//! SN2011fe 0.000804 210.774 54.274
//! filter B
//! 55800.12 12.31 0.02
//! 55801.08 12.18 0.02
//! filter V
//! ...
//! ```
//!
//! The first data line holds `name z ra dec`; each `filter <band>` line opens a
//! band section of `time mag err` rows.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use log::warn;

use crate::domain::{BandData, LightCurve, Observation};
use crate::error::AppError;

/// Read a light curve from disk.
pub fn read_light_curve(path: &Path) -> Result<LightCurve, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::new(2, format!("Failed to read light curve '{}': {e}", path.display())))?;
    parse_light_curve(&text, &path.display().to_string())
}

/// Parse light-curve text. `source` only labels error messages.
pub fn parse_light_curve(text: &str, source: &str) -> Result<LightCurve, AppError> {
    let mut header: Option<(String, f64, f64, f64)> = None;
    let mut sections: Vec<(String, Vec<Observation>)> = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();

        if header.is_none() {
            if fields.len() < 4 {
                return Err(AppError::new(
                    2,
                    format!("{source}:{line_no}: expected header 'name z ra dec', got '{line}'."),
                ));
            }
            let z = parse_field(fields[1], source, line_no, "z")?;
            let ra = parse_field(fields[2], source, line_no, "ra")?;
            let dec = parse_field(fields[3], source, line_no, "dec")?;
            header = Some((fields[0].to_string(), z, ra, dec));
            continue;
        }

        if fields[0].eq_ignore_ascii_case("filter") {
            let Some(band) = fields.get(1) else {
                return Err(AppError::new(2, format!("{source}:{line_no}: 'filter' without a band name.")));
            };
            sections.push((band.to_string(), Vec::new()));
            continue;
        }

        let Some((_, points)) = sections.last_mut() else {
            return Err(AppError::new(
                2,
                format!("{source}:{line_no}: photometry before the first 'filter' line."),
            ));
        };
        if fields.len() < 3 {
            return Err(AppError::new(
                2,
                format!("{source}:{line_no}: expected 'time mag err', got '{line}'."),
            ));
        }
        let time = parse_field(fields[0], source, line_no, "time")?;
        let mag = parse_field(fields[1], source, line_no, "mag")?;
        let err = parse_field(fields[2], source, line_no, "err")?;
        if err <= 0.0 {
            return Err(AppError::new(
                2,
                format!("{source}:{line_no}: magnitude error must be > 0 (got {err})."),
            ));
        }
        points.push(Observation { time, mag, err });
    }

    let Some((name, z, ra, dec)) = header else {
        return Err(AppError::new(3, format!("{source}: empty light-curve file.")));
    };

    let mut bands: Vec<BandData> = Vec::new();
    for (band, points) in sections {
        if points.is_empty() {
            warn!("{source}: band {band} has no photometry; skipped");
            continue;
        }
        match bands.iter_mut().find(|b| b.name == band) {
            Some(existing) => {
                let mut merged = existing.points.clone();
                merged.extend(points);
                *existing = BandData::new(band, merged);
            }
            None => bands.push(BandData::new(band, points)),
        }
    }
    if bands.is_empty() {
        return Err(AppError::new(3, format!("{source}: no photometry found.")));
    }

    Ok(LightCurve {
        name,
        z,
        ra,
        dec,
        bands,
        rest_bands: BTreeMap::new(),
    })
}

/// Render a light curve in the same text format.
pub fn format_light_curve(lc: &LightCurve) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {} {} {}", lc.name, lc.z, lc.ra, lc.dec);
    for band in &lc.bands {
        let _ = writeln!(out, "filter {}", band.name);
        for p in &band.points {
            let _ = writeln!(out, "{} {} {}", p.time, p.mag, p.err);
        }
    }
    out
}

pub fn write_light_curve(path: &Path, lc: &LightCurve) -> Result<(), AppError> {
    fs::write(path, format_light_curve(lc))
        .map_err(|e| AppError::new(2, format!("Failed to write light curve '{}': {e}", path.display())))
}

fn parse_field(s: &str, source: &str, line_no: usize, what: &str) -> Result<f64, AppError> {
    let v: f64 = s
        .parse()
        .map_err(|_| AppError::new(2, format!("{source}:{line_no}: invalid {what} '{s}'.")))?;
    if !v.is_finite() {
        return Err(AppError::new(2, format!("{source}:{line_no}: {what} is not finite.")));
    }
    Ok(v)
}
