//! Whitespace-separated column files.
//!
//! Used for template photometry (fixed header length, fixed column indices)
//! and for the numeric inputs of the CLI.

use std::fs;
use std::path::Path;

use crate::domain::Observation;
use crate::error::AppError;

/// Header lines in template photometry files.
pub const TEMPLATE_HEADER_LINES: usize = 9;
/// Phase, apparent magnitude and error columns in template photometry files.
pub const TEMPLATE_COLUMNS: [usize; 3] = [0, 3, 4];

/// Read the selected columns after skipping `skip_header` lines.
///
/// Blank lines and `#` comments after the header are ignored. Returns one
/// vector per entry of `usecols`, in that order.
pub fn read_columns(path: &Path, skip_header: usize, usecols: &[usize]) -> Result<Vec<Vec<f64>>, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::new(2, format!("Failed to read '{}': {e}", path.display())))?;
    parse_columns(&text, skip_header, usecols, &path.display().to_string())
}

pub fn parse_columns(
    text: &str,
    skip_header: usize,
    usecols: &[usize],
    source: &str,
) -> Result<Vec<Vec<f64>>, AppError> {
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); usecols.len()];

    for (idx, raw) in text.lines().enumerate().skip(skip_header) {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        for (slot, &col) in usecols.iter().enumerate() {
            let Some(field) = fields.get(col) else {
                return Err(AppError::new(
                    2,
                    format!("{source}:{}: missing column {col}.", idx + 1),
                ));
            };
            let v: f64 = field.parse().map_err(|_| {
                AppError::new(2, format!("{source}:{}: invalid number '{field}' in column {col}.", idx + 1))
            })?;
            columns[slot].push(v);
        }
    }

    if columns.first().is_some_and(|c| c.is_empty()) {
        return Err(AppError::new(3, format!("{source}: no data rows.")));
    }
    Ok(columns)
}

/// Photometry of one supernova from a template directory, shifted by its
/// apparent magnitude so all light curves share a zero point.
pub fn read_template_photometry(dir: &Path, sn: &str, app_mag: f64) -> Result<Vec<Observation>, AppError> {
    let path = dir.join(format!("{sn}.txt"));
    let cols = read_columns(&path, TEMPLATE_HEADER_LINES, &TEMPLATE_COLUMNS)?;
    Ok(cols[0]
        .iter()
        .zip(&cols[1])
        .zip(&cols[2])
        .map(|((&time, &mag), &err)| Observation {
            time,
            mag: mag - app_mag,
            err,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_header_and_selects_columns() {
        let mut text = String::new();
        for i in 0..TEMPLATE_HEADER_LINES {
            text.push_str(&format!("# header {i}\n"));
        }
        text.push_str("-5.0 x x 15.2 0.05\n");
        text.push_str("\n0.0 x x 14.9 0.04\n");

        let cols = parse_columns(&text, TEMPLATE_HEADER_LINES, &TEMPLATE_COLUMNS, "t").unwrap();
        assert_eq!(cols[0], vec![-5.0, 0.0]);
        assert_eq!(cols[1], vec![15.2, 14.9]);
        assert_eq!(cols[2], vec![0.05, 0.04]);
    }

    #[test]
    fn template_photometry_is_shifted() {
        let dir = std::env::temp_dir().join("snia_columns_test");
        std::fs::create_dir_all(&dir).unwrap();
        let mut text = "h\n".repeat(TEMPLATE_HEADER_LINES);
        text.push_str("1.0 0 0 16.0 0.1\n");
        std::fs::write(dir.join("sn2005el.txt"), text).unwrap();

        let obs = read_template_photometry(&dir, "sn2005el", 15.5).unwrap();
        assert_eq!(obs.len(), 1);
        assert!((obs[0].mag - 0.5).abs() < 1e-12);
    }

    #[test]
    fn missing_column_is_an_error() {
        let err = parse_columns("1 2\n", 0, &[0, 3], "t").unwrap_err();
        assert!(err.message().contains("missing column 3"));
    }
}
