//! JSON read/write for fit results and Monte Carlo outputs.
//!
//! - `<stem>_Fit.json`: the complete `LcFitResult`
//! - `<stem>_MC_*.json`: simulated magnitudes / k-corrections keyed by band
//!   and simulation index, and per-epoch k-correction statistics

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::LcFitResult;
use crate::error::AppError;

/// Write any serializable value as pretty JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .map_err(|e| AppError::new(2, format!("Failed to write JSON '{}': {e}", path.display())))?;
    Ok(())
}

/// Read a JSON file into `T`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(std::io::BufReader::new(file))
        .map_err(|e| AppError::new(2, format!("Invalid JSON '{}': {e}", path.display())))
}

pub fn write_fit_json(path: &Path, fit: &LcFitResult) -> Result<(), AppError> {
    write_json(path, fit)
}

pub fn read_fit_json(path: &Path) -> Result<LcFitResult, AppError> {
    read_json(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SimulatedSeries;
    use std::collections::BTreeMap;

    #[test]
    fn simulated_kcorrections_round_trip_bit_exact() {
        let mut by_sim = BTreeMap::new();
        by_sim.insert(0usize, vec![-0.123_456_789_012_345_67, 0.1 + 0.2, 1e-17]);
        by_sim.insert(12usize, vec![std::f64::consts::PI, -2.5 * 1.0001_f64.log10()]);
        let mut series: SimulatedSeries = BTreeMap::new();
        series.insert("B".to_string(), by_sim);

        let path = std::env::temp_dir().join("snia_json_roundtrip_test.json");
        write_json(&path, &series).unwrap();
        let back: SimulatedSeries = read_json(&path).unwrap();

        for (band, sims) in &series {
            for (idx, values) in sims {
                let got = &back[band][idx];
                assert_eq!(values.len(), got.len());
                for (a, b) in values.iter().zip(got) {
                    assert_eq!(a.to_bits(), b.to_bits());
                }
            }
        }
    }
}
