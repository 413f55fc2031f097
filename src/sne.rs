//! Small helpers for supernova bookkeeping.
//!
//! Gaussian-process light-curve templates are stored on a half-day grid whose
//! index 70 corresponds to phase 0.

/// Grid index of phase 0.
pub const PHASE_ZERO_INDEX: i64 = 70;

/// Phase in days for a template-grid index.
pub fn index_to_day(index: i64) -> f64 {
    (index - PHASE_ZERO_INDEX) as f64 / 2.0
}

/// Template-grid index for a phase in days (truncated toward zero).
pub fn day_to_index(day: f64) -> i64 {
    (2.0 * day + PHASE_ZERO_INDEX as f64) as i64
}

/// Extract the supernova name from a data file name.
///
/// - `sn2011B_...`          -> `sn2011B`
/// - `snf20080514-002_...`  -> `snf20080514-002`
/// - `sn1998bu_...`         -> `sn1998bu`
///
/// Returns `None` when the file name is too short to tell.
pub fn sn_name(filename: &str) -> Option<&str> {
    let bytes = filename.as_bytes();
    let eighth = *bytes.get(7)?;
    let len = if eighth == b'_' {
        7
    } else if eighth.is_ascii_digit() {
        15
    } else {
        8
    };
    filename.get(..len.min(filename.len()))
}
