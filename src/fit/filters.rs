//! Approximate filter passbands.
//!
//! Effective wavelengths and widths (Å) are enough for power-law colour
//! k-corrections and for sketching the filter set; they are not transmission
//! curves.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterInfo {
    pub name: &'static str,
    pub lambda_eff: f64,
    pub fwhm: f64,
}

const FILTERS: &[FilterInfo] = &[
    FilterInfo { name: "U", lambda_eff: 3600.0, fwhm: 600.0 },
    FilterInfo { name: "B", lambda_eff: 4380.0, fwhm: 980.0 },
    FilterInfo { name: "V", lambda_eff: 5450.0, fwhm: 850.0 },
    FilterInfo { name: "R", lambda_eff: 6410.0, fwhm: 1500.0 },
    FilterInfo { name: "I", lambda_eff: 7980.0, fwhm: 1500.0 },
    FilterInfo { name: "u", lambda_eff: 3560.0, fwhm: 560.0 },
    FilterInfo { name: "g", lambda_eff: 4830.0, fwhm: 1380.0 },
    FilterInfo { name: "r", lambda_eff: 6260.0, fwhm: 1380.0 },
    FilterInfo { name: "i", lambda_eff: 7670.0, fwhm: 1530.0 },
    FilterInfo { name: "z", lambda_eff: 9100.0, fwhm: 950.0 },
    FilterInfo { name: "Y", lambda_eff: 10350.0, fwhm: 1000.0 },
    FilterInfo { name: "J", lambda_eff: 12350.0, fwhm: 1620.0 },
    FilterInfo { name: "H", lambda_eff: 16620.0, fwhm: 2510.0 },
    FilterInfo { name: "K", lambda_eff: 21590.0, fwhm: 2620.0 },
    FilterInfo { name: "Ks", lambda_eff: 21590.0, fwhm: 2620.0 },
    FilterInfo { name: "f110w", lambda_eff: 11534.0, fwhm: 4430.0 },
    FilterInfo { name: "f125w", lambda_eff: 12486.0, fwhm: 2845.0 },
    FilterInfo { name: "f160w", lambda_eff: 15369.0, fwhm: 2683.0 },
];

/// Look up a filter by name.
///
/// Survey-specific variants (`Bs`, `Jrc2`, `Ydw`, ...) fall back to the
/// filter named by their first letter.
pub fn lookup_filter(name: &str) -> Option<FilterInfo> {
    if let Some(f) = FILTERS.iter().find(|f| f.name == name) {
        return Some(*f);
    }
    let first = name.get(..1)?;
    FILTERS.iter().find(|f| f.name == first).copied()
}
