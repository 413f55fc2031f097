//! Fit summary text files with a metadata footer.
//!
//! `<stem>_SummaryFit_.txt` holds the human-readable fit summary followed by a
//! commented footer recording how the fit was made and by whom.

use std::path::Path;

use chrono::{DateTime, Local};

use crate::error::AppError;

/// Author written in the footer when `SNIA_AUTHOR` is not set.
pub const DEFAULT_AUTHOR: &str = "unknown";

/// Provenance recorded under the summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryMeta {
    pub model: String,
    pub specified_bands: Vec<String>,
    pub fitted_bands: Vec<String>,
    /// Observer band -> rest-frame band remappings that were requested.
    pub rest_matches: Vec<(String, String)>,
    pub apply_kcorr: bool,
    pub mangled_kcorr: bool,
    pub h0: f64,
    pub author: String,
    pub script_name: String,
    pub script_version: String,
}

/// `#` followed by dashes, 60 characters in total, ending in "60".
pub fn separator_line() -> String {
    format!("#{}60", "-".repeat(57))
}

fn quoted_list(items: &[String]) -> String {
    let inner: Vec<String> = items.iter().map(|s| format!("'{s}'")).collect();
    format!("[{}]", inner.join(", "))
}

fn match_list(pairs: &[(String, String)]) -> String {
    let inner: Vec<String> = pairs
        .iter()
        .map(|(obs, rest)| format!("('{obs}', '{rest}')"))
        .collect();
    format!("[{}]", inner.join(", "))
}

/// Format the footer with an explicit timestamp.
pub fn format_footer(meta: &SummaryMeta, now: DateTime<Local>) -> String {
    let sep = separator_line();
    let mut out = String::new();
    out.push_str(&format!("{sep}\n"));
    out.push_str(&format!("# Model used to fit: {}\n", meta.model));
    out.push_str(&format!("# Specified bands to fit: {}\n", quoted_list(&meta.specified_bands)));
    out.push_str(&format!("# Fitted bands: {}\n", quoted_list(&meta.fitted_bands)));
    out.push_str(&format!(
        "# Specified match among observed to restframe bands: {}\n",
        match_list(&meta.rest_matches)
    ));
    out.push_str(&format!("# apply_kcorr = {}\n", meta.apply_kcorr));
    out.push_str(&format!("# mangled_kcorr = {}\n", meta.mangled_kcorr));
    out.push_str(&format!("# Ho_value = {:?}\n", meta.h0));
    out.push_str(&format!("{sep}\n"));
    out.push_str(&format!("# Data table created by: {}\n", meta.author));
    out.push_str(&format!(
        "# On date: {} (yyyy.mm.dd); {} hrs.\n",
        now.format("%Y.%m.%d"),
        now.format("%H:%M")
    ));
    out.push_str(&format!(
        "# Script used: {} (version {})\n",
        meta.script_name, meta.script_version
    ));
    out
}

/// Write `body` followed by the footer stamped with the current local time.
pub fn write_summary(path: &Path, body: &str, meta: &SummaryMeta) -> Result<(), AppError> {
    let mut text = body.to_string();
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text.push_str(&format_footer(meta, Local::now()));
    std::fs::write(path, text)
        .map_err(|e| AppError::new(2, format!("Failed to write summary '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn meta() -> SummaryMeta {
        SummaryMeta {
            model: "poly4".to_string(),
            specified_bands: vec!["B".to_string(), "V".to_string()],
            fitted_bands: vec!["B".to_string()],
            rest_matches: vec![("V".to_string(), "Y".to_string())],
            apply_kcorr: true,
            mangled_kcorr: false,
            h0: 72.0,
            author: "A. Observer".to_string(),
            script_name: "snia".to_string(),
            script_version: "0.1.0".to_string(),
        }
    }

    #[test]
    fn separator_is_sixty_characters() {
        let sep = separator_line();
        assert_eq!(sep.len(), 60);
        assert!(sep.starts_with("#-") && sep.ends_with("-60"));
    }

    #[test]
    fn footer_layout() {
        let now = Local.with_ymd_and_hms(2024, 3, 5, 9, 7, 0).unwrap();
        let footer = format_footer(&meta(), now);
        let lines: Vec<&str> = footer.lines().collect();
        assert_eq!(lines.len(), 12);
        assert_eq!(lines[0], separator_line());
        assert_eq!(lines[2], "# Specified bands to fit: ['B', 'V']");
        assert_eq!(lines[4], "# Specified match among observed to restframe bands: [('V', 'Y')]");
        assert_eq!(lines[6], "# mangled_kcorr = false");
        assert_eq!(lines[7], "# Ho_value = 72.0");
        assert_eq!(lines[10], "# On date: 2024.03.05 (yyyy.mm.dd); 09:07 hrs.");
        assert_eq!(lines[11], "# Script used: snia (version 0.1.0)");

        let meta = SummaryMeta { h0: 70.5, ..meta() };
        assert!(format_footer(&meta, now).contains("# Ho_value = 70.5\n"));
    }

    #[test]
    fn summary_file_ends_with_footer() {
        let path = std::env::temp_dir().join("snia_summary_test.txt");
        write_summary(&path, "Tmax = 100.0", &meta()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Tmax = 100.0\n#---"));
        assert!(text.contains("# Data table created by: A. Observer"));
    }
}
