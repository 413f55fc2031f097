//! Reporting utilities: fit summaries, residual tables and plot annotations.
//!
//! Formatting lives here so the fitting code stays free of presentation.

pub mod format;

pub use format::*;
