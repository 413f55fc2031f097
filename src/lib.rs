//! `snia-toolbox` library crate.
//!
//! Numerical helpers for type Ia supernova cosmology: distance moduli, RMS and
//! intrinsic-scatter estimators, outlier-robust line fits, light-curve fitting
//! with k-corrections, and SVG figures.
//!
//! The binary (`snia`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - analysis scripts can call the estimators directly

pub mod app;
pub mod cli;
pub mod cosmology;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod sne;
pub mod stats;
