//! Light-curve fitting.
//!
//! Responsibilities:
//!
//! - fit per-band models and derive `Tmax`, `Δm15` and the distance modulus
//! - compute power-law k-corrections from model colours
//! - estimate k-correction uncertainties by Monte Carlo refits (parallel)

pub mod filters;
pub mod fitter;
pub mod kcorr;
pub mod montecarlo;

pub use filters::*;
pub use fitter::*;
pub use kcorr::*;
pub use montecarlo::*;
