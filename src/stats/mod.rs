//! Statistical estimators used in Hubble-diagram analyses.
//!
//! - RMS / weighted RMS with analytic and bootstrap uncertainties (`rms`)
//! - intrinsic scatter maximum likelihood (`scatter`)
//! - line fitting with an outlier mixture model (`line`)

pub mod line;
pub mod rms;
pub mod scatter;

pub use line::*;
pub use rms::*;
pub use scatter::*;
