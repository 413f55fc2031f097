//! Per-band light-curve model evaluation.
//!
//! Models are implemented as small, pure functions over a fitted [`BandFit`]
//! so fitting, k-correction and plotting code can share them.
//!
//! [`BandFit`]: crate::domain::BandFit

pub mod model;

pub use model::*;
