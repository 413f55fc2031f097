//! Domain types used throughout the toolbox.
//!
//! This module defines:
//!
//! - photometry containers (`Observation`, `BandData`, `LightCurve`)
//! - Hubble residual sets (`HubbleResiduals`)
//! - fit outputs (`BandFit`, `KcorrCurve`, `LcFitResult`, `KcorrStats`)

pub mod types;

pub use types::*;
