//! Cosmological distances for a flat FLRW universe with a constant
//! dark-energy equation of state.
//!
//! - luminosity distance and distance modulus (`distance`)
//! - distance-modulus uncertainties from peculiar velocities (`uncertainty`)

pub mod distance;
pub mod uncertainty;

pub use distance::*;
pub use uncertainty::*;

/// Speed of light in km/s.
pub const SPEED_OF_LIGHT_KMS: f64 = 299_792.458;
