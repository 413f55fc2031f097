//! Input/output helpers.
//!
//! - light-curve text read/write (`lightcurve`)
//! - whitespace column files and template photometry (`columns`)
//! - fit and Monte Carlo JSON (`json`)
//! - fit summaries with metadata footer (`summary`)

pub mod columns;
pub mod json;
pub mod lightcurve;
pub mod summary;

pub use columns::*;
pub use json::*;
pub use lightcurve::*;
pub use summary::*;
