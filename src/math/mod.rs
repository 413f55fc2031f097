//! Numerical building blocks: quadrature, simplex minimization, weighted least
//! squares and polynomial helpers.

pub mod ols;
pub mod poly;
pub mod quadrature;
pub mod simplex;

pub use ols::*;
pub use poly::*;
pub use quadrature::*;
pub use simplex::*;
