//! Numerical utilities: the domain-guarded cubic spline and paired-sample
//! regression.

pub mod regression;
pub mod spline;

pub use regression::*;
pub use spline::*;
