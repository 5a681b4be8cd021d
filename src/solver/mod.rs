//! Scalar numerical solvers.
//!
//! The converter models are closed-form except in two places:
//!
//! - finding the switching frequency at which the first-harmonic gain curve
//!   reaches a target gain, solved with the bracketed [`RootFinder`] (Brent's
//!   method);
//! - the analytic normalized frequency range, a sextic in `F` that is a cubic
//!   in `F²`, solved in closed form by [`real_cubic_roots`].
//!
//! Both are total: they return `None` / an empty list instead of failing, and
//! the callers substitute documented defaults.

mod brent;
mod cubic;

pub use brent::RootFinder;
pub use cubic::{real_cubic_roots, real_quadratic_roots};

/// Absolute x-tolerance of the bracketed root finder.
pub const ROOT_TOLERANCE: f64 = 2e-12;

/// Maximum Brent iterations per root.
pub const MAX_ROOT_ITERATIONS: usize = 100;

/// Coefficients smaller than this are treated as zero by the polynomial solvers.
pub const COEFFICIENT_EPSILON: f64 = 1e-14;
