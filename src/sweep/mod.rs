//! Design-space axes.
//!
//! Every tunable quantity of a converter design (quality factor, inductance
//! ratio, switching frequency, boost inductance, ...) is described by a
//! [`SweepSpec`]: either one fixed value or a closed arithmetic progression.
//! The optimizers turn those specs into value lists with [`generate`] and walk
//! their Cartesian product lazily through [`product`].

mod product;
mod range;

pub use product::product;
pub use range::{generate, SweepMode, SweepSpec};

/// Relative slack applied when counting swept points, so that a step landing
/// exactly on `max` after floating-point accumulation still includes it.
pub const AXIS_TOLERANCE: f64 = 1e-9;

/// Upper bound on the number of points a single swept axis may produce.
pub const MAX_AXIS_POINTS: usize = 100_000;
