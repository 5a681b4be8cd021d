//! Design request intake.
//!
//! Requests are flat JSON objects produced by a form-based front end. This
//! module turns them into typed [`LlcRequest`] / [`PfcRequest`] values without
//! ever failing on a malformed number: see [`coerce`] for the coercion rules.

pub mod coerce;
mod request;

pub use coerce::{coerce_f64, parse_number, Fields};
pub use request::{
    resolve_axis, DesignSpec, Envelope, LlcRequest, ObjectiveWeights, PfcRequest, Selection,
};
