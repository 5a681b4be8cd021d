//! Physics models for converter design.
//!
//! Every model here is a set of pure functions over SI quantities. They never
//! fail: arithmetic edge cases (zero loads, zero frequencies, logs of
//! non-positive values) degrade to the bounded values documented on each
//! function, and the optimizers reject or sanitize whatever is left.
//!
//! - [`resonant`]: LLC tank design and first-harmonic gain
//! - [`output_stage`]: loss-corrected turns ratio and load
//! - [`parallel`]: currents with transformers in parallel
//! - [`frequency_range`]: analytic normalized switching-frequency range
//! - [`semiconductor`]: FET and diode losses, ZVS and dead time
//! - [`magnetics`]: windings, turns, area product, inductor/transformer design
//! - [`core_loss`]: data-driven core-loss law selection
//! - [`capacitor`]: capacitance requirement and bank selection
//! - [`thermal`]: heatsink requirement and selection
//! - [`waveform`]: report waveforms

pub mod capacitor;
pub mod core_loss;
pub mod frequency_range;
pub mod magnetics;
pub mod output_stage;
pub mod parallel;
pub mod resonant;
pub mod semiconductor;
pub mod thermal;
pub mod waveform;

pub use core_loss::CoreLossLaw;
pub use output_stage::OutputStage;
pub use resonant::{design_resonant_tank, TankDesign};
