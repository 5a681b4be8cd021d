//! # Convopt Core
//!
//! A design-space optimizer for two power-converter topologies:
//!
//! - the full-bridge **LLC resonant** DC/DC converter with synchronous
//!   rectification, optionally with several transformers in parallel;
//! - the continuous-conduction **boost PFC** front end.
//!
//! Given an operating envelope, objective weights and a component catalog,
//! an optimizer sweeps the design parameters, evaluates every candidate with
//! closed-form loss, magnetics and thermal models, and reports the best
//! design as a flat result map together with representative waveforms.
//!
//! ## Architecture
//!
//! - [`input`] - Typed design requests built from flat request maps
//! - [`sweep`] - Fixed/swept parameter axes and lazy Cartesian products
//! - [`catalog`] - FET, core, capacitor and heatsink records and their loader
//! - [`models`] - Resonant tank, semiconductor, magnetic, capacitor and thermal models
//! - [`solver`] - Bracketed root finding and closed-form polynomial roots
//! - [`optimizer`] - Per-topology search and report formatting
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! convopt llc --catalog ./catalog --request request.json --pretty > report.json
//! ```
//!
//! ### Library
//!
//! ```no_run
//! use convopt_core::{ComponentCatalog, LlcOptimizer, LlcRequest};
//!
//! let catalog = ComponentCatalog::from_dir("./catalog")?;
//! let request = LlcRequest::from_value(&serde_json::json!({"outPow": 300}))?;
//! let outcome = LlcOptimizer::new(&catalog).run(&request);
//! println!("{}", serde_json::to_string_pretty(&outcome).unwrap_or_default());
//! # Ok::<(), convopt_core::ConvoptError>(())
//! ```
//!
//! ### WASM
//!
//! ```javascript
//! import { WasmOptimizer } from 'convopt_core';
//!
//! const optimizer = new WasmOptimizer(catalogJson);
//! const outcome = JSON.parse(optimizer.optimize('pfc', requestJson));
//! ```
//!
//! ## Search Method
//!
//! Each optimizer walks the Cartesian product of its swept axes and catalog
//! shortlists. Candidates failing a feasibility check (voltage rating, gain
//! window, saturation, turn count, minimum efficiency) are counted per reason
//! and skipped. Survivors are scored with
//! `w_η·(100 − η) + w_V·V/10⁴ + w_$·cost/10` and the lowest score wins, the
//! first one visited on ties.

pub mod catalog;
pub mod error;
pub mod input;
pub mod models;
pub mod optimizer;
pub mod solver;
pub mod sweep;

// Re-export main types for convenience
pub use catalog::ComponentCatalog;
pub use error::{ConvoptError, Result};
pub use input::{LlcRequest, PfcRequest};
pub use optimizer::{DesignReport, InfeasiblePolicy, LlcOptimizer, OptimizerConfig, Outcome, PfcOptimizer};

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::WasmOptimizer;

/// Vacuum permeability (H/m)
pub const MU_0: f64 = 4.0 * std::f64::consts::PI * 1e-7;

/// Electrical conductivity of copper at 20 °C (S/m)
pub const COPPER_CONDUCTIVITY: f64 = 5.96e7;

/// Resistivity of copper at [`REFERENCE_TEMPERATURE`] (Ω·m)
pub const COPPER_RESISTIVITY: f64 = 1.72e-8;

/// Temperature coefficient of copper resistivity (1/°C)
pub const COPPER_TEMPERATURE_COEFFICIENT: f64 = 0.00393;

/// Temperature at which catalog resistances are specified (°C)
pub const REFERENCE_TEMPERATURE: f64 = 25.0;
