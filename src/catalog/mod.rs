//! Component catalog.
//!
//! The catalog is the read-only database of parts the optimizers choose from:
//! power MOSFETs, magnetic cores (per kind, e.g. `inductor`, `transformer`),
//! capacitors (per kind, e.g. `buscaps`, `outcaps`) and heatsinks.
//!
//! Records are typed ([`Fet`], [`Core`], [`Capacitor`], [`Heatsink`]) with
//! documented defaults for every optional field, and are loaded once with
//! [`ComponentCatalog::from_dir`] or [`ComponentCatalog::from_bundle_str`].

mod filter;
mod loader;
mod records;

pub use filter::{filter_selected, shortlist_cores, shortlist_fets, CatalogEntry};
pub use loader::ComponentCatalog;
pub use records::{Capacitor, Core, Fet, Heatsink, LossCoefficients, DEFAULT_PART_COST, UNKNOWN_PART};

/// Core kind used for boost and resonant inductors.
pub const INDUCTOR_CORES: &str = "inductor";

/// Core kind used for transformers.
pub const TRANSFORMER_CORES: &str = "transformer";

/// Capacitor kind used for the PFC bulk bus.
pub const BUS_CAPACITORS: &str = "buscaps";

/// Capacitor kind used for the LLC output filter.
pub const OUTPUT_CAPACITORS: &str = "outcaps";

#[cfg(test)]
pub(crate) const DEMO_BUNDLE: &str = include_str!("../../data/demo_catalog.json");
