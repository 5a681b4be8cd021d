//! WASM bindings for Convopt Core.
//!
//! This module exposes the optimizers to a browser front end. Catalogs and
//! requests cross the boundary as JSON strings, and outcomes come back the
//! same way.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmOptimizer } from 'convopt_core';
//!
//! await init();
//!
//! const optimizer = new WasmOptimizer(JSON.stringify(catalogBundle));
//! optimizer.set_fallback(true);
//!
//! const outcome = JSON.parse(optimizer.optimize('llc', JSON.stringify({
//!   outPow: 300,
//!   V_input_min: 370, V_input_nom: 400, V_input_max: 430,
//!   V_output_min: 24, V_output_nom: 24, V_output_max: 24,
//! })));
//! console.log(outcome.status, outcome.BestTotalEfficiency ?? outcome.design?.BestTotalEfficiency);
//! ```

use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::catalog::ComponentCatalog;
use crate::error::{ConvoptError, Result};
use crate::input::{LlcRequest, PfcRequest};
use crate::optimizer::{InfeasiblePolicy, LlcOptimizer, OptimizerConfig, Outcome, PfcOptimizer};

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn to_js(error: ConvoptError) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// WASM-compatible converter design optimizer.
///
/// Holds one parsed catalog bundle and runs either topology against it.
#[wasm_bindgen]
pub struct WasmOptimizer {
    catalog: ComponentCatalog,
    config: OptimizerConfig,
}

#[wasm_bindgen]
impl WasmOptimizer {
    /// Create an optimizer from a catalog bundle.
    ///
    /// # Arguments
    /// * `catalog_json` - `{"fets": [...], "heatsinks": [...], "cores": {kind: [...]}, "capacitors": {kind: [...]}}`
    #[wasm_bindgen(constructor)]
    pub fn new(catalog_json: &str) -> std::result::Result<WasmOptimizer, JsValue> {
        let catalog = ComponentCatalog::from_bundle_str(catalog_json).map_err(to_js)?;
        Ok(WasmOptimizer {
            catalog,
            config: OptimizerConfig::new(),
        })
    }

    /// Return the fallback design instead of bare statistics when nothing is feasible.
    #[wasm_bindgen]
    pub fn set_fallback(&mut self, enabled: bool) {
        let policy = if enabled {
            InfeasiblePolicy::Fallback
        } else {
            InfeasiblePolicy::Report
        };
        self.config = self.config.with_policy(policy);
    }

    #[wasm_bindgen]
    pub fn set_shortlist(&mut self, shortlist: usize) {
        self.config = self.config.with_shortlist(shortlist);
    }

    #[wasm_bindgen]
    pub fn set_min_efficiency(&mut self, percent: f64) {
        self.config = self.config.with_min_efficiency(percent);
    }

    /// Run one optimization.
    ///
    /// # Arguments
    /// * `topology` - `"llc"` or `"pfc"`
    /// * `request_json` - flat request object
    ///
    /// # Returns
    /// The serialized outcome; `status` is `found`, `infeasible` or `fallback`.
    #[wasm_bindgen]
    pub fn optimize(&self, topology: &str, request_json: &str) -> std::result::Result<String, JsValue> {
        self.run(topology, request_json)
            .and_then(|outcome| serde_json::to_string(&outcome).map_err(|source| ConvoptError::ReportSerialize { source }))
            .map_err(to_js)
    }

    /// Number of FETs in the loaded catalog.
    #[wasm_bindgen(getter)]
    pub fn fet_count(&self) -> usize {
        self.catalog.load_fets().len()
    }
}

impl WasmOptimizer {
    fn run(&self, topology: &str, request_json: &str) -> Result<Outcome> {
        let request: Value = serde_json::from_str(request_json).map_err(|e| ConvoptError::WasmError {
            message: format!("request is not valid JSON: {e}"),
        })?;
        match topology.to_ascii_lowercase().as_str() {
            "llc" => Ok(LlcOptimizer::new(&self.catalog)
                .with_config(self.config)
                .run(&LlcRequest::from_value(&request)?)),
            "pfc" => Ok(PfcOptimizer::new(&self.catalog)
                .with_config(self.config)
                .run(&PfcRequest::from_value(&request)?)),
            _ => Err(ConvoptError::UnknownTopology {
                name: topology.to_string(),
            }),
        }
    }
}
