//! Catalog loading from a directory of JSON files or a single JSON bundle.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::records::{Capacitor, Core, Fet, Heatsink};
use super::{BUS_CAPACITORS, INDUCTOR_CORES, OUTPUT_CAPACITORS, TRANSFORMER_CORES};
use crate::error::{ConvoptError, Result};

const FETS_FILE: &str = "fets.json";
const HEATSINKS_FILE: &str = "heatsinks.json";
const CORES_SUFFIX: &str = "_cores.json";

#[derive(Deserialize)]
struct FetFile {
    #[serde(default)]
    fets: Vec<Fet>,
}

#[derive(Deserialize)]
struct HeatsinkFile {
    #[serde(default)]
    heatsinks: Vec<Heatsink>,
}

#[derive(Deserialize)]
struct CoreFile {
    #[serde(default)]
    cores: Vec<Core>,
}

#[derive(Deserialize)]
struct CapacitorFile {
    #[serde(default)]
    capacitors: Vec<Capacitor>,
}

/// Whole catalog in one JSON document.
///
/// ```json
/// {
///   "fets": [...],
///   "heatsinks": [...],
///   "cores": {"inductor": [...], "transformer": [...]},
///   "capacitors": {"buscaps": [...], "outcaps": [...]}
/// }
/// ```
#[derive(Deserialize, Default)]
struct CatalogBundle {
    #[serde(default)]
    fets: Vec<Fet>,
    #[serde(default)]
    heatsinks: Vec<Heatsink>,
    #[serde(default)]
    cores: BTreeMap<String, Vec<Core>>,
    #[serde(default)]
    capacitors: BTreeMap<String, Vec<Capacitor>>,
}

/// Read-only component catalog.
///
/// Loaded once, then shared by reference between any number of optimizer runs.
#[derive(Debug, Clone, Default)]
pub struct ComponentCatalog {
    fets: Vec<Fet>,
    heatsinks: Vec<Heatsink>,
    cores: BTreeMap<String, Vec<Core>>,
    capacitors: BTreeMap<String, Vec<Capacitor>>,
}

impl ComponentCatalog {
    /// Empty catalog, to be filled with the `with_*` builders.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fets(mut self, fets: Vec<Fet>) -> Self {
        self.fets = fets;
        self
    }

    pub fn with_heatsinks(mut self, heatsinks: Vec<Heatsink>) -> Self {
        self.heatsinks = heatsinks;
        self
    }

    pub fn with_cores(mut self, kind: impl Into<String>, cores: Vec<Core>) -> Self {
        self.cores.insert(kind.into(), cores);
        self
    }

    pub fn with_capacitors(mut self, kind: impl Into<String>, capacitors: Vec<Capacitor>) -> Self {
        self.capacitors.insert(kind.into(), capacitors);
        self
    }

    /// Load every catalog file found in `dir`.
    ///
    /// * `fets.json` holds `{"fets": [...]}`
    /// * `heatsinks.json` holds `{"heatsinks": [...]}`
    /// * `<kind>_cores.json` holds `{"cores": [...]}`
    /// * any other `<kind>.json` holds `{"capacitors": [...]}`
    ///
    /// Missing FET or heatsink files yield empty lists.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(ConvoptError::CatalogDirMissing {
                path: dir.display().to_string(),
            });
        }

        let mut catalog = Self::new();

        catalog.fets = read_optional::<FetFile>(&dir.join(FETS_FILE))?
            .map(|f| f.fets)
            .unwrap_or_default();
        catalog.heatsinks = read_optional::<HeatsinkFile>(&dir.join(HEATSINKS_FILE))?
            .map(|f| f.heatsinks)
            .unwrap_or_default();

        let entries = fs::read_dir(dir).map_err(|e| ConvoptError::catalog_read(dir.display().to_string(), e))?;
        let mut files: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        for path in files {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if file_name == FETS_FILE || file_name == HEATSINKS_FILE {
                continue;
            }
            if let Some(kind) = file_name.strip_suffix(CORES_SUFFIX) {
                let file: CoreFile = read_json(&path)?;
                debug!(kind, count = file.cores.len(), "loaded cores");
                catalog.cores.insert(kind.to_string(), file.cores);
            } else if let Some(kind) = file_name.strip_suffix(".json") {
                let file: CapacitorFile = read_json(&path)?;
                debug!(kind, count = file.capacitors.len(), "loaded capacitors");
                catalog.capacitors.insert(kind.to_string(), file.capacitors);
            }
        }

        catalog.log_summary(&dir.display().to_string());
        Ok(catalog)
    }

    /// Load a catalog bundle from a JSON string.
    pub fn from_bundle_str(json: &str) -> Result<Self> {
        let bundle: CatalogBundle =
            serde_json::from_str(json).map_err(|e| ConvoptError::catalog_parse("<bundle>", e))?;
        let catalog = Self {
            fets: bundle.fets,
            heatsinks: bundle.heatsinks,
            cores: bundle.cores,
            capacitors: bundle.capacitors,
        };
        catalog.log_summary("<bundle>");
        Ok(catalog)
    }

    fn log_summary(&self, source: &str) {
        info!(
            source,
            fets = self.fets.len(),
            heatsinks = self.heatsinks.len(),
            core_kinds = self.cores.len(),
            capacitor_kinds = self.capacitors.len(),
            "component catalog loaded"
        );
        for kind in self.missing_kinds() {
            warn!(source, kind, "catalog has no parts of this kind");
        }
    }

    /// Core and capacitor kinds the optimizers draw from that this catalog lacks.
    pub fn missing_kinds(&self) -> Vec<&'static str> {
        let cores = [INDUCTOR_CORES, TRANSFORMER_CORES]
            .into_iter()
            .filter(|kind| !self.cores.contains_key(*kind));
        let capacitors = [BUS_CAPACITORS, OUTPUT_CAPACITORS]
            .into_iter()
            .filter(|kind| !self.capacitors.contains_key(*kind));
        cores.chain(capacitors).collect()
    }

    pub fn load_fets(&self) -> &[Fet] {
        &self.fets
    }

    pub fn load_heatsinks(&self) -> &[Heatsink] {
        &self.heatsinks
    }

    /// Cores of one kind (`"inductor"`, `"transformer"`, ...); empty when unknown.
    pub fn load_cores(&self, kind: &str) -> &[Core] {
        self.cores.get(kind).map(Vec::as_slice).unwrap_or_else(|| {
            debug!(kind, "no cores of this kind in catalog");
            &[]
        })
    }

    /// Capacitors of one kind (`"buscaps"`, `"outcaps"`, ...); empty when unknown.
    pub fn load_capacitors(&self, kind: &str) -> &[Capacitor] {
        self.capacitors.get(kind).map(Vec::as_slice).unwrap_or_else(|| {
            debug!(kind, "no capacitors of this kind in catalog");
            &[]
        })
    }

    /// FETs rated at least `v_dss_min` with `R_dson ≤ r_dson_max`, optionally
    /// from one manufacturer, ordered by ascending on-resistance.
    pub fn search_fets(&self, v_dss_min: f64, r_dson_max: f64, manufacturer: Option<&str>) -> Vec<&Fet> {
        let mut found: Vec<&Fet> = self
            .fets
            .iter()
            .filter(|f| f.v_dss >= v_dss_min && f.r_dson <= r_dson_max)
            .filter(|f| manufacturer.map_or(true, |m| f.manufacturer.eq_ignore_ascii_case(m)))
            .collect();
        found.sort_by(|a, b| a.r_dson.total_cmp(&b.r_dson));
        found
    }

    /// Case-insensitive lookup by part number.
    pub fn fet_by_part_number(&self, part_number: &str) -> Option<&Fet> {
        self.fets
            .iter()
            .find(|f| f.part_number.eq_ignore_ascii_case(part_number))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let name = path.display().to_string();
    let text = fs::read_to_string(path).map_err(|e| ConvoptError::catalog_read(name.clone(), e))?;
    serde_json::from_str(&text).map_err(|e| ConvoptError::catalog_parse(name, e))
}

fn read_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if path.is_file() {
        read_json(path).map(Some)
    } else {
        warn!(path = %path.display(), "catalog file missing, using empty list");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DEMO_BUNDLE;

    #[test]
    fn test_bundle_loading() {
        let catalog = ComponentCatalog::from_bundle_str(DEMO_BUNDLE).unwrap();
        assert!(!catalog.load_fets().is_empty());
        assert!(!catalog.load_cores("inductor").is_empty());
        assert!(!catalog.load_cores("transformer").is_empty());
        assert!(!catalog.load_capacitors("buscaps").is_empty());
        assert!(!catalog.load_heatsinks().is_empty());
        assert!(catalog.load_cores("amorphous").is_empty());
    }

    #[test]
    fn test_bad_bundle_is_an_error() {
        let err = ComponentCatalog::from_bundle_str("{\"fets\": 3}").unwrap_err();
        assert!(matches!(err, ConvoptError::CatalogParse { .. }));
    }

    #[test]
    fn test_from_dir() {
        let dir = std::env::temp_dir().join(format!("convopt_catalog_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("fets.json"), r#"{"fets": [{"part_number": "A", "V_dss": 650}]}"#).unwrap();
        fs::write(dir.join("inductor_cores.json"), r#"{"cores": [{"name": "PQ32/30", "Ae": 161}]}"#).unwrap();
        fs::write(dir.join("buscaps.json"), r#"{"capacitors": [{"name": "C1", "capacitance": 1e-4, "voltage": 500}]}"#).unwrap();

        let catalog = ComponentCatalog::from_dir(&dir).unwrap();
        fs::remove_dir_all(&dir).unwrap();

        assert_eq!(catalog.load_fets().len(), 1);
        assert!(catalog.load_heatsinks().is_empty());
        assert_eq!(catalog.load_cores("inductor")[0].name, "PQ32/30");
        assert_eq!(catalog.load_capacitors("buscaps")[0].voltage, 500.0);
    }

    #[test]
    fn test_missing_kinds() {
        let demo = ComponentCatalog::from_bundle_str(DEMO_BUNDLE).unwrap();
        assert!(demo.missing_kinds().is_empty());

        let partial = ComponentCatalog::new().with_capacitors("buscaps", Vec::new());
        assert_eq!(partial.missing_kinds(), vec!["inductor", "transformer", "outcaps"]);
        // Lookups of absent kinds stay quiet and empty
        assert!(partial.load_cores("inductor").is_empty());
        assert!(partial.load_capacitors("outcaps").is_empty());
    }

    #[test]
    fn test_missing_dir() {
        let err = ComponentCatalog::from_dir("/definitely/not/here").unwrap_err();
        assert!(matches!(err, ConvoptError::CatalogDirMissing { .. }));
    }

    #[test]
    fn test_search_fets() {
        let catalog = ComponentCatalog::new().with_fets(vec![
            Fet::new("HV-HIGH", 650.0, 0.20),
            Fet::new("HV-LOW", 650.0, 0.05),
            Fet::new("LV", 100.0, 0.003),
        ]);
        let found = catalog.search_fets(600.0, f64::INFINITY, None);
        let names: Vec<_> = found.iter().map(|f| f.part_number.as_str()).collect();
        assert_eq!(names, vec!["HV-LOW", "HV-HIGH"]);
        assert!(catalog.fet_by_part_number("lv").is_some());
        assert!(catalog.fet_by_part_number("nope").is_none());
    }
}
