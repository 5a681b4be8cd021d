//! Typed design requests built from flat request maps.
//!
//! Field names and units follow the request layer: frequencies in kHz,
//! inductances in µH, current density in A/mm², weights and efficiencies in
//! percent. Everything is converted to SI here, once.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::coerce::Fields;
use crate::error::{ConvoptError, Result};
use crate::sweep::{SweepMode, SweepSpec};

/// Component names a user picked for one catalog kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub names: Vec<String>,
    pub select_all: bool,
}

impl Selection {
    /// Select the whole catalog.
    pub fn all() -> Self {
        Self {
            names: Vec::new(),
            select_all: true,
        }
    }

    /// Select the named parts only.
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            select_all: false,
        }
    }

    /// True when the selection does not restrict the catalog.
    pub fn is_unrestricted(&self) -> bool {
        self.select_all || self.names.is_empty()
    }

    /// Case-insensitive membership test against any of the given labels.
    pub fn matches<'a>(&self, labels: impl IntoIterator<Item = &'a str>) -> bool {
        let labels: Vec<&str> = labels.into_iter().collect();
        self.names
            .iter()
            .any(|n| labels.iter().any(|l| l.eq_ignore_ascii_case(n)))
    }

    fn read(fields: &Fields<'_>, key: &str, all_flag: Option<&str>, default: &[&str]) -> Self {
        let select_all = all_flag.is_some_and(|flag| fields.flag(flag));
        let names = fields
            .names(key)
            .unwrap_or_else(|| default.iter().map(|s| s.to_string()).collect());
        Self { names, select_all }
    }
}

/// Electrical operating envelope shared by both topologies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub v_in_min: f64,
    pub v_in_nom: f64,
    pub v_in_max: f64,
    pub v_out_min: f64,
    pub v_out_nom: f64,
    pub v_out_max: f64,
    pub p_out: f64,
    pub t_amb: f64,
}

impl Envelope {
    /// Reorder min/nominal/max so that `min ≤ nom ≤ max` holds for both ports.
    pub fn ordered(self) -> Self {
        let [v_in_min, v_in_nom, v_in_max] = sorted3([self.v_in_min, self.v_in_nom, self.v_in_max]);
        let [v_out_min, v_out_nom, v_out_max] =
            sorted3([self.v_out_min, self.v_out_nom, self.v_out_max]);
        if v_in_min != self.v_in_min || v_out_min != self.v_out_min || v_in_max != self.v_in_max || v_out_max != self.v_out_max {
            warn!("voltage envelope was not ordered min <= nom <= max, reordered");
        }
        Self {
            v_in_min,
            v_in_nom,
            v_in_max,
            v_out_min,
            v_out_nom,
            v_out_max,
            ..self
        }
    }

    /// Nominal output current.
    pub fn i_out(&self) -> f64 {
        if self.v_out_nom > 0.0 {
            self.p_out / self.v_out_nom
        } else {
            0.0
        }
    }
}

fn sorted3(mut v: [f64; 3]) -> [f64; 3] {
    v.sort_by(f64::total_cmp);
    v
}

/// Relative importance of the three objectives, normalized to sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveWeights {
    pub efficiency: f64,
    pub volume: f64,
    pub cost: f64,
}

impl ObjectiveWeights {
    pub fn new(efficiency: f64, volume: f64, cost: f64) -> Self {
        Self {
            efficiency,
            volume,
            cost,
        }
    }

    /// Clamp negatives to zero and scale to unit sum; an all-zero set becomes `fallback`.
    pub fn normalized(self, fallback: ObjectiveWeights) -> Self {
        let e = self.efficiency.max(0.0);
        let v = self.volume.max(0.0);
        let c = self.cost.max(0.0);
        let sum = e + v + c;
        if sum > 0.0 && sum.is_finite() {
            Self::new(e / sum, v / sum, c / sum)
        } else if fallback != self {
            fallback.normalized(fallback)
        } else {
            Self::new(1.0, 0.0, 0.0)
        }
    }
}

/// Envelope plus objectives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesignSpec {
    pub envelope: Envelope,
    pub weights: ObjectiveWeights,
}

/// Collapse an empty swept axis onto its fixed value.
pub fn resolve_axis(name: &str, spec: SweepSpec) -> SweepSpec {
    if spec.is_empty() {
        warn!(
            axis = name,
            min = spec.min,
            max = spec.max,
            fallback = spec.fixed,
            "swept axis produced no values, using fixed value"
        );
        SweepSpec::fixed(spec.fixed)
    } else {
        spec
    }
}

fn read_sweep(fields: &Fields<'_>, keys: [&str; 5], defaults: [f64; 5]) -> SweepSpec {
    let mode = SweepMode::from_flag(fields.number_or(keys[0], defaults[0]));
    let fixed = fields.positive_or(keys[1], defaults[1]);
    match mode {
        SweepMode::Fixed => SweepSpec::fixed(fixed),
        SweepMode::Swept => SweepSpec::swept(
            fields.positive_or(keys[2], defaults[2]),
            fields.positive_or(keys[3], defaults[3]),
            fields.positive_or(keys[4], defaults[4]),
        )
        .with_fixed(fixed),
    }
}

/// Percent value or fraction, returned as a fraction in `(0, 1]`.
fn efficiency_fraction(value: f64, default: f64) -> f64 {
    let fraction = if value > 1.0 { value / 100.0 } else { value };
    if fraction > 0.0 && fraction <= 1.0 {
        fraction
    } else {
        default
    }
}

fn as_object(value: &Value) -> Result<&Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| ConvoptError::request("expected a JSON object of named fields"))
}

/// LLC resonant converter design request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlcRequest {
    pub spec: DesignSpec,
    /// Efficiency assumed by the loss-corrected turns ratio (fraction)
    pub assumed_efficiency: f64,
    /// Quality factor axis
    pub q: SweepSpec,
    /// Inductance ratio Lm/Lr axis
    pub ln: SweepSpec,
    /// Switching frequency axis in Hz
    pub f_sw: SweepSpec,
    /// Transformers in parallel; `None` picks one per kilowatt
    pub parallel_transformers: Option<usize>,
    pub ku: f64,
    /// Winding current density in A/m²
    pub j_max: f64,
    /// Transformer design flux density in T
    pub b_max: f64,
    pub tj_max: f64,
    pub primary_fets: Selection,
    pub secondary_fets: Selection,
    pub transformer_cores: Selection,
    pub inductor_cores: Selection,
    pub output_caps: Selection,
    pub heatsinks: Selection,
}

impl LlcRequest {
    /// Build from any JSON value; only a non-object is an error.
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(Self::from_map(as_object(value)?))
    }

    /// Build from a flat request map, defaulting every unusable field.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let f = Fields::new(map);

        let envelope = Envelope {
            v_in_min: f.positive_or("V_input_min", 370.0),
            v_in_nom: f.positive_or("V_input_nom", 400.0),
            v_in_max: f.positive_or("V_input_max", 430.0),
            v_out_min: f.positive_or("V_output_min", 36.0),
            v_out_nom: f.positive_or("V_output_nom", 48.0),
            v_out_max: f.positive_or("V_output_max", 54.0),
            p_out: f.positive_any_or(&["outPow", "P_out"], 100.0),
            t_amb: f.number_any_or(&["Tamb_input", "T_amb"], 25.0),
        }
        .ordered();

        let weights = ObjectiveWeights::new(
            f.number_or("efficiency", 50.0),
            f.number_or("volume", 50.0),
            f.number_or("cost", 0.0),
        )
        .normalized(ObjectiveWeights::new(0.5, 0.5, 0.0));

        let parallel_transformers = f
            .number_any(&["parallelTransformers", "ptrf"])
            .filter(|&v| v >= 1.0)
            .map(|v| v.round() as usize);

        let request = Self {
            spec: DesignSpec { envelope, weights },
            assumed_efficiency: efficiency_fraction(f.number_or("assumedEfficiency", 95.0), 0.95),
            q: resolve_axis(
                "Q",
                read_sweep(&f, ["qMode", "qFixedValue", "qMin", "qMax", "qStep"], [1.0, 0.8, 0.1, 2.0, 0.1]),
            ),
            ln: resolve_axis(
                "Ln",
                read_sweep(&f, ["lnMode", "lnFixedValue", "lnMin", "lnMax", "lnStep"], [1.0, 4.0, 1.0, 6.0, 0.5]),
            ),
            f_sw: resolve_axis(
                "f_sw",
                read_sweep(&f, ["mode1", "fixedValue1", "min1", "max1", "step1"], [0.0, 120.0, 50.0, 300.0, 10.0])
                    .scaled(1e3),
            ),
            parallel_transformers,
            ku: f.positive_or("kuValue", 0.6).min(1.0),
            j_max: f.positive_or("JmaxValue", 3.5) * 1e6,
            b_max: f.positive_or("BmaxValue", 0.3),
            tj_max: f.number_or("tOperating", 110.0),
            primary_fets: Selection::read(&f, "selectedFets", Some("AllSelectedFets"), &[]),
            secondary_fets: Selection::read(&f, "selectedSeconderFets", Some("AllSelectedFets"), &[]),
            transformer_cores: Selection::read(&f, "selectedTransformer", Some("selectAllTransformers"), &["Ferrite"]),
            inductor_cores: Selection::read(&f, "selectedInductor", Some("selectAllInductors"), &["Ferrite"]),
            output_caps: Selection::read(&f, "selectedOutCaps", Some("selectAllOutCaps"), &[]),
            heatsinks: Selection::read(&f, "selectedPrimaryHeatsink", Some("selectedAllHeatsinksByDefault"), &[]),
        };
        debug!(spec = ?request.spec, "parsed LLC request");
        request
    }
}

/// Boost PFC converter design request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PfcRequest {
    pub spec: DesignSpec,
    /// Expected converter efficiency (fraction)
    pub efficiency: f64,
    /// Switching frequency axis in Hz
    pub f_sw: SweepSpec,
    /// Boost inductance axis in H
    pub inductance: SweepSpec,
    /// Hold-up time in s
    pub hold_up: f64,
    pub line_frequency: f64,
    pub tj_max: f64,
    /// Winding wire diameter in m
    pub wire_diameter: f64,
    /// Winding operating temperature in °C
    pub winding_temperature: f64,
    /// Flux density used for the turns count in T
    pub design_flux: f64,
    pub fets: Selection,
    pub cores: Selection,
    pub capacitors: Selection,
    pub heatsinks: Selection,
}

impl PfcRequest {
    /// Build from any JSON value; only a non-object is an error.
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(Self::from_map(as_object(value)?))
    }

    /// Build from a flat request map, defaulting every unusable field.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let f = Fields::new(map);

        let v_in_rms = f.positive_any_or(&["vin", "V_in_RMS", "V_in"], 230.0);
        let v_out = f.positive_any_or(&["outVol", "V_out"], 400.0);
        let envelope = Envelope {
            v_in_min: v_in_rms * 0.85,
            v_in_nom: v_in_rms,
            v_in_max: v_in_rms * 1.15,
            v_out_min: v_out,
            v_out_nom: v_out,
            v_out_max: v_out,
            p_out: f.positive_any_or(&["outPow", "P_out"], 500.0),
            t_amb: f.number_any_or(&["Tamb_input", "T_amb"], 25.0),
        };

        let weights = ObjectiveWeights::new(
            f.number_or("weightEfficiency", 60.0),
            f.number_or("weightVolume", 30.0),
            f.number_or("weightCost", 10.0),
        )
        .normalized(ObjectiveWeights::new(0.6, 0.3, 0.1));

        let request = Self {
            spec: DesignSpec { envelope, weights },
            efficiency: efficiency_fraction(f.positive_any_or(&["efficiency", "eta_eff"], 96.0), 0.96),
            f_sw: resolve_axis(
                "f_sw",
                read_sweep(&f, ["mode1", "fixedValue1", "min1", "max1", "step1"], [1.0, 45.0, 45.0, 90.0, 5.0])
                    .scaled(1e3),
            ),
            inductance: resolve_axis(
                "L",
                read_sweep(&f, ["mode2", "fixedValue2", "min2", "max2", "step2"], [1.0, 100.0, 100.0, 300.0, 10.0])
                    .scaled(1e-6),
            ),
            hold_up: f.positive_or("T_hold", 20.0) * 1e-3,
            line_frequency: f.positive_or("fLine", 50.0),
            tj_max: f.number_or("tjMax", 150.0),
            wire_diameter: f.positive_or("wireDiameter", 1.0) * 1e-3,
            winding_temperature: f.number_or("tWinding", 80.0),
            design_flux: f.positive_or("BmaxValue", 0.3),
            fets: Selection::read(&f, "selectedFets", Some("AllSelectedFets"), &[]),
            cores: Selection::read(&f, "selectedLpfc", Some("Select_All_PFCCores_by_Default"), &[]),
            capacitors: Selection::read(&f, "selectedBusCaps", Some("Select_All_Buscaps_by_Default"), &[]),
            heatsinks: Selection::read(&f, "selectedHeatsinks", Some("selectedAllHeatsinksByDefault"), &[]),
        };
        debug!(spec = ?request.spec, "parsed PFC request");
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    #[test]
    fn test_llc_defaults_from_empty_map() {
        let req = LlcRequest::from_map(&Map::new());
        let env = req.spec.envelope;
        assert_eq!(env.p_out, 100.0);
        assert_eq!((env.v_in_min, env.v_in_nom, env.v_in_max), (370.0, 400.0, 430.0));
        assert_eq!(env.v_out_nom, 48.0);
        assert_relative_eq!(req.assumed_efficiency, 0.95);
        assert_eq!(req.q.values(), vec![0.8]);
        assert_eq!(req.ln.values(), vec![4.0]);
        let f = req.f_sw.values();
        assert_eq!(f.len(), 26);
        assert_relative_eq!(f[0], 50e3);
        assert_relative_eq!(req.j_max, 3.5e6);
        assert_relative_eq!(req.spec.weights.efficiency, 0.5);
        assert_eq!(req.transformer_cores.names, vec!["Ferrite".to_string()]);
        assert!(req.primary_fets.is_unrestricted());
    }

    #[test]
    fn test_llc_malformed_fields_fall_back() {
        let map = json!({
            "outPow": "1,5e3",
            "V_input_nom": "user input needed",
            "qMode": 0, "qMin": "0,2", "qMax": 0.4, "qStep": 0.1,
            "lnMode": 0, "lnMin": 6, "lnMax": 1, "lnStep": 0.5, "lnFixedValue": 5,
            "efficiency": "", "volume": null, "cost": "abc",
            "selectedFets": ["IPP60R099C6"],
        });
        let req = LlcRequest::from_value(&map).unwrap();
        assert_eq!(req.spec.envelope.p_out, 1500.0);
        assert_eq!(req.spec.envelope.v_in_nom, 400.0);
        assert_eq!(req.q.len(), 3);
        assert_eq!(req.ln.values(), vec![5.0]);
        assert_eq!(req.primary_fets.names, vec!["IPP60R099C6".to_string()]);
    }

    #[test]
    fn test_request_must_be_object() {
        assert!(LlcRequest::from_value(&json!([1, 2])).is_err());
        assert!(PfcRequest::from_value(&json!("x")).is_err());
    }

    #[test]
    fn test_pfc_defaults_and_units() {
        let map = json!({
            "V_in_RMS": "230",
            "outVol": 400,
            "outPow": 500,
            "fixedValue1": 65,
            "efficiency": 0.97,
            "AllSelectedFets": 1,
        });
        let req = PfcRequest::from_value(&map).unwrap();
        let env = req.spec.envelope;
        assert_relative_eq!(env.v_in_min, 195.5);
        assert_relative_eq!(env.v_in_max, 264.5);
        assert_eq!(req.f_sw.values(), vec![65e3]);
        let inductance = req.inductance.values();
        assert_eq!(inductance.len(), 1);
        assert_relative_eq!(inductance[0], 100e-6, max_relative = 1e-12);
        assert_relative_eq!(req.efficiency, 0.97);
        assert_relative_eq!(req.hold_up, 0.02);
        assert_relative_eq!(req.wire_diameter, 1e-3);
        assert!(req.fets.select_all);
        assert_relative_eq!(req.spec.weights.efficiency, 0.6);
    }

    #[test]
    fn test_envelope_is_reordered() {
        let env = Envelope {
            v_in_min: 430.0,
            v_in_nom: 400.0,
            v_in_max: 370.0,
            v_out_min: 36.0,
            v_out_nom: 48.0,
            v_out_max: 54.0,
            p_out: 100.0,
            t_amb: 25.0,
        }
        .ordered();
        assert_eq!((env.v_in_min, env.v_in_max), (370.0, 430.0));
    }

    #[test]
    fn test_weights_normalization() {
        let w = ObjectiveWeights::new(50.0, 50.0, 0.0).normalized(ObjectiveWeights::new(1.0, 0.0, 0.0));
        assert_relative_eq!(w.efficiency, 0.5);
        let w = ObjectiveWeights::new(0.0, 0.0, 0.0).normalized(ObjectiveWeights::new(0.6, 0.3, 0.1));
        assert_relative_eq!(w.efficiency + w.volume + w.cost, 1.0);
        assert_relative_eq!(w.volume, 0.3);
    }

    #[test]
    fn test_selection_matching() {
        let sel = Selection::named(["ferrite", "ETD29"]);
        assert!(sel.matches(["PQ32", "Ferrite"]));
        assert!(sel.matches(["etd29"]));
        assert!(!sel.matches(["RM10", "Powder"]));
        assert!(Selection::all().is_unrestricted());
    }
}
