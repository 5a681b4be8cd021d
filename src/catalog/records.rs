//! Typed catalog records.
//!
//! Catalog files are hand-maintained JSON exported from several vendor
//! databases, so field names vary (`R_dson` vs `R_dson_25C`), units vary
//! (core areas in m² or mm²) and values are sometimes strings. Each record is
//! deserialized from the raw field map through [`Fields`], every absent or
//! unusable field takes the default documented on the struct, and geometry is
//! normalized to SI units.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::input::Fields;

/// Name used when a record carries no identifier.
pub const UNKNOWN_PART: &str = "Unknown";

/// Cost assumed for a part whose catalog entry has none.
pub const DEFAULT_PART_COST: f64 = 1.0;

fn num(f: &Fields<'_>, keys: &[&str], default: f64) -> f64 {
    f.number_any(keys).unwrap_or(default)
}

fn positive(f: &Fields<'_>, keys: &[&str], default: f64) -> f64 {
    f.number_any(keys).filter(|&v| v > 0.0).unwrap_or(default)
}

fn optional_positive(f: &Fields<'_>, keys: &[&str]) -> Option<f64> {
    f.number_any(keys).filter(|&v| v > 0.0)
}

/// Convert a legacy value to SI when it is larger than `threshold`.
fn to_si(value: f64, threshold: f64, scale: f64) -> f64 {
    if value > threshold {
        value * scale
    } else {
        value
    }
}

// ============ FET ============

/// Power MOSFET datasheet parameters.
///
/// Defaults: `R_dson` 10 mΩ, `Q_g` 40 nC, `C_oss` 100 pF, rise/fall 15 ns,
/// `Q_rr` 50 nC.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct Fet {
    pub part_number: String,
    pub manufacturer: String,
    /// Drain-source breakdown voltage (V)
    pub v_dss: f64,
    /// Continuous drain current (A)
    pub i_d: f64,
    /// On-resistance at 25 °C (Ω)
    pub r_dson: f64,
    /// Total gate charge (C)
    pub q_g: f64,
    /// Output capacitance (F)
    pub c_oss: f64,
    /// Body-diode reverse-recovery charge (C)
    pub q_rr: f64,
    pub t_rise: f64,
    pub t_fall: f64,
    /// Turn-on switching energy (J)
    pub e_on: Option<f64>,
    /// Turn-off switching energy (J)
    pub e_off: Option<f64>,
    pub c_iss: Option<f64>,
    /// Gate threshold voltage (V)
    pub v_th: Option<f64>,
    /// Miller plateau voltage (V)
    pub v_plateau: Option<f64>,
    /// Internal gate resistance (Ω)
    pub r_g: Option<f64>,
    /// Junction-to-case thermal resistance (°C/W)
    pub r_th_jc: Option<f64>,
    pub cost: Option<f64>,
}

impl Fet {
    pub const DEFAULT_R_DSON: f64 = 0.01;
    pub const DEFAULT_Q_G: f64 = 40e-9;
    pub const DEFAULT_C_OSS: f64 = 100e-12;
    pub const DEFAULT_T_SWITCH: f64 = 15e-9;
    pub const DEFAULT_Q_RR: f64 = 50e-9;

    /// A record with the given rating and on-resistance, all else defaulted.
    pub fn new(part_number: impl Into<String>, v_dss: f64, r_dson: f64) -> Self {
        Self {
            part_number: part_number.into(),
            v_dss,
            r_dson,
            ..Self::from(Map::new())
        }
    }

    /// Switching energies, when the datasheet provides both.
    pub fn switching_energy(&self) -> Option<(f64, f64)> {
        self.e_on.zip(self.e_off)
    }

    /// Figure of merit `R_dson·Q_g`; lower is better.
    pub fn figure_of_merit(&self) -> f64 {
        self.r_dson * self.q_g
    }

    pub fn cost_or_default(&self) -> f64 {
        self.cost.unwrap_or(DEFAULT_PART_COST)
    }
}

impl From<Map<String, Value>> for Fet {
    fn from(map: Map<String, Value>) -> Self {
        let f = Fields::new(&map);
        Self {
            part_number: f
                .text_any(&["part_number", "name", "id"])
                .unwrap_or_else(|| UNKNOWN_PART.to_string()),
            manufacturer: f.text_any(&["manufacturer"]).unwrap_or_default(),
            v_dss: num(&f, &["V_dss", "v_dss", "Vds"], 0.0),
            i_d: num(&f, &["I_d", "i_d", "Id"], 0.0),
            r_dson: positive(&f, &["R_dson", "R_dson_25C", "r_dson"], Self::DEFAULT_R_DSON),
            q_g: positive(&f, &["Q_g", "Qg", "q_g"], Self::DEFAULT_Q_G),
            c_oss: positive(&f, &["C_oss", "Coss", "c_oss"], Self::DEFAULT_C_OSS),
            q_rr: num(&f, &["Q_rr", "Qrr", "q_rr"], Self::DEFAULT_Q_RR).max(0.0),
            t_rise: positive(&f, &["t_r", "t_rise"], Self::DEFAULT_T_SWITCH),
            t_fall: positive(&f, &["t_f", "t_fall"], Self::DEFAULT_T_SWITCH),
            e_on: optional_positive(&f, &["E_on", "e_on"]),
            e_off: optional_positive(&f, &["E_off", "e_off"]),
            c_iss: optional_positive(&f, &["C_iss", "Ciss"]),
            v_th: optional_positive(&f, &["V_th", "V_gs_th", "Vth"]),
            v_plateau: optional_positive(&f, &["V_plateau", "V_pl", "Vplt"]),
            r_g: optional_positive(&f, &["R_g", "Rg"]),
            r_th_jc: optional_positive(&f, &["R_th_jc", "R_jc", "Rth_jc"]),
            cost: optional_positive(&f, &["cost", "price"]),
        }
    }
}

// ============ Magnetic core ============

/// Raw core-loss coefficients as stored in the catalog.
///
/// For Steinmetz data `a, b, c` hold `k, α, β`; for polynomial data they are
/// the mT-based loss-density coefficients. Which law applies is decided by
/// [`crate::models::core_loss::CoreLossLaw::classify`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossCoefficients {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl LossCoefficients {
    pub const DEFAULT_K: f64 = 0.0002;
    pub const DEFAULT_ALPHA: f64 = 1.5;
    pub const DEFAULT_BETA: f64 = 2.5;

    pub fn steinmetz(k: f64, alpha: f64, beta: f64) -> Self {
        Self {
            a: k,
            b: alpha,
            c: beta,
            d: 0.0,
        }
    }

    pub fn polynomial(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self { a, b, c, d }
    }
}

impl Default for LossCoefficients {
    fn default() -> Self {
        Self::steinmetz(Self::DEFAULT_K, Self::DEFAULT_ALPHA, Self::DEFAULT_BETA)
    }
}

/// Magnetic core geometry and material data, in SI units.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct Core {
    pub name: String,
    pub material: String,
    pub shape: String,
    /// Effective cross-section (m²)
    pub ae: f64,
    /// Window area (m²)
    pub aw: f64,
    /// Effective volume (m³)
    pub ve: f64,
    /// Mean length per turn (m)
    pub mlt: f64,
    /// Saturation flux density (T)
    pub b_sat: f64,
    /// Inductance factor (H/turn²)
    pub al: Option<f64>,
    pub loss: LossCoefficients,
    /// Toroid outer diameter (mm)
    pub outer_diameter: Option<f64>,
    /// Toroid height (mm)
    pub height: Option<f64>,
    pub cost: Option<f64>,
}

impl Core {
    pub const DEFAULT_AE: f64 = 100e-6;
    pub const DEFAULT_AW: f64 = 100e-6;
    pub const DEFAULT_VE: f64 = 5e-6;
    pub const DEFAULT_MLT: f64 = 50e-3;
    pub const DEFAULT_B_SAT: f64 = 0.5;

    /// A core with the given geometry (SI units) and default material data.
    pub fn new(name: impl Into<String>, ae: f64, aw: f64, ve: f64, mlt: f64) -> Self {
        Self {
            name: name.into(),
            ae,
            aw,
            ve,
            mlt,
            ..Self::from(Map::new())
        }
    }

    pub fn with_b_sat(mut self, b_sat: f64) -> Self {
        self.b_sat = b_sat;
        self
    }

    pub fn with_loss(mut self, loss: LossCoefficients) -> Self {
        self.loss = loss;
        self
    }

    /// Area product `Ae·Aw` (m⁴).
    pub fn area_product(&self) -> f64 {
        self.ae * self.aw
    }

    /// Volume in mm³ used for sizing: the toroid bounding volume when outer
    /// dimensions are known, the effective volume otherwise.
    pub fn volume_mm3(&self, wire_radius_mm: f64) -> f64 {
        match (self.outer_diameter, self.height) {
            (Some(od), Some(ht)) => {
                crate::models::magnetics::toroid_volume(od, ht, wire_radius_mm)
            }
            _ => self.ve * 1e9,
        }
    }

    pub fn cost_or_default(&self) -> f64 {
        self.cost.unwrap_or(DEFAULT_PART_COST)
    }
}

impl From<Map<String, Value>> for Core {
    fn from(map: Map<String, Value>) -> Self {
        let f = Fields::new(&map);

        let loss = match f.object("steinmetz") {
            Some(s) => LossCoefficients {
                a: num(&s, &["aB", "a", "k"], LossCoefficients::DEFAULT_K),
                b: num(&s, &["bB", "b", "alpha"], LossCoefficients::DEFAULT_ALPHA),
                c: num(&s, &["cB", "c", "beta"], LossCoefficients::DEFAULT_BETA),
                d: num(&s, &["dB", "d"], 0.0),
            },
            None => LossCoefficients::steinmetz(
                num(&f, &["k"], LossCoefficients::DEFAULT_K),
                num(&f, &["alpha"], LossCoefficients::DEFAULT_ALPHA),
                num(&f, &["beta"], LossCoefficients::DEFAULT_BETA),
            ),
        };

        Self {
            name: f
                .text_any(&["name", "part_number", "id"])
                .unwrap_or_else(|| UNKNOWN_PART.to_string()),
            material: f.text_any(&["material"]).unwrap_or_default(),
            shape: f.text_any(&["type", "shape"]).unwrap_or_default(),
            ae: to_si(positive(&f, &["Ae", "ae"], Self::DEFAULT_AE), 1.0, 1e-6),
            aw: to_si(positive(&f, &["Aw", "aw", "Wa"], Self::DEFAULT_AW), 1.0, 1e-6),
            ve: to_si(positive(&f, &["Ve", "ve", "volume"], Self::DEFAULT_VE), 1.0, 1e-9),
            mlt: to_si(positive(&f, &["MLT", "mlt"], Self::DEFAULT_MLT), 1.0, 1e-3),
            b_sat: positive(&f, &["B_sat", "Bsat", "b_sat"], Self::DEFAULT_B_SAT),
            al: optional_positive(&f, &["AL", "Al", "al"]).map(|al| to_si(al, 1e-3, 1e-9)),
            loss,
            outer_diameter: optional_positive(&f, &["OD", "outer_diameter"]),
            height: optional_positive(&f, &["HT", "height"]),
            cost: optional_positive(&f, &["cost", "price"]),
        }
    }
}

// ============ Capacitor ============

/// Capacitor datasheet parameters. Dimensions are in mm.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct Capacitor {
    pub part_number: String,
    pub manufacturer: String,
    /// Dielectric technology (electrolytic, film, ceramic, ...)
    pub technology: String,
    /// Capacitance (F)
    pub capacitance: f64,
    /// Rated voltage (V)
    pub voltage: f64,
    /// Equivalent series resistance (Ω)
    pub esr: f64,
    /// Rated ripple current (A); `None` when unknown
    pub ripple_current: Option<f64>,
    pub diameter: f64,
    pub height: f64,
    pub cost: Option<f64>,
}

impl Capacitor {
    /// A capacitor with the given ratings and no mechanical data.
    pub fn new(part_number: impl Into<String>, capacitance: f64, voltage: f64, esr: f64) -> Self {
        Self {
            part_number: part_number.into(),
            capacitance,
            voltage,
            esr,
            ..Self::from(Map::new())
        }
    }

    pub fn with_ripple_current(mut self, amps: f64) -> Self {
        self.ripple_current = Some(amps);
        self
    }

    pub fn with_size(mut self, diameter_mm: f64, height_mm: f64) -> Self {
        self.diameter = diameter_mm;
        self.height = height_mm;
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }
}

impl From<Map<String, Value>> for Capacitor {
    fn from(map: Map<String, Value>) -> Self {
        let f = Fields::new(&map);
        Self {
            part_number: f
                .text_any(&["part_number", "name", "id"])
                .unwrap_or_else(|| UNKNOWN_PART.to_string()),
            manufacturer: f.text_any(&["manufacturer"]).unwrap_or_default(),
            technology: f.text_any(&["type", "technology", "dielectric"]).unwrap_or_default(),
            capacitance: num(&f, &["capacitance", "C"], 0.0).max(0.0),
            voltage: num(&f, &["voltage", "V_rated"], 0.0).max(0.0),
            esr: num(&f, &["ESR", "esr"], 0.0).max(0.0),
            ripple_current: optional_positive(&f, &["I_AC_Ripple", "I_ripple_rated", "ripple_current"]),
            diameter: num(&f, &["diameter", "D"], 0.0).max(0.0),
            height: num(&f, &["height", "H", "L"], 0.0).max(0.0),
            cost: optional_positive(&f, &["cost", "price"]),
        }
    }
}

// ============ Heatsink ============

/// Extruded heatsink geometry (mm) and optional measured thermal resistance.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct Heatsink {
    pub name: String,
    /// Footprint width
    pub x: f64,
    /// Footprint depth
    pub y: f64,
    pub base: [f64; 3],
    pub fins: [f64; 3],
    /// Declared sink-to-ambient resistance (°C/W)
    pub r_th_sa: Option<f64>,
    pub cost: Option<f64>,
}

impl Heatsink {
    pub const DEFAULT_X: f64 = 30.0;
    pub const DEFAULT_Y: f64 = 30.0;
    pub const DEFAULT_FIN_HEIGHT: f64 = 10.0;

    /// A heatsink with the given footprint and fin height, and a solid base block.
    pub fn new(name: impl Into<String>, x: f64, y: f64, fin_height: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            base: [x, fin_height, y],
            fins: [0.0; 3],
            r_th_sa: None,
            cost: None,
        }
    }

    pub fn with_r_th_sa(mut self, r_th_sa: f64) -> Self {
        self.r_th_sa = Some(r_th_sa);
        self
    }

    /// Fin height `y_b`, used by the thermal-resistance estimate.
    pub fn fin_height(&self) -> f64 {
        if self.base[1] > 0.0 {
            self.base[1]
        } else {
            Self::DEFAULT_FIN_HEIGHT
        }
    }
}

impl From<Map<String, Value>> for Heatsink {
    fn from(map: Map<String, Value>) -> Self {
        let f = Fields::new(&map);
        let dim = |key: &str| num(&f, &[key], 0.0).max(0.0);
        Self {
            name: f
                .text_any(&["name", "part_number", "id"])
                .unwrap_or_else(|| UNKNOWN_PART.to_string()),
            x: positive(&f, &["X"], Self::DEFAULT_X),
            y: positive(&f, &["Y"], Self::DEFAULT_Y),
            base: [dim("x_b"), dim("y_b"), dim("z_b")],
            fins: [dim("x_k"), dim("y_k"), dim("z_k")],
            r_th_sa: optional_positive(&f, &["R_th_sa", "R_sa"]),
            cost: optional_positive(&f, &["cost", "price"]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    #[test]
    fn test_fet_defaults() {
        let fet: Fet = serde_json::from_value(json!({"part_number": "X1", "V_dss": 650})).unwrap();
        assert_eq!(fet.part_number, "X1");
        assert_eq!(fet.v_dss, 650.0);
        assert_eq!(fet.r_dson, Fet::DEFAULT_R_DSON);
        assert_eq!(fet.q_g, Fet::DEFAULT_Q_G);
        assert_eq!(fet.c_oss, Fet::DEFAULT_C_OSS);
        assert_eq!(fet.t_rise, Fet::DEFAULT_T_SWITCH);
        assert!(fet.switching_energy().is_none());
    }

    #[test]
    fn test_fet_alternate_keys_and_strings() {
        let fet: Fet = serde_json::from_value(json!({
            "name": "IPP60R099C6",
            "V_dss": "600",
            "R_dson_25C": "0,099",
            "Q_g": 120e-9,
            "Q_rr": "user input needed",
            "E_on": 20e-6,
            "E_off": 10e-6,
        }))
        .unwrap();
        assert_eq!(fet.part_number, "IPP60R099C6");
        assert_relative_eq!(fet.r_dson, 0.099);
        assert_eq!(fet.q_rr, Fet::DEFAULT_Q_RR);
        assert_eq!(fet.switching_energy(), Some((20e-6, 10e-6)));
    }

    #[test]
    fn test_core_unit_normalization() {
        let core: Core = serde_json::from_value(json!({
            "name": "ETD29",
            "Ae": 76.0,
            "Aw": 97.0,
            "Ve": 5470.0,
            "MLT": 52.8,
            "Al": 2000.0,
            "k": 44.5, "alpha": 1.63, "beta": 2.62,
            "B_sat": 0.39
        }))
        .unwrap();
        assert_relative_eq!(core.ae, 76e-6);
        assert_relative_eq!(core.aw, 97e-6);
        assert_relative_eq!(core.ve, 5.47e-6);
        assert_relative_eq!(core.mlt, 0.0528);
        assert_relative_eq!(core.al.unwrap(), 2e-6);
        assert_relative_eq!(core.loss.a, 44.5);
        assert_relative_eq!(core.volume_mm3(0.0), 5470.0, epsilon = 1e-6);
    }

    #[test]
    fn test_core_nested_steinmetz() {
        let core: Core = serde_json::from_value(json!({
            "name": "ICERGICORE1",
            "Ae": 1.2e-4,
            "steinmetz": {"aB": 5000.0, "bB": 20.0, "cB": 1.0, "dB": 0.5}
        }))
        .unwrap();
        assert_relative_eq!(core.ae, 1.2e-4);
        assert_eq!(core.loss, LossCoefficients::polynomial(5000.0, 20.0, 1.0, 0.5));
        assert_eq!(core.b_sat, Core::DEFAULT_B_SAT);
    }

    #[test]
    fn test_capacitor_record() {
        let cap: Capacitor = serde_json::from_value(json!({
            "name": "EKXJ451ELL181MM40S",
            "capacitance": 180e-6,
            "voltage": 450,
            "ESR": 0.6,
            "I_AC_Ripple": "N/A",
            "diameter": 22, "height": 40,
        }))
        .unwrap();
        assert_eq!(cap.part_number, "EKXJ451ELL181MM40S");
        assert_eq!(cap.ripple_current, None);
        assert_eq!(cap.cost, None);
        assert_eq!(cap.diameter, 22.0);
    }

    #[test]
    fn test_heatsink_record() {
        let hs: Heatsink = serde_json::from_value(json!({
            "name": "SK 104", "X": 50.8, "Y": 38.1,
            "x_b": 50.8, "y_b": 12.7, "z_b": 38.1
        }))
        .unwrap();
        assert_eq!(hs.fin_height(), 12.7);
        assert_eq!(hs.fins, [0.0; 3]);
        assert!(hs.r_th_sa.is_none());

        let bare: Heatsink = serde_json::from_value(json!({})).unwrap();
        assert_eq!(bare.name, UNKNOWN_PART);
        assert_eq!(bare.fin_height(), Heatsink::DEFAULT_FIN_HEIGHT);
    }
}
