//! Windings, turns, area-product sizing and inductor/transformer design.
//!
//! Copper is modelled as round wire with a temperature-corrected resistivity
//! and a closed-form skin-effect factor. Cores are picked from the catalog by
//! area product and sized by the flux they must carry.

use std::f64::consts::PI;

use serde::Serialize;

use crate::catalog::Core;
use crate::models::core_loss::{core_loss, CoreLossLaw};
use crate::{COPPER_CONDUCTIVITY, COPPER_RESISTIVITY, COPPER_TEMPERATURE_COEFFICIENT, MU_0, REFERENCE_TEMPERATURE};

/// Waveform form factor in the area-product equation (square wave).
pub const FORM_FACTOR: f64 = 4.0;

/// Lead length added to every winding (m).
pub const LEAD_LENGTH: f64 = 0.06;

/// Gauge reported for a zero-current winding.
pub const THINNEST_AWG: i32 = 50;

pub const DEFAULT_TRANSFORMER_FLUX: f64 = 0.3;
pub const DEFAULT_CURRENT_DENSITY: f64 = 5e6;
pub const DEFAULT_WINDOW_UTILIZATION: f64 = 0.4;
pub const DEFAULT_TRANSFORMER_EFFICIENCY: f64 = 0.95;

// ============ Copper ============

/// Skin depth in copper; +∞ at DC.
pub fn skin_depth(f: f64) -> f64 {
    if f <= 0.0 {
        return f64::INFINITY;
    }
    1.0 / (PI * f * MU_0 * COPPER_CONDUCTIVITY).sqrt()
}

/// `R_ac/R_dc = 1 + x⁴/(48 + 0.8·x⁴)` with `x = r/δ`.
pub fn ac_resistance_factor(wire_radius: f64, f: f64) -> f64 {
    let x4 = (wire_radius / skin_depth(f)).powi(4);
    1.0 + x4 / (48.0 + 0.8 * x4)
}

/// Copper resistivity at `temperature` (°C).
pub fn copper_resistivity(temperature: f64) -> f64 {
    COPPER_RESISTIVITY * (1.0 + COPPER_TEMPERATURE_COEFFICIENT * (temperature - REFERENCE_TEMPERATURE))
}

/// `MLT·N` plus leads.
pub fn wire_length(mlt: f64, turns: u32) -> f64 {
    mlt * f64::from(turns) + LEAD_LENGTH
}

/// `ρ·l/(π·r²)`; +∞ for a wire without cross-section.
pub fn dc_resistance(resistivity: f64, length: f64, wire_radius: f64) -> f64 {
    if wire_radius <= 0.0 {
        return f64::INFINITY;
    }
    resistivity * length / (PI * wire_radius * wire_radius)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WireGauge {
    /// Copper cross-section (m²)
    pub area: f64,
    /// Bare diameter (m)
    pub diameter: f64,
    pub awg: i32,
}

/// Wire carrying `current` at density `j` (A/m²).
pub fn wire_gauge(current: f64, j: f64) -> WireGauge {
    let area = if j > 0.0 { current.abs() / j } else { 0.0 };
    let diameter = 2.0 * (area / PI).sqrt();
    let awg = if diameter > 0.0 {
        (-19.93 * (diameter * 1e3).log10() + 9.73).round() as i32
    } else {
        THINNEST_AWG
    };
    WireGauge { area, diameter, awg }
}

/// Dowell-optimal conductor diameter for `layers` at switching frequency `f`
/// over resonance `f0`.
pub fn optimal_wire_diameter(f: f64, f0: f64, layers: u32) -> f64 {
    let p = f64::from(layers);
    let psi = match (5.0 * p * p - 1.0) / 15.0 {
        psi if psi > 0.0 => psi,
        _ => 1.0,
    };
    let ratio = if f0 > 0.0 { f / (2.0 * f0) } else { 0.0 };
    let delta = (4.0 * ratio * ratio / psi).powf(0.25);
    delta * skin_depth(f)
}

// ============ Sizing ============

/// `N = ⌈L·I_peak/(B_max·Ae)⌉`, else `⌈√(L/A_L)⌉`, else 1.
pub fn turns_for_inductance(l: f64, i_peak: f64, b_max: f64, ae: f64, al: Option<f64>) -> u32 {
    let turns = if b_max > 0.0 && ae > 0.0 {
        (l * i_peak / (b_max * ae)).ceil()
    } else {
        match al {
            Some(al) if al > 0.0 => (l / al).sqrt().ceil(),
            _ => 1.0,
        }
    };
    if turns.is_finite() && turns >= 1.0 {
        turns.min(f64::from(u32::MAX)) as u32
    } else {
        1
    }
}

/// Transformer area product `P/(K_f·K_u·B·J·f·η)` (m⁴); +∞ if any factor is not positive.
pub fn area_product(p_out: f64, ku: f64, b_max: f64, j_max: f64, f_sw: f64, efficiency: f64) -> f64 {
    let denominator = FORM_FACTOR * ku * b_max * j_max * f_sw * efficiency;
    if denominator > 0.0 {
        p_out / denominator
    } else {
        f64::INFINITY
    }
}

/// Inductor area product `L·I_max·I_rms/(B·J·K_u)` (m⁴).
pub fn inductor_area_product(l: f64, i_max: f64, i_rms: f64, b_max: f64, j_max: f64, ku: f64) -> f64 {
    let denominator = b_max * j_max * ku;
    if denominator > 0.0 {
        l * i_max * i_rms / denominator
    } else {
        f64::INFINITY
    }
}

/// Smallest-volume core whose `Ae·Aw` reaches `required`. Ties keep the first.
pub fn select_core_by_area_product<'a>(cores: impl IntoIterator<Item = &'a Core>, required: f64) -> Option<&'a Core> {
    cores
        .into_iter()
        .filter(|core| core.area_product() >= required)
        .fold(None, |best: Option<&Core>, core| match best {
            Some(b) if b.volume_mm3(0.0) <= core.volume_mm3(0.0) => Some(b),
            _ => Some(core),
        })
}

/// Bounding volume (mm³) of a wound toroid: `(4 + r + OD)²·(4 + r + HT)`.
pub fn toroid_volume(od: f64, ht: f64, wire_radius: f64) -> f64 {
    (4.0 + wire_radius + od).powi(2) * (4.0 + wire_radius + ht)
}

// ============ Boost inductor ============

/// Peak-to-peak ripple `V_pk·D/(L·f)` with `D = 1 − V_pk/V_out` (0.5 when `V_out ≤ V_pk`).
pub fn ripple_current(v_pk: f64, v_out: f64, l: f64, f: f64) -> f64 {
    let duty = if v_out > v_pk { 1.0 - v_pk / v_out } else { 0.5 };
    if l * f > 0.0 {
        v_pk * duty / (l * f)
    } else {
        f64::INFINITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PfcInductorCurrents {
    pub i_in_rms: f64,
    pub i_lf_peak: f64,
    pub delta_i: f64,
    pub i_hf_rms: f64,
    /// `I_lf_peak + ΔI/2`
    pub i_peak: f64,
}

/// Currents of a boost inductor at line crest; `efficiency` is a fraction.
pub fn pfc_inductor_currents(p_out: f64, efficiency: f64, v_in_rms: f64, v_out: f64, l: f64, f: f64) -> PfcInductorCurrents {
    let i_in_rms = if efficiency > 0.0 && v_in_rms > 0.0 {
        p_out / (efficiency * v_in_rms)
    } else {
        0.0
    };
    let i_lf_peak = std::f64::consts::SQRT_2 * i_in_rms;
    let delta_i = ripple_current(std::f64::consts::SQRT_2 * v_in_rms, v_out, l, f);
    PfcInductorCurrents {
        i_in_rms,
        i_lf_peak,
        delta_i,
        i_hf_rms: delta_i / (2.0 * 3f64.sqrt()),
        i_peak: i_lf_peak + delta_i / 2.0,
    }
}

/// A winding: turn count, bare wire diameter (m) and copper temperature (°C).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindingSpec {
    pub turns: u32,
    pub wire_diameter: f64,
    pub temperature: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InductorLosses {
    pub core: f64,
    pub copper: f64,
    pub b_max: f64,
    pub b_ripple: f64,
    pub r_dc: f64,
    pub r_ac: f64,
}

impl InductorLosses {
    pub fn total(&self) -> f64 {
        self.core + self.copper
    }
}

/// Core loss at the ripple flux plus low- and high-frequency copper loss.
pub fn pfc_inductor_losses(
    core: &Core,
    currents: &PfcInductorCurrents,
    winding: &WindingSpec,
    l: f64,
    f: f64,
    p_out: f64,
) -> InductorLosses {
    let n_ae = f64::from(winding.turns.max(1)) * core.ae;
    let b_max = l * currents.i_peak / n_ae;
    let b_ripple = l * currents.delta_i / (2.0 * n_ae);

    let law = CoreLossLaw::classify(&core.loss);
    let core_w = core_loss(&law, f, b_ripple, core.ve, p_out);

    let radius = winding.wire_diameter / 2.0;
    let r_dc = dc_resistance(
        copper_resistivity(winding.temperature),
        wire_length(core.mlt, winding.turns),
        radius,
    );
    let r_ac = r_dc * ac_resistance_factor(radius, f);
    let copper = currents.i_in_rms.powi(2) * r_dc + currents.i_hf_rms.powi(2) * r_ac;

    InductorLosses {
        core: core_w,
        copper,
        b_max,
        b_ripple,
        r_dc,
        r_ac,
    }
}

// ============ Transformer ============

/// Electrical requirements of an LLC transformer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformerSpec {
    pub p_out: f64,
    pub f_sw: f64,
    pub lm: f64,
    /// Peak magnetizing current
    pub i_mag: f64,
    /// Turns ratio `N_p/N_s`
    pub turns_ratio: f64,
    pub i_primary_rms: f64,
    pub i_secondary_rms: f64,
    pub b_max: f64,
    pub j_max: f64,
    pub ku: f64,
    pub efficiency: f64,
    pub temperature: f64,
}

impl TransformerSpec {
    pub fn new(p_out: f64, f_sw: f64, lm: f64, i_mag: f64, turns_ratio: f64) -> Self {
        Self {
            p_out,
            f_sw,
            lm,
            i_mag,
            turns_ratio,
            i_primary_rms: 0.0,
            i_secondary_rms: 0.0,
            b_max: DEFAULT_TRANSFORMER_FLUX,
            j_max: DEFAULT_CURRENT_DENSITY,
            ku: DEFAULT_WINDOW_UTILIZATION,
            efficiency: DEFAULT_TRANSFORMER_EFFICIENCY,
            temperature: REFERENCE_TEMPERATURE,
        }
    }

    pub fn with_currents(mut self, i_primary_rms: f64, i_secondary_rms: f64) -> Self {
        self.i_primary_rms = i_primary_rms;
        self.i_secondary_rms = i_secondary_rms;
        self
    }

    pub fn with_limits(mut self, b_max: f64, j_max: f64, ku: f64) -> Self {
        self.b_max = b_max;
        self.j_max = j_max;
        self.ku = ku;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformerDesign<'a> {
    #[serde(skip)]
    pub core: &'a Core,
    pub area_product: f64,
    pub n_primary: u32,
    pub n_secondary: u32,
    pub primary_wire: WireGauge,
    pub secondary_wire: WireGauge,
    pub r_primary: f64,
    pub r_secondary: f64,
    pub copper_loss: f64,
    pub core_loss: f64,
    pub b_peak: f64,
}

impl TransformerDesign<'_> {
    pub fn total_loss(&self) -> f64 {
        self.copper_loss + self.core_loss
    }
}

fn winding_resistance(resistivity: f64, turns: u32, mlt: f64, area: f64) -> f64 {
    if area > 0.0 {
        resistivity * f64::from(turns) * mlt / area
    } else {
        0.0
    }
}

fn ceil_turns(value: f64) -> u32 {
    if value.is_finite() && value >= 1.0 {
        value.ceil().min(f64::from(u32::MAX)) as u32
    } else {
        1
    }
}

/// Pick the core by area product, then size turns, wire and losses.
///
/// `None` when no core reaches the area product.
pub fn design_transformer<'a>(spec: &TransformerSpec, cores: impl IntoIterator<Item = &'a Core>) -> Option<TransformerDesign<'a>> {
    let required = area_product(spec.p_out, spec.ku, spec.b_max, spec.j_max, spec.f_sw, spec.efficiency);
    let core = select_core_by_area_product(cores, required)?;

    let n_primary = ceil_turns(spec.lm * spec.i_mag / (spec.b_max * core.ae));
    let n_secondary = if spec.turns_ratio > 0.0 {
        ceil_turns(f64::from(n_primary) / spec.turns_ratio)
    } else {
        1
    };

    let primary_wire = wire_gauge(spec.i_primary_rms, spec.j_max);
    let secondary_wire = wire_gauge(spec.i_secondary_rms, spec.j_max);
    let rho = copper_resistivity(spec.temperature);
    let r_primary = winding_resistance(rho, n_primary, core.mlt, primary_wire.area);
    let r_secondary = winding_resistance(rho, n_secondary, core.mlt, secondary_wire.area);
    let copper_loss = spec.i_primary_rms.powi(2) * r_primary + spec.i_secondary_rms.powi(2) * r_secondary;

    let b_peak = spec.i_mag * spec.lm / (f64::from(n_primary) * core.ae);
    let law = CoreLossLaw::classify(&core.loss);

    Some(TransformerDesign {
        core,
        area_product: required,
        n_primary,
        n_secondary,
        primary_wire,
        secondary_wire,
        r_primary,
        r_secondary,
        copper_loss,
        core_loss: core_loss(&law, spec.f_sw, b_peak, core.ve, spec.p_out),
        b_peak,
    })
}

// ============ Resonant inductor ============

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResonantInductorSpec {
    pub lr: f64,
    pub i_peak: f64,
    pub i_rms: f64,
    pub f_sw: f64,
    pub p_out: f64,
    pub b_max: f64,
    pub j_max: f64,
    pub ku: f64,
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResonantInductorDesign<'a> {
    #[serde(skip)]
    pub core: &'a Core,
    pub area_product: f64,
    pub turns: u32,
    pub wire: WireGauge,
    pub resistance: f64,
    pub copper_loss: f64,
    pub core_loss: f64,
    pub b_peak: f64,
}

impl ResonantInductorDesign<'_> {
    pub fn total_loss(&self) -> f64 {
        self.copper_loss + self.core_loss
    }
}

/// Smallest inductor core by `L·I_max·I_rms/(B·J·K_u)`, wound for `B_max`.
pub fn design_resonant_inductor<'a>(
    spec: &ResonantInductorSpec,
    cores: impl IntoIterator<Item = &'a Core>,
) -> Option<ResonantInductorDesign<'a>> {
    let required = inductor_area_product(spec.lr, spec.i_peak, spec.i_rms, spec.b_max, spec.j_max, spec.ku);
    let core = select_core_by_area_product(cores, required)?;

    let turns = turns_for_inductance(spec.lr, spec.i_peak, spec.b_max, core.ae, core.al);
    let wire = wire_gauge(spec.i_rms, spec.j_max);
    let resistance = winding_resistance(copper_resistivity(spec.temperature), turns, core.mlt, wire.area)
        * ac_resistance_factor(wire.diameter / 2.0, spec.f_sw);
    let b_peak = spec.lr * spec.i_peak / (f64::from(turns) * core.ae);
    let law = CoreLossLaw::classify(&core.loss);

    Some(ResonantInductorDesign {
        core,
        area_product: required,
        turns,
        wire,
        resistance,
        copper_loss: spec.i_rms.powi(2) * resistance,
        core_loss: core_loss(&law, spec.f_sw, b_peak, core.ve, spec.p_out),
        b_peak,
    })
}
