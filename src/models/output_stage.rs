//! Output-stage parameters and the loss-corrected turns ratio.
//!
//! The transformer ratio is sized for the output voltage plus the voltage
//! drop that the expected conversion losses represent at full load:
//! `V_loss = P_out·(1 − η)/(I_out·η)`.

use std::f64::consts::PI;

use serde::Serialize;

use crate::input::Envelope;

/// Output current `P_out/V_out`; 0 when `V_out ≤ 0`.
pub fn battery_current(p_out: f64, v_out: f64) -> f64 {
    if v_out <= 0.0 {
        0.0
    } else {
        p_out / v_out
    }
}

/// Load resistance `V_out/I_out`; +∞ when `I_out ≤ 0`.
pub fn load_resistance(v_out: f64, i_out: f64) -> f64 {
    if i_out <= 0.0 {
        f64::INFINITY
    } else {
        v_out / i_out
    }
}

/// Equivalent voltage drop of the losses; 0 when `η ≤ 0` or `I_out ≤ 0`.
///
/// `efficiency` is a fraction.
pub fn voltage_loss(p_out: f64, i_out: f64, efficiency: f64) -> f64 {
    if efficiency <= 0.0 || i_out <= 0.0 {
        0.0
    } else {
        p_out * (1.0 - efficiency) / (i_out * efficiency)
    }
}

/// `round(V_in/(V_out + V_loss))`, ties to even, at least 1.
pub fn turns_ratio_corrected(v_in: f64, v_out: f64, v_loss: f64) -> u32 {
    let v_corrected = v_out + v_loss;
    if v_corrected <= 0.0 {
        return 1;
    }
    let ratio = (v_in / v_corrected).round_ties_even();
    if ratio.is_finite() && ratio >= 1.0 {
        ratio.min(u32::MAX as f64) as u32
    } else {
        1
    }
}

/// Rectifier-reflected resistance `8·n²·R_load/π²`.
pub fn equivalent_resistance(turns_ratio: u32, r_load: f64) -> f64 {
    let n = f64::from(turns_ratio);
    8.0 * n * n * r_load / (PI * PI)
}

/// Gain the tank must reach at the input-voltage extremes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GainLimits {
    pub m_g_max: f64,
    pub m_g_min: f64,
    pub v_out_corrected: f64,
}

/// `n·(V_out + V_loss)/V_in` at both input extremes; 1.0 for both when an input is not positive.
pub fn gain_limits(turns_ratio: u32, v_out: f64, v_loss: f64, v_in_min: f64, v_in_max: f64) -> GainLimits {
    let v_out_corrected = v_out + v_loss;
    if v_in_min <= 0.0 || v_in_max <= 0.0 {
        return GainLimits {
            m_g_max: 1.0,
            m_g_min: 1.0,
            v_out_corrected,
        };
    }
    let n = f64::from(turns_ratio);
    GainLimits {
        m_g_max: n * v_out_corrected / v_in_min,
        m_g_min: n * v_out_corrected / v_in_max,
        v_out_corrected,
    }
}

/// All output-stage quantities for one envelope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutputStage {
    pub i_bat: f64,
    pub r_load: f64,
    pub v_loss: f64,
    pub turns_ratio: u32,
    pub r_e: f64,
    pub limits: GainLimits,
}

impl OutputStage {
    /// Evaluate at nominal input and output voltage with the assumed efficiency (fraction).
    pub fn from_envelope(envelope: &Envelope, efficiency: f64) -> Self {
        let v_out = envelope.v_out_nom;
        let i_bat = battery_current(envelope.p_out, v_out);
        let r_load = load_resistance(v_out, i_bat);
        let v_loss = voltage_loss(envelope.p_out, i_bat, efficiency);
        let turns_ratio = turns_ratio_corrected(envelope.v_in_nom, v_out, v_loss);
        Self {
            i_bat,
            r_load,
            v_loss,
            turns_ratio,
            r_e: equivalent_resistance(turns_ratio, r_load),
            limits: gain_limits(turns_ratio, v_out, v_loss, envelope.v_in_min, envelope.v_in_max),
        }
    }
}
