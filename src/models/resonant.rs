//! LLC resonant tank model.
//!
//! First-harmonic approximation (FHA) of the series-resonant tank `Lr, Cr`
//! with magnetizing inductance `Lm = Ln·Lr`, loaded by the reflected AC
//! resistance of the rectifier:
//!
//! ```text
//!   f0   = 1 / (2π·√(Lr·Cr))
//!   Q    = √(Lr/Cr) / R_ac
//!   R_ac = 8·n²·V_out² / (π²·P_out)
//!   M    = Ln·fn² / √[(Ln + 1 − Ln/fn²)² + Q²·(fn − 1/fn)²·(Ln + 1)²],  fn = f_sw/f0
//! ```

use std::f64::consts::PI;

use serde::Serialize;
use tracing::debug;

use crate::input::Envelope;
use crate::solver::RootFinder;

/// Resonant frequency below 100 W of output power.
pub const LOW_POWER_RESONANCE: f64 = 100e3;

/// Resonant frequency from 100 W up to 500 W.
pub const MID_POWER_RESONANCE: f64 = 150e3;

/// Resonant frequency from 500 W.
pub const HIGH_POWER_RESONANCE: f64 = 100e3;

/// `1/(2π√(Lr·Cr))`; 0 when `Lr·Cr ≤ 0`.
pub fn resonant_frequency(lr: f64, cr: f64) -> f64 {
    let lc = lr * cr;
    if lc > 0.0 {
        1.0 / (2.0 * PI * lc.sqrt())
    } else {
        0.0
    }
}

/// `√(Lr/Cr)/R_ac`; +∞ when `R_ac ≤ 0`.
pub fn quality_factor(lr: f64, cr: f64, r_ac: f64) -> f64 {
    if r_ac <= 0.0 {
        f64::INFINITY
    } else {
        (lr / cr).sqrt() / r_ac
    }
}

/// `Lm/Lr`; +∞ when `Lr ≤ 0`.
pub fn inductance_ratio(lm: f64, lr: f64) -> f64 {
    if lr <= 0.0 {
        f64::INFINITY
    } else {
        lm / lr
    }
}

/// Reflected AC load `8·n²·V_out²/(π²·P_out)`; +∞ when `P_out ≤ 0`.
pub fn ac_load_resistance(v_out: f64, p_out: f64, n: f64) -> f64 {
    if p_out <= 0.0 {
        f64::INFINITY
    } else {
        8.0 * n * n * v_out * v_out / (PI * PI * p_out)
    }
}

/// Full FHA voltage gain.
///
/// Returns 0 when `f0 ≤ 0`, `Ln ≤ 0` or `f_sw = 0`, and +∞ when the
/// denominator vanishes.
pub fn voltage_gain(f_sw: f64, f0: f64, q: f64, ln: f64) -> f64 {
    if f0 <= 0.0 || ln <= 0.0 {
        return 0.0;
    }
    let fn_ = f_sw / f0;
    if fn_ == 0.0 {
        return 0.0;
    }

    let fn2 = fn_ * fn_;
    let real = ln + 1.0 - ln / fn2;
    let imag = q * (fn_ - 1.0 / fn_) * (ln + 1.0);
    let denominator = (real * real + imag * imag).sqrt();
    if denominator == 0.0 {
        f64::INFINITY
    } else {
        ln * fn2 / denominator
    }
}

/// Simplified gain `1/√[(1 − fn² + fn²/Ln)² + (Q·fn·(1/Ln − 1))²]`.
pub fn voltage_gain_simplified(f_sw: f64, f0: f64, q: f64, ln: f64) -> f64 {
    if f0 <= 0.0 || ln <= 0.0 {
        return 0.0;
    }
    let fn_ = f_sw / f0;
    let fn2 = fn_ * fn_;
    let real = 1.0 - fn2 + fn2 / ln;
    let imag = q * fn_ * (1.0 / ln - 1.0);
    let denominator = (real * real + imag * imag).sqrt();
    if denominator == 0.0 {
        f64::INFINITY
    } else {
        1.0 / denominator
    }
}

/// Resonant frequency chosen for an output power level.
pub fn resonant_frequency_for_power(p_out: f64) -> f64 {
    if p_out < 100.0 {
        LOW_POWER_RESONANCE
    } else if p_out < 500.0 {
        MID_POWER_RESONANCE
    } else {
        HIGH_POWER_RESONANCE
    }
}

/// Side of the resonance a gain target is searched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResonanceRegion {
    /// `[0.3·f0, f0]`
    Below,
    /// `[f0, 3·f0]`
    Above,
}

/// Switching frequency at which the FHA gain equals `m_target`.
///
/// Without a sign change in the bracket the result is `f0`, the bracket end
/// that touches the resonance.
pub fn frequency_for_gain(
    finder: &RootFinder,
    m_target: f64,
    f0: f64,
    q: f64,
    ln: f64,
    region: ResonanceRegion,
) -> f64 {
    let (lo, hi) = match region {
        ResonanceRegion::Below => (0.3 * f0, f0),
        ResonanceRegion::Above => (f0, 3.0 * f0),
    };
    finder
        .brent(|f| voltage_gain(f, f0, q, ln) - m_target, lo, hi)
        .unwrap_or(f0)
}

/// Peak magnetizing current `V_in/(4·f_sw·Lm)`; +∞ when `Lm` or `f_sw` is not positive.
pub fn magnetizing_current(v_in: f64, lm: f64, f_sw: f64) -> f64 {
    if lm <= 0.0 || f_sw <= 0.0 {
        f64::INFINITY
    } else {
        v_in / (4.0 * f_sw * lm)
    }
}

/// Resonant RMS current estimate `P_out/(M·V_in)`; +∞ when `M` or `V_in` is not positive.
pub fn resonant_current(p_out: f64, v_in: f64, m: f64) -> f64 {
    if m <= 0.0 || v_in <= 0.0 {
        f64::INFINITY
    } else {
        p_out / (m * v_in)
    }
}

/// A resonant tank designed for one `(Q, Ln)` target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TankDesign {
    pub lr: f64,
    pub cr: f64,
    pub lm: f64,
    pub f0: f64,
    /// Quality factor recomputed from the designed tank
    pub q: f64,
    pub ln: f64,
    pub r_ac: f64,
    pub m_min: f64,
    pub m_max: f64,
    pub m_nom: f64,
    pub f_sw_min: f64,
    pub f_sw_max: f64,
    pub f_sw_nom: f64,
}

/// Design `Lr, Cr, Lm` for a target quality factor and inductance ratio.
///
/// The turns ratio `n` is usually the loss-corrected one from
/// [`OutputStage`](super::OutputStage). Gains are referred to the nominal
/// output voltage; the operating frequencies come from a Brent search on the
/// gain curve (maximum frequency above resonance for the minimum gain, minimum
/// and nominal frequencies below resonance).
pub fn design_resonant_tank(finder: &RootFinder, envelope: &Envelope, n: f64, q: f64, ln: f64) -> TankDesign {
    let v_out = envelope.v_out_nom;
    let p_out = envelope.p_out;

    let r_ac = ac_load_resistance(v_out, p_out, n);
    let f0 = resonant_frequency_for_power(p_out);
    let omega = 2.0 * PI * f0;

    let lr = q * r_ac / omega;
    let cr = 1.0 / (omega * omega * lr);
    let lm = ln * lr;
    let q_actual = quality_factor(lr, cr, r_ac);

    let gain_at = |v_in: f64| if v_in > 0.0 { v_out * n / v_in } else { 0.0 };
    let m_min = gain_at(envelope.v_in_max);
    let m_max = gain_at(envelope.v_in_min);
    let m_nom = gain_at(envelope.v_in_nom);

    let f_sw_max = frequency_for_gain(finder, m_min, f0, q_actual, ln, ResonanceRegion::Above);
    let f_sw_min = frequency_for_gain(finder, m_max, f0, q_actual, ln, ResonanceRegion::Below);
    let f_sw_nom = frequency_for_gain(finder, m_nom, f0, q_actual, ln, ResonanceRegion::Below);

    debug!(q, ln, n, f0, lr, cr, lm, f_sw_min, f_sw_max, "resonant tank designed");

    TankDesign {
        lr,
        cr,
        lm,
        f0,
        q: q_actual,
        ln,
        r_ac,
        m_min,
        m_max,
        m_nom,
        f_sw_min,
        f_sw_max,
        f_sw_nom,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn envelope(p_out: f64) -> Envelope {
        Envelope {
            v_in_min: 370.0,
            v_in_nom: 400.0,
            v_in_max: 430.0,
            v_out_min: 36.0,
            v_out_nom: 48.0,
            v_out_max: 54.0,
            p_out,
            t_amb: 25.0,
        }
    }

    #[test]
    fn test_resonant_frequency() {
        assert_relative_eq!(resonant_frequency(100e-6, 100e-9), 50_329.2, max_relative = 1e-5);
        assert_eq!(resonant_frequency(0.0, 100e-9), 0.0);
        assert_eq!(resonant_frequency(-1e-6, 100e-9), 0.0);
    }

    #[test]
    fn test_degenerate_loads() {
        assert!(quality_factor(1e-6, 1e-9, 0.0).is_infinite());
        assert!(ac_load_resistance(48.0, 0.0, 8.0).is_infinite());
        assert!(inductance_ratio(1e-3, 0.0).is_infinite());
        assert!(magnetizing_current(400.0, 0.0, 1e5).is_infinite());
        assert!(resonant_current(100.0, 400.0, 0.0).is_infinite());
    }

    #[test]
    fn test_gain_at_resonance_equals_ln() {
        for ln in [2.0, 4.0, 7.5] {
            assert_relative_eq!(voltage_gain(1e5, 1e5, 0.5, ln), ln, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_gain_degenerate_inputs() {
        assert_eq!(voltage_gain(0.0, 1e5, 0.5, 4.0), 0.0);
        assert_eq!(voltage_gain(1e5, 0.0, 0.5, 4.0), 0.0);
        assert_eq!(voltage_gain(1e5, 1e5, 0.5, 0.0), 0.0);
        assert_eq!(voltage_gain_simplified(1e5, 1e5, 0.5, -1.0), 0.0);
    }

    #[test]
    fn test_simplified_gain_at_resonance() {
        // fn = 1: real part is 1/Ln, imaginary part Q·(1/Ln − 1)
        let q = 0.5;
        let ln = 4.0;
        let expected = 1.0 / ((1.0f64 / ln).powi(2) + (q * (1.0 / ln - 1.0)).powi(2)).sqrt();
        assert_relative_eq!(voltage_gain_simplified(1e5, 1e5, q, ln), expected);
    }

    #[test]
    fn test_resonance_breakpoints() {
        assert_eq!(resonant_frequency_for_power(50.0), 100e3);
        assert_eq!(resonant_frequency_for_power(100.0), 150e3);
        assert_eq!(resonant_frequency_for_power(499.9), 150e3);
        assert_eq!(resonant_frequency_for_power(500.0), 100e3);
    }

    #[test]
    fn test_frequency_for_gain_below_resonance() {
        let finder = RootFinder::new();
        let f0 = 100e3;
        let f = frequency_for_gain(&finder, 1.0, f0, 0.8, 4.0, ResonanceRegion::Below);
        assert!(f > 0.3 * f0 && f < f0);
        assert_abs_diff_eq!(voltage_gain(f, f0, 0.8, 4.0), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_frequency_for_gain_without_root_returns_f0() {
        let finder = RootFinder::new();
        // The gain never drops to 0.01 above resonance
        let f = frequency_for_gain(&finder, 0.01, 100e3, 0.8, 4.0, ResonanceRegion::Above);
        assert_eq!(f, 100e3);
        let f = frequency_for_gain(&finder, 50.0, 100e3, 0.8, 4.0, ResonanceRegion::Below);
        assert_eq!(f, 100e3);
    }

    #[test]
    fn test_tank_round_trip() {
        let env = envelope(300.0);
        let tank = design_resonant_tank(&RootFinder::new(), &env, 8.0, 0.4, 5.0);

        assert_relative_eq!(tank.f0, 150e3);
        assert_relative_eq!(resonant_frequency(tank.lr, tank.cr), tank.f0, max_relative = 1e-9);
        assert_relative_eq!(quality_factor(tank.lr, tank.cr, tank.r_ac), 0.4, max_relative = 1e-9);
        assert_relative_eq!(inductance_ratio(tank.lm, tank.lr), 5.0, max_relative = 1e-12);
        assert_relative_eq!(tank.m_min, 48.0 * 8.0 / 430.0);
        assert!(tank.m_min < tank.m_nom && tank.m_nom < tank.m_max);
        assert!(tank.f_sw_min <= tank.f0);
        assert!(tank.f_sw_max >= tank.f0);
    }
}
