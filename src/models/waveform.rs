//! Idealized waveforms attached to design reports.

use std::f64::consts::PI;

use serde::Serialize;

use crate::models::resonant::magnetizing_current;

/// `n` evenly spaced points from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// One switching period of an LLC tank.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LlcWaveforms {
    /// Time base of the first bridge leg over one period
    pub t1: Vec<f64>,
    /// `t1` shifted by half a period
    pub t2: Vec<f64>,
    /// Positive resonant-current lobe `(V_in/Z0)·max(0, sin 2πft)`
    pub ilrp: Vec<f64>,
    /// Magnetizing-current ramp `I_mag·(2t/T − 1)`
    pub id1: Vec<f64>,
}

/// Waveforms over one period; empty when `f_sw ≤ 0`.
pub fn llc_waveforms(lr: f64, cr: f64, lm: f64, v_in: f64, f_sw: f64, points: usize) -> LlcWaveforms {
    if f_sw <= 0.0 {
        return LlcWaveforms::default();
    }
    let period = 1.0 / f_sw;
    let z0 = if cr > 0.0 { (lr / cr).sqrt() } else { 0.0 };
    let peak = if z0 > 0.0 { v_in / z0 } else { 0.0 };
    let i_mag = magnetizing_current(v_in, lm, f_sw);

    let t1 = linspace(0.0, period, points);
    let t2 = t1.iter().map(|t| t + period / 2.0).collect();
    let ilrp = t1.iter().map(|t| peak * (2.0 * PI * f_sw * t).sin().max(0.0)).collect();
    let id1 = t1.iter().map(|t| i_mag * (2.0 * t / period - 1.0)).collect();

    LlcWaveforms { t1, t2, ilrp, id1 }
}

/// Boost inductor current over two switching periods.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PfcWaveform {
    pub t: Vec<f64>,
    pub i_l: Vec<f64>,
}

/// `I_avg + ΔI/2·sin(2πft)` over `[0, 2T]`; empty when `f_sw ≤ 0`.
pub fn pfc_inductor_waveform(i_avg: f64, delta_i: f64, f_sw: f64, points: usize) -> PfcWaveform {
    if f_sw <= 0.0 {
        return PfcWaveform::default();
    }
    let t = linspace(0.0, 2.0 / f_sw, points);
    let i_l = t
        .iter()
        .map(|t| i_avg + delta_i / 2.0 * (2.0 * PI * f_sw * t).sin())
        .collect();
    PfcWaveform { t, i_l }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_linspace() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(2.0, 5.0, 1), vec![2.0]);
        let v = linspace(0.0, 1.0, 5);
        assert_eq!(v.len(), 5);
        assert_relative_eq!(v[4], 1.0);
        assert_relative_eq!(v[1], 0.25);
    }

    #[test]
    fn test_llc_waveforms() {
        let w = llc_waveforms(100e-6, 25e-9, 400e-6, 400.0, 100e3, 1000);
        assert_eq!(w.t1.len(), 1000);
        assert_eq!(w.id1.len(), 1000);
        assert_relative_eq!(w.t2[0], 5e-6);
        // Z0 = √(100e-6/25e-9) = 63.2 Ω
        let peak = 400.0 / (100e-6f64 / 25e-9).sqrt();
        assert!(w.ilrp.iter().all(|&i| (0.0..=peak + 1e-9).contains(&i)));
        let i_mag = 400.0 / (4.0 * 100e3 * 400e-6);
        assert_relative_eq!(w.id1[0], -i_mag);
        assert_relative_eq!(w.id1[999], i_mag, max_relative = 1e-12);
        assert!(llc_waveforms(100e-6, 25e-9, 400e-6, 400.0, 0.0, 1000).t1.is_empty());
    }

    #[test]
    fn test_pfc_waveform() {
        let w = pfc_inductor_waveform(2.3, 9.4, 65e3, 200);
        assert_eq!(w.t.len(), 200);
        assert_relative_eq!(w.t[199], 2.0 / 65e3);
        assert_abs_diff_eq!(w.i_l[0], 2.3);
        let max = w.i_l.iter().cloned().fold(f64::MIN, f64::max);
        assert!(max <= 2.3 + 4.7 + 1e-12);
    }
}
