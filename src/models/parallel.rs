//! Currents of an LLC stage with `ptrf` transformers in parallel.
//!
//! Paralleled transformers share the load current; each one sees the
//! per-transformer turns ratio `round(n/ptrf)` and magnetizing inductance
//! `Lm/ptrf`.

use std::f64::consts::{PI, SQRT_2};

use serde::Serialize;

/// Power handled by one transformer when suggesting a parallel count.
pub const MAX_POWER_PER_TRANSFORMER: f64 = 1000.0;

fn count(ptrf: usize) -> f64 {
    ptrf.max(1) as f64
}

/// `max(1, round(n/ptrf))`, ties to even; `ptrf = 0` counts as 1.
pub fn effective_turns_ratio(n: u32, ptrf: usize) -> u32 {
    let ratio = (f64::from(n) / count(ptrf)).round_ties_even();
    if ratio >= 1.0 {
        ratio as u32
    } else {
        1
    }
}

/// `Lm/ptrf`; `ptrf = 0` counts as 1.
pub fn effective_magnetizing_inductance(lm: f64, ptrf: usize) -> f64 {
    lm / count(ptrf)
}

/// Transformers needed so that none carries more than [`MAX_POWER_PER_TRANSFORMER`].
pub fn optimal_parallel_count(p_out: f64) -> usize {
    let needed = (p_out / MAX_POWER_PER_TRANSFORMER).ceil();
    if needed.is_finite() && needed > 1.0 {
        needed as usize
    } else {
        1
    }
}

/// Operating point of a (possibly paralleled) LLC transformer stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParallelOperatingPoint {
    /// Total turns ratio
    pub n: u32,
    pub v_out: f64,
    pub i_out: f64,
    pub lm: f64,
    pub f_sw: f64,
    pub f0: f64,
    pub ptrf: usize,
}

/// Per-transformer currents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParallelCurrents {
    pub n_eff: u32,
    pub lm_eff: f64,
    pub i_lm_max: f64,
    pub i_lr_rms: f64,
    pub i_sec_rms: f64,
    pub i_lr_max: f64,
    pub ptrf: usize,
    pub i_out_each: f64,
    pub power_each: f64,
}

impl ParallelOperatingPoint {
    /// Peak magnetizing current `n_eff·V_o/(4·Lm_eff·f_s)`.
    pub fn magnetizing_current_peak(&self) -> f64 {
        let n = f64::from(effective_turns_ratio(self.n, self.ptrf));
        let lm = effective_magnetizing_inductance(self.lm, self.ptrf);
        n * self.v_out / (4.0 * lm * self.f_sw)
    }

    /// Resonant-inductor RMS current; a negative radicand clamps to 0.
    pub fn resonant_current_rms(&self) -> f64 {
        let n = f64::from(effective_turns_ratio(self.n, self.ptrf));
        let lm = effective_magnetizing_inductance(self.lm, self.ptrf);
        let i_p = self.i_out / count(self.ptrf);

        let magnetizing = (1.0 / 48.0) * (n * self.v_out / (self.f_sw * lm)).powi(2);
        let load = (PI * PI / 8.0) * (i_p / n * (self.f0 / self.f_sw).sqrt()).powi(2);
        let correction = i_p * self.v_out / lm * 0.5 * (1.0 / self.f_sw - 1.0 / self.f0);

        (magnetizing + load - correction).max(0.0).sqrt()
    }

    /// Secondary RMS current `√2·π·I_p/4·√(f0/f_s)`.
    pub fn secondary_current_rms(&self) -> f64 {
        let i_p = self.i_out / count(self.ptrf);
        SQRT_2 * PI * i_p / 4.0 * (self.f0 / self.f_sw).sqrt()
    }

    /// Resonant-inductor peak current.
    pub fn resonant_current_peak(&self, i_lm_max: f64) -> f64 {
        let n = f64::from(effective_turns_ratio(self.n, self.ptrf));
        let i_p = self.i_out / count(self.ptrf);
        let load = PI * i_p * self.f0 / (2.0 * n * self.f_sw);
        (load * load + i_lm_max * i_lm_max).sqrt()
    }

    pub fn currents(&self) -> ParallelCurrents {
        let i_lm_max = self.magnetizing_current_peak();
        let ptrf = self.ptrf.max(1);
        ParallelCurrents {
            n_eff: effective_turns_ratio(self.n, self.ptrf),
            lm_eff: effective_magnetizing_inductance(self.lm, self.ptrf),
            i_lm_max,
            i_lr_rms: self.resonant_current_rms(),
            i_sec_rms: self.secondary_current_rms(),
            i_lr_max: self.resonant_current_peak(i_lm_max),
            ptrf,
            i_out_each: self.i_out / count(ptrf),
            power_each: self.v_out * self.i_out / count(ptrf),
        }
    }
}
