//! Capacitance requirement and capacitor bank selection.
//!
//! A bank is `n` identical parts in parallel, enough for both the required
//! capacitance and the ripple current. Banks are ranked by a weighted sum of
//! volume (cm³), cost and ESR loss (mW).

use std::f64::consts::PI;

use serde::Serialize;
use tracing::debug;

use crate::catalog::Capacitor;

/// Parts must be rated at least `V/VOLTAGE_DERATING`.
pub const VOLTAGE_DERATING: f64 = 0.8;

/// Cost assumed for a capacitor without a price.
pub const UNKNOWN_CAPACITOR_COST: f64 = 100.0;

pub const DEFAULT_HOLDUP_VOLTAGE_RATIO: f64 = 0.9;
pub const DEFAULT_LINE_FREQUENCY: f64 = 50.0;
pub const DEFAULT_RIPPLE_FRACTION: f64 = 0.05;
pub const DEFAULT_HOLD_UP_TIME: f64 = 20e-3;

const VOLUME_WEIGHT: f64 = 0.4;
const COST_WEIGHT: f64 = 0.3;
const LOSS_WEIGHT: f64 = 0.3;

/// `2·P·T/(V² − V_min²)`; 0 when `V ≤ V_min`.
pub fn holdup_capacitance(p_out: f64, t_hold: f64, v_out: f64, v_min: f64) -> f64 {
    let denominator = v_out * v_out - v_min * v_min;
    if denominator <= 0.0 {
        0.0
    } else {
        2.0 * p_out * t_hold / denominator
    }
}

/// `P/(2π·f·ΔV·V)`; 0 when the denominator is not positive.
pub fn ripple_capacitance(p_out: f64, f_ripple: f64, delta_v: f64, v_out: f64) -> f64 {
    let denominator = 2.0 * PI * f_ripple * delta_v * v_out;
    if denominator <= 0.0 {
        0.0
    } else {
        p_out / denominator
    }
}

/// RMS current in a boost output bus: switching plus line ripple.
pub fn bus_ripple_current(i_out: f64) -> f64 {
    i_out * ((PI * PI / 8.0 - 1.0) + 0.5 * 0.5 / 12.0).sqrt()
}

/// RMS current in a full-wave rectifier output filter.
pub fn output_ripple_current(i_out: f64) -> f64 {
    i_out * (PI * PI / 8.0 - 1.0).sqrt()
}

/// What a capacitor bank has to provide.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CapacitorRequirement {
    pub p_out: f64,
    pub v_out: f64,
    pub v_out_min: f64,
    /// Hold-up time (s); 0 disables the hold-up constraint
    pub t_hold: f64,
    pub f_ripple: f64,
    /// Allowed peak-to-peak voltage ripple (V)
    pub delta_v: f64,
    /// RMS ripple current the bank must carry (A)
    pub ripple_current: f64,
}

impl CapacitorRequirement {
    pub fn new(p_out: f64, v_out: f64) -> Self {
        Self {
            p_out,
            v_out,
            v_out_min: DEFAULT_HOLDUP_VOLTAGE_RATIO * v_out,
            t_hold: DEFAULT_HOLD_UP_TIME,
            f_ripple: DEFAULT_LINE_FREQUENCY,
            delta_v: DEFAULT_RIPPLE_FRACTION * v_out,
            ripple_current: 0.0,
        }
    }

    pub fn with_holdup(mut self, t_hold: f64, v_out_min: f64) -> Self {
        self.t_hold = t_hold;
        self.v_out_min = v_out_min;
        self
    }

    pub fn without_holdup(mut self) -> Self {
        self.t_hold = 0.0;
        self
    }

    /// Ripple at `f_ripple` limited to `fraction` of the output voltage.
    pub fn with_ripple(mut self, f_ripple: f64, fraction: f64) -> Self {
        self.f_ripple = f_ripple;
        self.delta_v = fraction * self.v_out;
        self
    }

    pub fn with_ripple_current(mut self, amps: f64) -> Self {
        self.ripple_current = amps;
        self
    }

    pub fn holdup(&self) -> f64 {
        holdup_capacitance(self.p_out, self.t_hold, self.v_out, self.v_out_min)
    }

    pub fn ripple(&self) -> f64 {
        ripple_capacitance(self.p_out, self.f_ripple, self.delta_v, self.v_out)
    }

    /// `max(C_holdup, C_ripple)`
    pub fn capacitance(&self) -> f64 {
        self.holdup().max(self.ripple())
    }

    pub fn min_rated_voltage(&self) -> f64 {
        self.v_out / VOLTAGE_DERATING
    }
}

/// A chosen bank of identical capacitors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacitorBank<'a> {
    #[serde(skip)]
    pub part: &'a Capacitor,
    pub count: u32,
    pub total_capacitance: f64,
    pub volume_cm3: f64,
    pub cost: f64,
    /// ESR loss (W)
    pub loss: f64,
    pub score: f64,
}

fn ceil_count(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.ceil().min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

fn bank<'a>(part: &'a Capacitor, requirement: &CapacitorRequirement, c_required: f64) -> Option<CapacitorBank<'a>> {
    if part.capacitance <= 0.0 {
        return None;
    }
    let by_capacitance = ceil_count(c_required / part.capacitance);
    let by_current = match part.ripple_current {
        Some(rated) if rated > 0.0 => ceil_count(requirement.ripple_current / rated),
        _ => 0,
    };
    let count = by_capacitance.max(by_current).max(1);
    let n = f64::from(count);

    let volume_cm3 = PI * (part.diameter / 2.0).powi(2) * part.height * n / 1000.0;
    let cost = part.cost.unwrap_or(UNKNOWN_CAPACITOR_COST) * n;
    let loss = if part.esr > 0.0 && requirement.ripple_current > 0.0 {
        requirement.ripple_current.powi(2) * part.esr / n
    } else {
        0.0
    };

    Some(CapacitorBank {
        part,
        count,
        total_capacitance: part.capacitance * n,
        volume_cm3,
        cost,
        loss,
        score: VOLUME_WEIGHT * volume_cm3 + COST_WEIGHT * cost + LOSS_WEIGHT * loss * 1000.0,
    })
}

/// Lowest-score bank among parts rated for the derated voltage.
///
/// Ties keep the first part; `None` when no part is eligible.
pub fn select_capacitors<'a>(
    requirement: &CapacitorRequirement,
    candidates: impl IntoIterator<Item = &'a Capacitor>,
) -> Option<CapacitorBank<'a>> {
    let c_required = requirement.capacitance();
    let v_min = requirement.min_rated_voltage();
    debug!(c_required, v_min, "selecting capacitor bank");

    candidates
        .into_iter()
        .filter(|part| part.voltage >= v_min)
        .filter_map(|part| bank(part, requirement, c_required))
        .fold(None, |best: Option<CapacitorBank<'a>>, bank| match best {
            Some(b) if b.score <= bank.score => Some(b),
            _ => Some(bank),
        })
}
