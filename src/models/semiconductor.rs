//! FET loss model, ZVS feasibility and dead time.
//!
//! The primitive terms are independent of topology; [`llc_primary_losses`],
//! [`llc_secondary_losses`] and [`pfc_switch_losses`] compose them for the
//! three switch positions the optimizers size.

use std::f64::consts::{PI, SQRT_2};

use serde::Serialize;

use crate::catalog::Fet;

/// On-resistance derating for a junction near 100 °C.
pub const HOT_RDSON_FACTOR: f64 = 1.5;

/// Gate-drive amplitude (V).
pub const GATE_DRIVE_VOLTAGE: f64 = 12.0;

/// External gate resistance in series with the FET's own (Ω).
pub const EXTERNAL_GATE_RESISTANCE: f64 = 5.0;

/// Fall time used when the gate data cannot give one (s).
pub const DEFAULT_FALL_TIME: f64 = 50e-9;

/// Dead time used when neither the charge nor the resonant estimate applies (s).
pub const DEFAULT_DEAD_TIME: f64 = 200e-9;

/// Body-diode forward drop (V).
pub const BODY_DIODE_VOLTAGE: f64 = 0.7;

/// Body-diode conduction per edge in a synchronous rectifier (s).
pub const BODY_DIODE_CONDUCTION_TIME: f64 = 50e-9;

const LLC_PRIMARY_SWITCHES: f64 = 4.0;
const LLC_SECONDARY_SWITCHES: f64 = 2.0;

/// `count·I_rms²·R_dson·1.5`; `r_dson` is the 25 °C datasheet value.
pub fn conduction_loss(count: f64, i_rms: f64, r_dson: f64) -> f64 {
    count * i_rms * i_rms * r_dson * HOT_RDSON_FACTOR
}

/// Linear-transition switching loss `count·0.5·V·I·(t_r + t_f)·f`.
pub fn switching_loss_linear(count: f64, v_ds: f64, i_sw: f64, t_rise: f64, t_fall: f64, f_sw: f64) -> f64 {
    count * 0.5 * v_ds * i_sw * (t_rise + t_fall) * f_sw
}

/// Datasheet-energy switching loss `(E_on + E_off)·f·count`.
pub fn switching_loss_energy(count: f64, e_on: f64, e_off: f64, f_sw: f64) -> f64 {
    (e_on + e_off) * f_sw * count
}

pub fn gate_loss(count: f64, q_g: f64, v_gs: f64, f_sw: f64) -> f64 {
    count * q_g * v_gs * f_sw
}

/// Energy stored in `C_oss` dumped at every hard turn-on.
pub fn coss_loss(count: f64, c_oss: f64, v_ds: f64, f_sw: f64) -> f64 {
    count * 0.5 * c_oss * v_ds * v_ds * f_sw
}

/// `Q_rr·V·f`, for a freewheeling diode or a body diode.
pub fn reverse_recovery_loss(q_rr: f64, v: f64, f_sw: f64) -> f64 {
    q_rr * v * f_sw
}

/// Body-diode conduction during dead time `count·V_sd·I_sd·t_dead·f`.
pub fn body_diode_loss(count: f64, v_sd: f64, i_sd: f64, t_dead: f64, f_sw: f64) -> f64 {
    count * v_sd * i_sd * t_dead * f_sw
}

/// Miller fall time `(R_g + R_g,ext)·C_iss·ln(V_plateau/V_th)`.
///
/// Falls back to [`DEFAULT_FALL_TIME`] when `V_th ≤ 0`, `V_plateau ≤ V_th`
/// or the product is not a positive finite time.
pub fn gate_fall_time(r_g: f64, r_g_ext: f64, c_iss: f64, v_plateau: f64, v_th: f64) -> f64 {
    if v_th <= 0.0 || v_plateau <= v_th {
        return DEFAULT_FALL_TIME;
    }
    let t = (r_g + r_g_ext) * c_iss * (v_plateau / v_th).ln();
    if t.is_finite() && t > 0.0 {
        t
    } else {
        DEFAULT_FALL_TIME
    }
}

/// Fall time of a catalog FET driven through [`EXTERNAL_GATE_RESISTANCE`].
pub fn fet_fall_time(fet: &Fet) -> f64 {
    match (fet.c_iss, fet.v_plateau, fet.v_th) {
        (Some(c_iss), Some(v_plateau), Some(v_th)) => gate_fall_time(
            fet.r_g.unwrap_or(0.0),
            EXTERNAL_GATE_RESISTANCE,
            c_iss,
            v_plateau,
            v_th,
        ),
        _ => DEFAULT_FALL_TIME,
    }
}

/// Inductive versus capacitive energy at the switching edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZvsCheck {
    pub energy_inductive: f64,
    pub energy_capacitive: f64,
    pub achieved: bool,
    /// `(E_L − E_C)/E_C` in percent; 0 when `E_C = 0`
    pub margin_percent: f64,
}

pub fn check_zvs(lm: f64, lr: f64, i_lr_max: f64, c_eq: f64, v_dc: f64) -> ZvsCheck {
    let energy_inductive = 0.5 * (lm + lr) * i_lr_max * i_lr_max;
    let energy_capacitive = 0.5 * c_eq * v_dc * v_dc;
    let margin_percent = if energy_capacitive == 0.0 {
        0.0
    } else {
        (energy_inductive - energy_capacitive) / energy_capacitive * 100.0
    };
    ZvsCheck {
        energy_inductive,
        energy_capacitive,
        achieved: energy_inductive >= energy_capacitive,
        margin_percent,
    }
}

/// Shortest dead time that lets the magnetizing current swing the bridge node.
pub fn min_dead_time(c_eq: f64, v_dc: f64, i_mag: f64, lm: f64) -> f64 {
    if i_mag > 0.0 {
        c_eq * v_dc / i_mag
    } else if lm > 0.0 {
        PI / 2.0 * (lm * c_eq).sqrt()
    } else {
        DEFAULT_DEAD_TIME
    }
}

/// Loss breakdown of one switch position (all devices together), in W.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FetLosses {
    pub conduction: f64,
    pub switching: f64,
    pub gate: f64,
    pub coss: f64,
    pub reverse_recovery: f64,
    pub body_diode: f64,
}

impl FetLosses {
    pub fn total(&self) -> f64 {
        self.conduction + self.switching + self.gate + self.coss + self.reverse_recovery + self.body_diode
    }

    /// Transition losses reported as one figure: switching, `C_oss` and recovery.
    pub fn switching_total(&self) -> f64 {
        self.switching + self.coss + self.reverse_recovery
    }

    /// Every term multiplied by `k`, for `k` identical switch positions.
    pub fn scaled(&self, k: f64) -> Self {
        Self {
            conduction: self.conduction * k,
            switching: self.switching * k,
            gate: self.gate * k,
            coss: self.coss * k,
            reverse_recovery: self.reverse_recovery * k,
            body_diode: self.body_diode * k,
        }
    }
}

/// Operating point of the LLC full-bridge primary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimaryOperatingPoint {
    pub i_lr_rms: f64,
    pub i_lr_max: f64,
    pub i_lm_max: f64,
    /// Bridge supply voltage
    pub v_dc: f64,
    pub f_sw: f64,
    pub zvs: bool,
}

/// Four switches sharing `I_Lr_rms/√2` each.
///
/// With ZVS only the turn-off at the magnetizing current remains; otherwise
/// the switches hard-switch `I_Lr_max` and dump their `C_oss` and recovery
/// charge.
pub fn llc_primary_losses(fet: &Fet, op: &PrimaryOperatingPoint) -> FetLosses {
    let m = LLC_PRIMARY_SWITCHES;
    let i_switch = op.i_lr_rms / SQRT_2;

    let (switching, coss, reverse_recovery) = if op.zvs {
        let switching = match fet.switching_energy() {
            Some((_, e_off)) => e_off * op.f_sw * m,
            None => m * 0.5 * op.v_dc * op.i_lm_max * fet_fall_time(fet) * op.f_sw,
        };
        (switching, 0.0, 0.0)
    } else {
        let switching = match fet.switching_energy() {
            Some((e_on, e_off)) => switching_loss_energy(m, e_on, e_off, op.f_sw),
            None => switching_loss_linear(m, op.v_dc, op.i_lr_max, fet.t_rise, fet.t_fall, op.f_sw),
        };
        (
            switching,
            coss_loss(m, fet.c_oss, op.v_dc, op.f_sw),
            reverse_recovery_loss(fet.q_rr, op.v_dc, op.f_sw),
        )
    };

    FetLosses {
        conduction: conduction_loss(m, i_switch, fet.r_dson),
        switching,
        gate: gate_loss(m, fet.q_g, GATE_DRIVE_VOLTAGE, op.f_sw),
        coss,
        reverse_recovery,
        body_diode: 0.0,
    }
}

/// Centre-tapped synchronous rectifier: two switches, each `I_sec_rms/√2`,
/// blocking `2·V_out`.
pub fn llc_secondary_losses(fet: &Fet, i_sec_rms: f64, v_out: f64, f_sw: f64) -> FetLosses {
    let m = LLC_SECONDARY_SWITCHES;
    let v_block = 2.0 * v_out;
    FetLosses {
        conduction: conduction_loss(m, i_sec_rms / SQRT_2, fet.r_dson),
        switching: 0.0,
        gate: gate_loss(m, fet.q_g, GATE_DRIVE_VOLTAGE, f_sw),
        coss: 0.0,
        reverse_recovery: m * reverse_recovery_loss(fet.q_rr, v_block, f_sw),
        body_diode: body_diode_loss(
            m,
            BODY_DIODE_VOLTAGE,
            0.5 * i_sec_rms,
            BODY_DIODE_CONDUCTION_TIME,
            f_sw,
        ),
    }
}

/// Operating point of a boost PFC switch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostOperatingPoint {
    pub i_in_rms: f64,
    /// Average current at the switching edges `P/(η·V_in_rms)`
    pub i_sw_avg: f64,
    pub v_out: f64,
    pub f_sw: f64,
}

pub fn pfc_switch_losses(fet: &Fet, op: &BoostOperatingPoint) -> FetLosses {
    let m = 1.0;
    let switching = match fet.switching_energy() {
        Some((e_on, e_off)) => switching_loss_energy(m, e_on, e_off, op.f_sw),
        None => switching_loss_linear(m, op.v_out, op.i_sw_avg, fet.t_rise, fet.t_fall, op.f_sw),
    };
    FetLosses {
        conduction: conduction_loss(m, op.i_in_rms, fet.r_dson),
        switching,
        gate: gate_loss(m, fet.q_g, GATE_DRIVE_VOLTAGE, op.f_sw),
        coss: coss_loss(m, fet.c_oss, op.v_out, op.f_sw),
        reverse_recovery: reverse_recovery_loss(fet.q_rr, op.v_out, op.f_sw),
        body_diode: 0.0,
    }
}
