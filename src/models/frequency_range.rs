//! Analytic normalized switching-frequency range of an LLC stage.
//!
//! Squaring the FHA gain equation and collecting powers of the normalized
//! frequency `F = f_sw/f0` gives
//!
//! ```text
//!   Q²·F⁶ + ((1 + 1/Ln)² − 2Q² − 1/M²)·F⁴ + ((−2/Ln)(1 + 1/Ln) + Q²)·F² + 1/Ln² = 0
//! ```
//!
//! which is a cubic in `x = F²`. The largest positive root gives the
//! normalized frequency at which the tank reaches gain `M`.

use std::fmt;

use serde::Serialize;

use crate::solver::real_cubic_roots;

/// Normalized maximum frequency when no root exists for the minimum gain.
pub const DEFAULT_F_MAX: f64 = 1.5;

/// Normalized minimum frequency when no root exists for the maximum gain.
pub const DEFAULT_F_MIN: f64 = 0.8;

/// A range narrower than this share of `f0` (percent) limits regulation.
pub const NARROW_RANGE_PERCENT: f64 = 10.0;

/// A range wider than this share of `f0` (percent) is impractical.
pub const WIDE_RANGE_PERCENT: f64 = 100.0;

/// Largest normalized frequency `F > 0` at which the gain equals `m`.
///
/// `None` when `Q`, `Ln` or `M` is not positive, or when no positive real
/// root exists.
pub fn solve_normalized_frequency(q: f64, ln: f64, m: f64) -> Option<f64> {
    if q <= 0.0 || ln <= 0.0 || m <= 0.0 {
        return None;
    }

    let q2 = q * q;
    let inv_ln = 1.0 / ln;
    let c3 = q2;
    let c2 = (1.0 + inv_ln).powi(2) - 2.0 * q2 - 1.0 / (m * m);
    let c1 = -2.0 * inv_ln * (1.0 + inv_ln) + q2;
    let c0 = inv_ln * inv_ln;

    real_cubic_roots(c3, c2, c1, c0)
        .into_iter()
        .filter(|&x| x > 0.0)
        .map(f64::sqrt)
        .reduce(f64::max)
}

/// Switching-frequency range between two gain extremes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrequencyRange {
    pub f_sw_min: f64,
    pub f_sw_max: f64,
    pub f0: f64,
    /// Normalized minimum `F_min`
    pub f_min_norm: f64,
    /// Normalized maximum `F_max`
    pub f_max_norm: f64,
    pub m_max: f64,
    pub m_min: f64,
}

impl FrequencyRange {
    /// `f_sw_max − f_sw_min`
    pub fn span(&self) -> f64 {
        self.f_sw_max - self.f_sw_min
    }

    /// Span as a percentage of `f0`; 0 when `f0 ≤ 0`.
    pub fn span_percent(&self) -> f64 {
        if self.f0 > 0.0 {
            self.span() / self.f0 * 100.0
        } else {
            0.0
        }
    }

    pub fn validate(&self) -> RangeValidation {
        validate_frequency_range(self.f_sw_min, self.f_sw_max, self.f0)
    }
}

/// Range for gains `[m_min, m_max]`, with defaults for missing roots and the
/// ends swapped if inverted.
pub fn frequency_range(q: f64, ln: f64, m_max: f64, m_min: f64, f0: f64) -> FrequencyRange {
    let mut f_max_norm = solve_normalized_frequency(q, ln, m_min).unwrap_or(DEFAULT_F_MAX);
    let mut f_min_norm = solve_normalized_frequency(q, ln, m_max).unwrap_or(DEFAULT_F_MIN);
    if f_max_norm < f_min_norm {
        std::mem::swap(&mut f_max_norm, &mut f_min_norm);
    }

    FrequencyRange {
        f_sw_min: f_min_norm * f0,
        f_sw_max: f_max_norm * f0,
        f0,
        f_min_norm,
        f_max_norm,
        m_max,
        m_min,
    }
}

/// Range for an LLC stage: gains from the output voltage, the turns ratio and
/// the input-voltage extremes.
pub fn frequency_range_for_llc(
    v_in_min: f64,
    v_in_max: f64,
    v_out: f64,
    n: f64,
    q: f64,
    ln: f64,
    f0: f64,
) -> FrequencyRange {
    let gain = |v_in: f64| if v_in > 0.0 { v_out * n / v_in } else { 0.0 };
    frequency_range(q, ln, gain(v_in_min), gain(v_in_max), f0)
}

/// Problem found in a frequency range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum RangeWarning {
    /// Minimum frequency above resonance, ZVS may be lost
    MinAboveResonance,
    /// Maximum frequency below resonance
    MaxBelowResonance,
    /// Range (percent of `f0`) too narrow to regulate
    Narrow(f64),
    /// Range (percent of `f0`) too wide to be practical
    Wide(f64),
    /// A frequency is zero or negative
    NonPositive,
    /// Maximum not above minimum
    Inverted,
}

impl RangeWarning {
    /// Whether this warning makes the range unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RangeWarning::MinAboveResonance | RangeWarning::NonPositive | RangeWarning::Inverted
        )
    }
}

impl fmt::Display for RangeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeWarning::MinAboveResonance => {
                write!(f, "minimum frequency above resonance, ZVS may be lost")
            }
            RangeWarning::MaxBelowResonance => {
                write!(f, "maximum frequency below resonance, unusual operation")
            }
            RangeWarning::Narrow(p) => write!(f, "narrow frequency range ({p:.1}%), limited regulation"),
            RangeWarning::Wide(p) => write!(f, "very wide frequency range ({p:.1}%), may be impractical"),
            RangeWarning::NonPositive => write!(f, "invalid frequencies (negative or zero)"),
            RangeWarning::Inverted => write!(f, "maximum frequency not greater than minimum frequency"),
        }
    }
}

/// Outcome of [`validate_frequency_range`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeValidation {
    pub is_valid: bool,
    pub warnings: Vec<RangeWarning>,
    pub range_percent: f64,
    pub spans_resonance: bool,
}

/// Check a switching-frequency range against its resonance.
pub fn validate_frequency_range(f_sw_min: f64, f_sw_max: f64, f0: f64) -> RangeValidation {
    let mut warnings = Vec::new();

    if f_sw_min > f0 {
        warnings.push(RangeWarning::MinAboveResonance);
    }
    if f_sw_max < f0 {
        warnings.push(RangeWarning::MaxBelowResonance);
    }

    let range_percent = if f0 > 0.0 {
        (f_sw_max - f_sw_min) / f0 * 100.0
    } else {
        0.0
    };
    if range_percent < NARROW_RANGE_PERCENT {
        warnings.push(RangeWarning::Narrow(range_percent));
    }
    if range_percent > WIDE_RANGE_PERCENT {
        warnings.push(RangeWarning::Wide(range_percent));
    }
    if f_sw_min <= 0.0 || f_sw_max <= 0.0 {
        warnings.push(RangeWarning::NonPositive);
    }
    if f_sw_max <= f_sw_min {
        warnings.push(RangeWarning::Inverted);
    }

    RangeValidation {
        is_valid: !warnings.iter().any(RangeWarning::is_fatal),
        warnings,
        range_percent,
        spans_resonance: f_sw_min <= f0 && f0 <= f_sw_max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn residual(q: f64, ln: f64, m: f64, f: f64) -> f64 {
        let (q2, inv_ln, x) = (q * q, 1.0 / ln, f * f);
        q2 * x.powi(3) + ((1.0 + inv_ln).powi(2) - 2.0 * q2 - 1.0 / (m * m)) * x * x
            + (-2.0 * inv_ln * (1.0 + inv_ln) + q2) * x
            + inv_ln * inv_ln
    }

    #[test]
    fn test_root_satisfies_polynomial() {
        for (q, ln) in [(0.4, 5.0), (0.5, 5.0), (0.3, 7.0)] {
            for m in [0.8, 0.9, 1.0, 1.1, 1.2] {
                let f = solve_normalized_frequency(q, ln, m).unwrap();
                assert!(f > 0.0);
                assert!(residual(q, ln, m, f).abs() < 1e-9, "Q={q} Ln={ln} M={m} F={f}");
            }
        }
    }

    #[test]
    fn test_gain_sets_side_of_resonance() {
        let above = solve_normalized_frequency(0.5, 5.0, 0.8).unwrap();
        let below = solve_normalized_frequency(0.5, 5.0, 1.2).unwrap();
        assert!(above > 1.0);
        assert!(below < 1.0);
        assert_relative_eq!(solve_normalized_frequency(0.4, 5.0, 1.0).unwrap(), 1.0, max_relative = 1e-9);
    }

    #[test]
    fn test_400v_to_48v_range() {
        let range = frequency_range_for_llc(350.0, 450.0, 48.0, 8.0, 0.4, 5.0, 100e3);
        assert_relative_eq!(range.m_max, 384.0 / 350.0);
        assert_relative_eq!(range.m_min, 384.0 / 450.0);
        assert!(range.f_min_norm < 1.0 && range.f_max_norm > 1.0);
        assert!(range.f_sw_min < 100e3 && 100e3 < range.f_sw_max);
        assert!(range.span_percent() > NARROW_RANGE_PERCENT);
        assert!(range.span_percent() < WIDE_RANGE_PERCENT);

        let check = range.validate();
        assert!(check.is_valid);
        assert!(check.spans_resonance);
        assert!(check.warnings.is_empty());
    }

    #[test]
    fn test_invalid_parameters() {
        assert_eq!(solve_normalized_frequency(0.0, 5.0, 1.0), None);
        assert_eq!(solve_normalized_frequency(0.4, -1.0, 1.0), None);
        assert_eq!(solve_normalized_frequency(0.4, 5.0, 0.0), None);
    }

    #[test]
    fn test_defaults_when_unsolvable() {
        let range = frequency_range(0.0, 5.0, 1.2, 0.9, 100e3);
        assert_eq!(range.f_min_norm, DEFAULT_F_MIN);
        assert_eq!(range.f_max_norm, DEFAULT_F_MAX);
        assert_relative_eq!(range.f_sw_min, 80e3);
        assert_relative_eq!(range.f_sw_max, 150e3);
        assert_relative_eq!(range.span_percent(), 70.0);
    }

    #[test]
    fn test_range_is_ordered() {
        let range = frequency_range_for_llc(370.0, 430.0, 48.0, 8.0, 0.4, 5.0, 150e3);
        assert!(range.f_sw_min <= range.f_sw_max);
        assert!(range.m_max > range.m_min);
    }

    #[test]
    fn test_validation() {
        let ok = validate_frequency_range(80e3, 150e3, 100e3);
        assert!(ok.is_valid);
        assert!(ok.warnings.is_empty());
        assert!(ok.spans_resonance);

        let narrow = validate_frequency_range(98e3, 102e3, 100e3);
        assert!(narrow.is_valid);
        assert!(matches!(narrow.warnings[0], RangeWarning::Narrow(_)));

        let above = validate_frequency_range(120e3, 150e3, 100e3);
        assert!(!above.is_valid);
        assert!(above.warnings.contains(&RangeWarning::MinAboveResonance));

        let inverted = validate_frequency_range(150e3, 80e3, 100e3);
        assert!(!inverted.is_valid);
        assert!(inverted.warnings.contains(&RangeWarning::Inverted));
        assert!(inverted.warnings.contains(&RangeWarning::MaxBelowResonance));
    }

    #[test]
    fn test_warning_text() {
        assert!(RangeWarning::Narrow(4.25).to_string().contains("4.2"));
        assert!(RangeWarning::Inverted.to_string().contains("not greater"));
    }
}
