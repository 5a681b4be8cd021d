//! Fixed/swept parameter specs and their value sequences.

use serde::{Deserialize, Serialize};

use super::{AXIS_TOLERANCE, MAX_AXIS_POINTS};

/// How a design parameter is explored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SweepMode {
    /// A single user-chosen value
    Fixed,
    /// An inclusive arithmetic progression
    Swept,
}

impl SweepMode {
    /// Decode the request-layer flag, where `1` means fixed and anything else swept.
    pub fn from_flag(flag: f64) -> Self {
        if (flag - 1.0).abs() < f64::EPSILON {
            SweepMode::Fixed
        } else {
            SweepMode::Swept
        }
    }
}

/// One axis of the design space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepSpec {
    pub mode: SweepMode,
    pub fixed: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl SweepSpec {
    /// A fixed axis. The sweep bounds collapse onto the value.
    pub fn fixed(value: f64) -> Self {
        Self {
            mode: SweepMode::Fixed,
            fixed: value,
            min: value,
            max: value,
            step: 0.0,
        }
    }

    /// A swept axis. `fixed` defaults to `min` and is used when the sweep is empty.
    pub fn swept(min: f64, max: f64, step: f64) -> Self {
        Self {
            mode: SweepMode::Swept,
            fixed: min,
            min,
            max,
            step,
        }
    }

    /// Replace the fallback value of a swept axis.
    pub fn with_fixed(mut self, value: f64) -> Self {
        self.fixed = value;
        self
    }

    /// Multiply every bound by `factor` (unit conversion, e.g. kHz to Hz).
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            mode: self.mode,
            fixed: self.fixed * factor,
            min: self.min * factor,
            max: self.max * factor,
            step: self.step * factor,
        }
    }

    /// Candidate values for this axis.
    pub fn values(&self) -> Vec<f64> {
        generate(self.mode, self.fixed, self.min, self.max, self.step)
    }

    /// Number of values [`values`](Self::values) would produce.
    pub fn len(&self) -> usize {
        self.values().len()
    }

    /// True when the axis produces no value at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Generate the candidate values of one axis.
///
/// * Fixed mode returns `[fixed]`.
/// * Swept mode returns `min, min + step, ...` while the value stays within
///   `max`, i.e. `⌊(max − min)/step⌋ + 1` points.
///
/// Degenerate swept inputs never loop or panic:
/// * `max < min`, or a non-finite `min`/`max`, returns an empty sequence;
/// * `step ≤ 0` or a non-finite step returns `[min]`;
/// * a progression longer than [`MAX_AXIS_POINTS`] is cut at that length.
pub fn generate(mode: SweepMode, fixed: f64, min: f64, max: f64, step: f64) -> Vec<f64> {
    if mode == SweepMode::Fixed {
        return vec![fixed];
    }

    if !min.is_finite() || !max.is_finite() || max < min {
        return Vec::new();
    }
    if !step.is_finite() || step <= 0.0 {
        return vec![min];
    }

    let span = (max - min) / step;
    let count = ((span + span.abs().max(1.0) * AXIS_TOLERANCE).floor() as usize + 1).min(MAX_AXIS_POINTS);

    (0..count)
        .map(|i| (min + i as f64 * step).min(max))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fixed_mode_returns_single_value() {
        for value in [0.8, 45_000.0, -3.0, 0.0] {
            let values = generate(SweepMode::Fixed, value, 1.0, 10.0, 1.0);
            assert_eq!(values, vec![value]);
        }
    }

    #[test]
    fn test_swept_mode_count_and_bounds() {
        let cases = [
            (0.1, 2.0, 0.1),
            (1.0, 6.0, 0.5),
            (300.0, 500.0, 10.0),
            (0.0, 1.0, 0.3),
            (100e-6, 300e-6, 10e-6),
        ];
        for (min, max, step) in cases {
            let values = generate(SweepMode::Swept, min, min, max, step);
            let expected = ((max - min) / step + 1e-9).floor() as usize + 1;
            assert_eq!(values.len(), expected, "count for {min}..{max} step {step}");
            assert_relative_eq!(values[0], min);
            assert!(values.windows(2).all(|w| w[1] > w[0]));
            assert!(values.iter().all(|&v| v >= min && v <= max));
        }
    }

    #[test]
    fn test_swept_mode_includes_max_on_exact_step() {
        let values = generate(SweepMode::Swept, 0.1, 0.1, 2.0, 0.1);
        assert_eq!(values.len(), 20);
        assert_relative_eq!(*values.last().unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_swept_mode_stops_below_max_on_partial_step() {
        let values = generate(SweepMode::Swept, 0.0, 0.0, 1.0, 0.3);
        assert_eq!(values.len(), 4);
        assert_relative_eq!(values[3], 0.9, epsilon = 1e-12);
    }

    #[test]
    fn test_inverted_bounds_yield_empty_sequence() {
        assert!(generate(SweepMode::Swept, 5.0, 6.0, 1.0, 0.5).is_empty());
        assert!(SweepSpec::swept(6.0, 1.0, 0.5).is_empty());
    }

    #[test]
    fn test_non_positive_step_yields_min() {
        assert_eq!(generate(SweepMode::Swept, 0.0, 2.0, 4.0, 0.0), vec![2.0]);
        assert_eq!(generate(SweepMode::Swept, 0.0, 2.0, 4.0, -1.0), vec![2.0]);
        assert_eq!(generate(SweepMode::Swept, 0.0, 2.0, 4.0, f64::NAN), vec![2.0]);
    }

    #[test]
    fn test_min_equals_max() {
        assert_eq!(generate(SweepMode::Swept, 0.0, 3.0, 3.0, 1.0), vec![3.0]);
    }

    #[test]
    fn test_huge_axis_is_capped() {
        let values = generate(SweepMode::Swept, 0.0, 0.0, 1.0, 1e-9);
        assert_eq!(values.len(), MAX_AXIS_POINTS);
    }

    #[test]
    fn test_scaled_spec() {
        let spec = SweepSpec::swept(45.0, 90.0, 5.0).scaled(1e3);
        let values = spec.values();
        assert_eq!(values.len(), 10);
        assert_relative_eq!(values[0], 45e3);
        assert_relative_eq!(values[9], 90e3);
    }

    #[test]
    fn test_mode_flag() {
        assert_eq!(SweepMode::from_flag(1.0), SweepMode::Fixed);
        assert_eq!(SweepMode::from_flag(0.0), SweepMode::Swept);
        assert_eq!(SweepMode::from_flag(2.0), SweepMode::Swept);
    }
}
