//! Core-loss law selection.
//!
//! Catalog cores carry one set of four coefficients. Large values can only be
//! the mT-based polynomial fit of loss density, anything else is read as
//! Steinmetz `k, α, β`.

use serde::Serialize;

use crate::catalog::LossCoefficients;

/// Above this `a` coefficient the data is a polynomial fit.
pub const POLYNOMIAL_A_THRESHOLD: f64 = 1000.0;

/// Above this `b` coefficient the data is a polynomial fit.
pub const POLYNOMIAL_B_THRESHOLD: f64 = 10.0;

/// Share of the output power charged as core loss without usable data.
pub const NO_DATA_LOSS_FRACTION: f64 = 0.01;

/// Results above this share of the output power are not trusted.
pub const IMPLAUSIBLE_LOSS_FRACTION: f64 = 0.5;

/// Share of the output power that replaces an untrusted result.
pub const CLIPPED_LOSS_FRACTION: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum CoreLossLaw {
    /// `P_v = a·B⁴ + b·B³ + c·B² + d·B` in mW/cm³ with `B` in mT
    Polynomial { a: f64, b: f64, c: f64, d: f64 },
    /// `P_v = k·f^α·B^β` in W/m³ with `f` in Hz and `B` in T
    Steinmetz { k: f64, alpha: f64, beta: f64 },
}

impl CoreLossLaw {
    pub fn classify(coefficients: &LossCoefficients) -> Self {
        let LossCoefficients { a, b, c, d } = *coefficients;
        if a > POLYNOMIAL_A_THRESHOLD || b > POLYNOMIAL_B_THRESHOLD {
            CoreLossLaw::Polynomial { a, b, c, d }
        } else {
            CoreLossLaw::Steinmetz {
                k: a,
                alpha: b,
                beta: c,
            }
        }
    }

    /// Loss in W of `volume_m3` of material; `None` without usable data.
    pub fn evaluate(&self, f: f64, b_peak: f64, volume_m3: f64) -> Option<f64> {
        if b_peak <= 0.0 {
            return None;
        }
        match *self {
            CoreLossLaw::Polynomial { a, b, c, d } => {
                let b_mt = b_peak * 1e3;
                let density = (a * b_mt.powi(4) + b * b_mt.powi(3) + c * b_mt.powi(2) + d * b_mt).abs();
                Some(density * volume_m3 * 1e6 / 1e3)
            }
            CoreLossLaw::Steinmetz { k, alpha, beta } => {
                (k > 0.0).then(|| k * f.powf(alpha) * b_peak.powf(beta) * volume_m3)
            }
        }
    }
}

/// Core loss in W, bounded by the output power.
///
/// Without usable data the loss is [`NO_DATA_LOSS_FRACTION`] of `p_out`; a
/// non-finite result or one above [`IMPLAUSIBLE_LOSS_FRACTION`] of `p_out`
/// becomes [`CLIPPED_LOSS_FRACTION`] of `p_out`.
pub fn core_loss(law: &CoreLossLaw, f: f64, b_peak: f64, volume_m3: f64, p_out: f64) -> f64 {
    let loss = law
        .evaluate(f, b_peak, volume_m3)
        .unwrap_or(NO_DATA_LOSS_FRACTION * p_out);
    if !loss.is_finite() || loss > IMPLAUSIBLE_LOSS_FRACTION * p_out {
        CLIPPED_LOSS_FRACTION * p_out
    } else {
        loss
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_classification() {
        let poly = CoreLossLaw::classify(&LossCoefficients::polynomial(5000.0, 20.0, 1.0, 0.5));
        assert!(matches!(poly, CoreLossLaw::Polynomial { .. }));
        let poly_b = CoreLossLaw::classify(&LossCoefficients::polynomial(1.0, 11.0, 0.0, 0.0));
        assert!(matches!(poly_b, CoreLossLaw::Polynomial { .. }));

        let steinmetz = CoreLossLaw::classify(&LossCoefficients::steinmetz(50.0, 1.5, 2.5));
        assert_eq!(
            steinmetz,
            CoreLossLaw::Steinmetz {
                k: 50.0,
                alpha: 1.5,
                beta: 2.5
            }
        );
    }

    #[test]
    fn test_polynomial_loss() {
        let law = CoreLossLaw::classify(&LossCoefficients::polynomial(5000.0, 0.0, 0.0, 0.0));
        // 0.01 T = 10 mT: 5000·10⁴ mW/cm³ over 1 cm³ is 50 kW
        let loss = law.evaluate(100e3, 0.01, 1e-6).unwrap();
        assert_relative_eq!(loss, 50_000.0, max_relative = 1e-12);
        let bounded = core_loss(&law, 100e3, 0.01, 1e-6, 100.0);
        assert_relative_eq!(bounded, 2.0);
        let small = core_loss(&law, 100e3, 0.001, 1e-6, 1000.0);
        assert_relative_eq!(small, 5.0, max_relative = 1e-12);
    }

    #[test]
    fn test_steinmetz_loss() {
        let law = CoreLossLaw::classify(&LossCoefficients::steinmetz(50.0, 1.5, 2.5));
        let expected = 50.0 * 1e4f64.powf(1.5) * 0.1f64.powf(2.5) * 1e-6;
        let loss = core_loss(&law, 1e4, 0.1, 1e-6, 500.0);
        assert_relative_eq!(loss, expected, max_relative = 1e-12);
        assert!(loss.is_finite() && loss >= 0.0);
    }

    #[test]
    fn test_missing_data_and_clipping() {
        let no_k = CoreLossLaw::classify(&LossCoefficients::steinmetz(0.0, 1.5, 2.5));
        assert_relative_eq!(core_loss(&no_k, 1e5, 0.1, 1e-5, 500.0), 5.0);

        let law = CoreLossLaw::classify(&LossCoefficients::steinmetz(50.0, 1.5, 2.5));
        assert_relative_eq!(core_loss(&law, 1e5, 0.0, 1e-5, 500.0), 5.0);
        assert_relative_eq!(core_loss(&law, f64::INFINITY, 0.1, 1e-5, 500.0), 10.0);
        assert_relative_eq!(core_loss(&law, 1e9, 1.0, 1.0, 500.0), 10.0);
    }
}
