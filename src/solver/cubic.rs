//! Closed-form real roots of low-order polynomials.

use std::f64::consts::PI;

use super::COEFFICIENT_EPSILON;

/// Real roots of `a·x² + b·x + c = 0`, ascending. Degenerates to the linear case.
pub fn real_quadratic_roots(a: f64, b: f64, c: f64) -> Vec<f64> {
    if a.abs() < COEFFICIENT_EPSILON {
        if b.abs() < COEFFICIENT_EPSILON {
            return Vec::new();
        }
        return vec![-c / b];
    }

    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return Vec::new();
    }
    if disc == 0.0 {
        return vec![-b / (2.0 * a)];
    }

    // Numerically stable form, avoids cancellation in -b ± √disc
    let q = -0.5 * (b + b.signum() * disc.sqrt());
    let mut roots = if q == 0.0 { vec![0.0, 0.0] } else { vec![q / a, c / q] };
    roots.sort_by(f64::total_cmp);
    roots
}

/// Real roots of `a·x³ + b·x² + c·x + d = 0`, ascending.
///
/// Uses the depressed-cubic form with Cardano's formula for one real root and
/// the trigonometric form for three; each root is then polished with two
/// Newton steps. Degenerates to [`real_quadratic_roots`] when `a ≈ 0`.
pub fn real_cubic_roots(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    if a.abs() < COEFFICIENT_EPSILON {
        return real_quadratic_roots(b, c, d);
    }

    let (b, c, d) = (b / a, c / a, d / a);
    let shift = b / 3.0;
    let p = c - b * b / 3.0;
    let q = 2.0 * b * b * b / 27.0 - b * c / 3.0 + d;

    let half_q = 0.5 * q;
    let third_p = p / 3.0;
    let disc = half_q * half_q + third_p * third_p * third_p;
    let scale = (half_q * half_q).max(third_p.abs().powi(3)).max(f64::MIN_POSITIVE);

    let depressed: Vec<f64> = if disc.abs() <= 1e-12 * scale {
        if p.abs() < COEFFICIENT_EPSILON {
            vec![0.0]
        } else {
            vec![3.0 * q / p, -1.5 * q / p]
        }
    } else if disc > 0.0 {
        let sq = disc.sqrt();
        vec![(-half_q + sq).cbrt() + (-half_q - sq).cbrt()]
    } else {
        let r = 2.0 * (-third_p).sqrt();
        let arg = (1.5 * q / p * (-3.0 / p).sqrt()).clamp(-1.0, 1.0);
        let phi = arg.acos() / 3.0;
        (0..3)
            .map(|k| r * (phi - 2.0 * PI * k as f64 / 3.0).cos())
            .collect()
    };

    let poly = |x: f64| ((x + b) * x + c) * x + d;
    let slope = |x: f64| (3.0 * x + 2.0 * b) * x + c;

    let mut roots: Vec<f64> = depressed
        .into_iter()
        .map(|t| {
            let mut x = t - shift;
            for _ in 0..2 {
                let ds = slope(x);
                if ds.abs() > COEFFICIENT_EPSILON {
                    let next = x - poly(x) / ds;
                    if next.is_finite() {
                        x = next;
                    }
                }
            }
            x
        })
        .filter(|x| x.is_finite())
        .collect();
    roots.sort_by(f64::total_cmp);
    roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_roots(actual: Vec<f64>, expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "roots: {actual:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert_abs_diff_eq!(*a, *e, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_three_real_roots() {
        // (x - 1)(x - 2)(x - 3)
        assert_roots(real_cubic_roots(1.0, -6.0, 11.0, -6.0), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_one_real_root() {
        // (x - 2)(x² + 1)
        assert_roots(real_cubic_roots(1.0, -2.0, 1.0, -2.0), &[2.0]);
    }

    #[test]
    fn test_scaled_leading_coefficient() {
        // 0.5·(x + 1)(x - 0.25)(x - 4)
        assert_roots(real_cubic_roots(0.5, -1.625, -1.625, 0.5), &[-1.0, 0.25, 4.0]);
    }

    #[test]
    fn test_repeated_root() {
        // (x - 1)²(x + 2)
        let roots = real_cubic_roots(1.0, 0.0, -3.0, 2.0);
        assert!(roots.len() >= 2);
        assert_abs_diff_eq!(roots[0], -2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(*roots.last().unwrap(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_degenerate_orders() {
        assert_roots(real_cubic_roots(0.0, 1.0, -3.0, 2.0), &[1.0, 2.0]);
        assert_roots(real_cubic_roots(0.0, 0.0, 2.0, -1.0), &[0.5]);
        assert!(real_cubic_roots(0.0, 0.0, 0.0, 1.0).is_empty());
        assert!(real_quadratic_roots(1.0, 0.0, 1.0).is_empty());
    }
}
