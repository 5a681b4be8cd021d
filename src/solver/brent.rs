//! Bracketed root finding with Brent's method.

use super::{MAX_ROOT_ITERATIONS, ROOT_TOLERANCE};

/// Brent root finder for continuous scalar functions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootFinder {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Absolute convergence tolerance on x
    pub tolerance: f64,
}

impl Default for RootFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl RootFinder {
    /// Create a root finder with the default limits.
    pub fn new() -> Self {
        Self {
            max_iterations: MAX_ROOT_ITERATIONS,
            tolerance: ROOT_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Find a root of `f` inside `[lo, hi]`.
    ///
    /// Returns `None` when the endpoints do not bracket a sign change, when
    /// `f` produces a non-finite value, or when the iteration limit is hit.
    pub fn brent<F>(&self, f: F, lo: f64, hi: f64) -> Option<f64>
    where
        F: Fn(f64) -> f64,
    {
        let (mut a, mut b) = (lo, hi);
        let (mut fa, mut fb) = (f(a), f(b));

        if !fa.is_finite() || !fb.is_finite() {
            return None;
        }
        if fa == 0.0 {
            return Some(a);
        }
        if fb == 0.0 {
            return Some(b);
        }
        if fa.signum() == fb.signum() {
            return None;
        }

        let (mut c, mut fc) = (b, fb);
        let mut d = b - a;
        let mut e = d;

        for _ in 0..self.max_iterations {
            if fb.signum() == fc.signum() {
                c = a;
                fc = fa;
                d = b - a;
                e = d;
            }
            if fc.abs() < fb.abs() {
                a = b;
                b = c;
                c = a;
                fa = fb;
                fb = fc;
                fc = fa;
            }

            let tol = 2.0 * f64::EPSILON * b.abs() + 0.5 * self.tolerance;
            let half = 0.5 * (c - b);
            if half.abs() <= tol || fb == 0.0 {
                return Some(b);
            }

            if e.abs() >= tol && fa.abs() > fb.abs() {
                // Inverse quadratic interpolation, or secant when only two points differ
                let s = fb / fa;
                let (mut p, mut q);
                if a == c {
                    p = 2.0 * half * s;
                    q = 1.0 - s;
                } else {
                    let qa = fa / fc;
                    let r = fb / fc;
                    p = s * (2.0 * half * qa * (qa - r) - (b - a) * (r - 1.0));
                    q = (qa - 1.0) * (r - 1.0) * (s - 1.0);
                }
                if p > 0.0 {
                    q = -q;
                }
                p = p.abs();

                let bound = (3.0 * half * q - (tol * q).abs()).min((e * q).abs());
                if 2.0 * p < bound {
                    e = d;
                    d = p / q;
                } else {
                    d = half;
                    e = d;
                }
            } else {
                d = half;
                e = d;
            }

            a = b;
            fa = fb;
            b += if d.abs() > tol { d } else { tol.copysign(half) };
            fb = f(b);
            if !fb.is_finite() {
                return None;
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_polynomial_root() {
        let root = RootFinder::new().brent(|x| x * x - 2.0, 0.0, 2.0).unwrap();
        assert_abs_diff_eq!(root, 2f64.sqrt(), epsilon = 1e-10);
    }

    #[test]
    fn test_transcendental_root() {
        let root = RootFinder::new().brent(|x| x.cos() - x, 0.0, 1.0).unwrap();
        assert_abs_diff_eq!(root, 0.739_085_133_215_160_6, epsilon = 1e-10);
    }

    #[test]
    fn test_root_at_endpoint() {
        assert_eq!(RootFinder::new().brent(|x| x - 1.0, 1.0, 3.0), Some(1.0));
    }

    #[test]
    fn test_no_sign_change() {
        assert_eq!(RootFinder::new().brent(|x| x * x + 1.0, -1.0, 1.0), None);
    }

    #[test]
    fn test_non_finite_is_rejected() {
        assert_eq!(RootFinder::new().brent(|_| f64::NAN, 0.0, 1.0), None);
    }

    #[test]
    fn test_large_scale_bracket() {
        // Frequencies in Hz: the tolerance must still converge on a 1e5 scale
        let root = RootFinder::new()
            .brent(|f| 1.0 / (f / 1.0e5) - 1.25, 3.0e4, 1.0e5)
            .unwrap();
        assert_abs_diff_eq!(root, 80_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_iteration_limit() {
        let finder = RootFinder::new().with_max_iterations(1).with_tolerance(0.0);
        assert_eq!(finder.brent(|x| x.powi(3) - 0.3, 0.0, 1.0), None);
    }
}
