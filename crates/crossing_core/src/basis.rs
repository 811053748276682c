//! Local polynomial bases and Gauss-Legendre quadrature.
//!
//! The Galerkin solvers and the error-representation functional are all
//! built from three ingredients: Lagrange trial bases on equispaced
//! element nodes, the lower-degree test basis of the weak form, and
//! Gauss-Legendre rules accurate enough for products of both.

use crate::error::{CrossingError, Result};
use crate::traits::Scalar;

/// Value of the j-th Lagrange basis polynomial over `nodes` at `x`.
pub fn lagrange_value<T: Scalar>(nodes: &[T], j: usize, x: T) -> T {
    let mut v = T::one();
    for k in 0..nodes.len() {
        if k != j {
            v = v * (x - nodes[k]) / (nodes[j] - nodes[k]);
        }
    }
    v
}

/// First derivative of the j-th Lagrange basis polynomial at `x`.
///
/// Product-rule expansion over the omitted factor; exact, no differencing.
pub fn lagrange_derivative<T: Scalar>(nodes: &[T], j: usize, x: T) -> T {
    let mut d = T::zero();
    for m in 0..nodes.len() {
        if m == j {
            continue;
        }
        let mut v = T::one() / (nodes[j] - nodes[m]);
        for k in 0..nodes.len() {
            if k != j && k != m {
                v = v * (x - nodes[k]) / (nodes[j] - nodes[k]);
            }
        }
        d = d + v;
    }
    d
}

/// Value of the j-th test basis polynomial for a degree-q trial space,
/// evaluated at `x` on the element [a, b].
///
/// The test space has degree q-1 and lives on q equispaced nodes; for
/// q = 1 it degenerates to the constant 1.
pub fn test_value(a: f64, b: f64, degree: usize, j: usize, x: f64) -> f64 {
    if degree <= 1 {
        return 1.0;
    }
    let nodes = equispaced(a, b, degree);
    lagrange_value(&nodes, j, x)
}

/// `count` equispaced points spanning [a, b] inclusive.
pub fn equispaced(a: f64, b: f64, count: usize) -> Vec<f64> {
    if count == 1 {
        return vec![a];
    }
    (0..count)
        .map(|i| a + (b - a) * i as f64 / (count - 1) as f64)
        .collect()
}

/// An n-point Gauss-Legendre rule on [-1, 1].
#[derive(Debug, Clone)]
pub struct GaussRule {
    pub points: Vec<f64>,
    pub weights: Vec<f64>,
}

impl GaussRule {
    /// Integrates `f` over [a, b] with this rule mapped affinely.
    pub fn integrate<F: Fn(f64) -> f64>(&self, a: f64, b: f64, f: F) -> f64 {
        let half = (b - a) / 2.0;
        let mid = (a + b) / 2.0;
        self.points
            .iter()
            .zip(&self.weights)
            .map(|(&p, &w)| half * w * f(half * p + mid))
            .sum()
    }
}

/// Builds the n-point Gauss-Legendre rule by Newton iteration on the
/// Legendre three-term recurrence.
pub fn gauss_legendre(n: usize) -> Result<GaussRule> {
    if n == 0 {
        return Err(CrossingError::InvalidConfiguration(
            "quadrature rule needs at least one point".into(),
        ));
    }
    let mut points = vec![0.0; n];
    let mut weights = vec![0.0; n];
    for i in 0..n {
        // Chebyshev-style starting guess, refined by Newton.
        let mut x = (std::f64::consts::PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        for _ in 0..100 {
            let (p, d) = legendre_with_derivative(n, x);
            let dx = p / d;
            x -= dx;
            if dx.abs() < 1e-15 {
                break;
            }
        }
        let (_, dp) = legendre_with_derivative(n, x);
        points[i] = x;
        weights[i] = 2.0 / ((1.0 - x * x) * dp * dp);
    }
    Ok(GaussRule { points, weights })
}

/// P_n(x) and P_n'(x) via the three-term recurrence.
fn legendre_with_derivative(n: usize, x: f64) -> (f64, f64) {
    let mut p0 = 1.0;
    let mut p1 = x;
    for k in 2..=n {
        let k = k as f64;
        let next = ((2.0 * k - 1.0) * x * p1 - (k - 1.0) * p0) / k;
        p0 = p1;
        p1 = next;
    }
    let d = n as f64 * (x * p1 - p0) / (x * x - 1.0);
    (p1, d)
}

#[cfg(test)]
mod tests {
    use super::{equispaced, gauss_legendre, lagrange_derivative, lagrange_value, test_value};
    use approx::assert_relative_eq;

    #[test]
    fn lagrange_basis_is_kronecker_at_nodes() {
        let nodes = equispaced(0.0, 1.0, 4);
        for j in 0..4 {
            for k in 0..4 {
                let expected = if j == k { 1.0 } else { 0.0 };
                assert_relative_eq!(
                    lagrange_value(&nodes, j, nodes[k]),
                    expected,
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn lagrange_basis_partitions_unity() {
        let nodes = equispaced(-1.0, 2.0, 5);
        let x = 0.3721;
        let sum: f64 = (0..5).map(|j| lagrange_value(&nodes, j, x)).sum();
        let dsum: f64 = (0..5).map(|j| lagrange_derivative(&nodes, j, x)).sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
        assert!(dsum.abs() < 1e-10, "derivative of unity should vanish, got {dsum}");
    }

    #[test]
    fn lagrange_derivative_matches_linear_slope() {
        // Interpolating f(x) = 2x + 1 on two nodes gives slope 2 everywhere.
        let nodes = [0.0, 0.5];
        let coeffs = [1.0, 2.0];
        let x = 0.17;
        let d: f64 = (0..2)
            .map(|j| coeffs[j] * lagrange_derivative(&nodes, j, x))
            .sum();
        assert_relative_eq!(d, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_basis_is_constant_for_degree_one() {
        assert_eq!(test_value(0.0, 1.0, 1, 0, 0.42), 1.0);
    }

    #[test]
    fn gauss_rule_weights_sum_to_interval_length() {
        for n in 1..=12 {
            let rule = gauss_legendre(n).expect("rule should build");
            let total: f64 = rule.weights.iter().sum();
            assert_relative_eq!(total, 2.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn gauss_rule_integrates_cubics_exactly() {
        let rule = gauss_legendre(2).expect("rule should build");
        let integral = rule.integrate(0.0, 2.0, |x| x * x * x);
        assert_relative_eq!(integral, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn gauss_rule_handles_smooth_integrand() {
        let rule = gauss_legendre(10).expect("rule should build");
        let integral = rule.integrate(0.0, std::f64::consts::PI, f64::sin);
        assert_relative_eq!(integral, 2.0, epsilon = 1e-10);
    }

    #[test]
    fn zero_point_rule_is_rejected() {
        let err = gauss_legendre(0).expect_err("expected error");
        assert!(format!("{err}").contains("at least one point"));
    }
}
