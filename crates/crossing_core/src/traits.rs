use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types usable as scalars in the basis evaluations.
/// Must support floating-point arithmetic, debug printing, and
/// conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// Right-hand side f(t, y) of a scalar ODE y' = f(t, y).
///
/// The state derivative `d_dy` defaults to a central finite difference so
/// callers only have to supply the RHS itself; implement it directly when
/// a closed form is available (the Crank-Nicolson Newton solve uses it).
pub trait Rhs {
    fn eval(&self, t: f64, y: f64) -> f64;

    /// ∂f/∂y at (t, y).
    fn d_dy(&self, t: f64, y: f64) -> f64 {
        let h = f64::EPSILON.sqrt() * y.abs().max(1.0);
        (self.eval(t, y + h) - self.eval(t, y - h)) / (2.0 * h)
    }
}

impl<F> Rhs for F
where
    F: Fn(f64, f64) -> f64,
{
    fn eval(&self, t: f64, y: f64) -> f64 {
        self(t, y)
    }
}

#[cfg(test)]
mod tests {
    use super::Rhs;

    #[test]
    fn closure_rhs_evaluates() {
        let rhs = |t: f64, y: f64| t + 2.0 * y;
        assert_eq!(rhs.eval(1.0, 3.0), 7.0);
    }

    #[test]
    fn default_state_derivative_matches_linear_coefficient() {
        let rhs = |_t: f64, y: f64| 3.5 * y;
        let d = rhs.d_dy(0.2, 1.7);
        assert!((d - 3.5).abs() < 1e-6, "got {d}");
    }

    #[test]
    fn default_state_derivative_handles_nonlinear_rhs() {
        let rhs = |_t: f64, y: f64| y * y;
        let d = rhs.d_dy(0.0, 2.0);
        assert!((d - 4.0).abs() < 1e-5, "got {d}");
    }
}
