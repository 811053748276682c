//! The error-representation functional.
//!
//! Pairs the weak residual of a forward trajectory against a time-aligned
//! adjoint trajectory to produce the scalar correction
//!
//!   E = ∫_{t0}^{T} phi(t) · (a(t)·Y(t) - Y'(t)) dt,
//!
//! the dominant-order estimate of the forward error in Y at the candidate
//! time T. One evaluation consumes one fresh adjoint solve, which is why
//! this term dominates the runtime of the iterative refiners.

use crate::basis::gauss_legendre;
use crate::error::{CrossingError, Result};
use crate::grid::Trajectory;

/// Evaluates the weak-residual pairing over [forward.start(), candidate].
///
/// `adjoint` must already be time-aligned (forward-ordered, see
/// `AdjointSolution::time_aligned`) and cover the whole subinterval.
/// Integration runs element-by-element on the forward grid, truncating
/// the element that contains the candidate time, with Gauss quadrature
/// sized for the product of both polynomial degrees.
pub fn error_representation<F>(
    forward: &Trajectory,
    coeff: F,
    adjoint: &Trajectory,
    candidate: f64,
) -> Result<f64>
where
    F: Fn(f64) -> f64,
{
    if candidate < forward.start() || candidate > forward.end() {
        return Err(CrossingError::OutOfRange {
            query: candidate,
            start: forward.start(),
            end: forward.end(),
        });
    }
    if adjoint.start() > forward.start() || adjoint.end() < candidate {
        return Err(CrossingError::InvalidConfiguration(format!(
            "adjoint trajectory [{}, {}] does not cover [{}, {}]",
            adjoint.start(),
            adjoint.end(),
            forward.start(),
            candidate
        )));
    }

    let rule = gauss_legendre(5 * adjoint.degree())?;
    let mut total = 0.0;

    for e in 0..forward.elements() {
        let a = forward.boundary_time(e);
        let b = forward.boundary_time(e + 1);
        if a >= candidate {
            break;
        }
        let upper = b.min(candidate);

        let half = (upper - a) / 2.0;
        let mid = (a + upper) / 2.0;
        for (&p, &w) in rule.points.iter().zip(&rule.weights) {
            let x = half * p + mid;
            let y = forward.value_at(x)?;
            let dy = forward.derivative_at(x)?;
            let phi = adjoint.value_at(x)?;
            total += half * w * phi * (coeff(x) * y - dy);
        }

        if b >= candidate {
            break;
        }
    }

    Ok(total)
}
