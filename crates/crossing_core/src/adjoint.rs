//! Backward-in-time adjoint solve.
//!
//! The adjoint problem runs from a candidate crossing time back to the
//! start of the forward interval, at two polynomial degrees above the
//! forward scheme for superconvergence of the error pairing. The backward
//! integration is realized as a forward cG solve on the reversed time
//! axis s = candidate - t.

use crate::error::{CrossingError, Result};
use crate::grid::{TimeGrid, Trajectory};
use crate::solvers::solve_cg;

/// An adjoint trajectory in backward orientation: `times` descend from
/// the candidate time to the interval start and `values[0]` is the
/// adjoint initial condition.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjointSolution {
    times: Vec<f64>,
    values: Vec<f64>,
    degree: usize,
}

impl AdjointSolution {
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn candidate_time(&self) -> f64 {
        self.times[0]
    }

    /// Reverses the backward samples into a forward-ordered `Trajectory`
    /// on [t0, candidate], ready to pair with a forward trajectory in the
    /// error-representation functional.
    pub fn time_aligned(&self) -> Trajectory {
        let times = self.times.iter().rev().copied().collect();
        let values = self.values.iter().rev().copied().collect();
        Trajectory::new(times, values, self.degree)
    }
}

/// Integrates the linear adjoint equation phi' = g(t)·phi from
/// `candidate` down to `t0` with phi(candidate) = phi0, as a cG(degree)
/// solve of psi' = -g(candidate - s)·psi on the reversed axis. The
/// backward grid always uses `subintervals` uniform steps regardless of
/// window length.
pub fn solve_adjoint<G>(
    phi0: f64,
    adjoint_coeff: G,
    t0: f64,
    candidate: f64,
    subintervals: usize,
    degree: usize,
) -> Result<AdjointSolution>
where
    G: Fn(f64) -> f64,
{
    if !(candidate > t0) {
        return Err(CrossingError::InvalidConfiguration(format!(
            "candidate time {candidate} must lie beyond the interval start {t0}"
        )));
    }
    let span = candidate - t0;
    let grid = TimeGrid::uniform(0.0, span, subintervals)?;
    let reversed = solve_cg(phi0, |s| -adjoint_coeff(candidate - s), &grid, degree)?;

    let mut times: Vec<f64> = reversed.times().iter().map(|&s| candidate - s).collect();
    // The reversed axis ends exactly at the span, so the mapped endpoint
    // lands on t0 up to roundoff; pin it.
    if let Some(last) = times.last_mut() {
        *last = t0;
    }
    Ok(AdjointSolution {
        times,
        values: reversed.values().to_vec(),
        degree,
    })
}

#[cfg(test)]
mod tests {
    use super::solve_adjoint;
    use crate::error::CrossingError;
    use approx::assert_relative_eq;

    #[test]
    fn constant_coefficient_adjoint_matches_exponential() {
        // phi' = -phi backward from T = 1 with phi(1) = 1 gives
        // phi(t) = exp(1 - t).
        let adj = solve_adjoint(1.0, |_| -1.0, 0.0, 1.0, 100, 3).unwrap();
        assert_eq!(adj.candidate_time(), 1.0);
        assert_relative_eq!(adj.values()[0], 1.0, epsilon = 1e-14);
        assert_relative_eq!(
            *adj.values().last().unwrap(),
            std::f64::consts::E,
            max_relative = 1e-10
        );
    }

    #[test]
    fn alignment_reverses_orientation_and_pins_endpoints() {
        let adj = solve_adjoint(1.0, |t| -(2.0 * t).cos(), 0.25, 0.8, 50, 3).unwrap();
        assert!(adj.times().windows(2).all(|w| w[1] < w[0]));
        let aligned = adj.time_aligned();
        assert_eq!(aligned.start(), 0.25);
        assert_eq!(aligned.end(), 0.8);
        assert_relative_eq!(
            aligned.value_at(0.8).unwrap(),
            adj.values()[0],
            epsilon = 1e-14
        );
    }

    #[test]
    fn aligned_trajectory_interpolates_between_samples() {
        let adj = solve_adjoint(1.0, |_| -1.0, 0.0, 1.0, 100, 3).unwrap();
        let aligned = adj.time_aligned();
        let mid = aligned.value_at(0.5).unwrap();
        assert_relative_eq!(mid, (0.5f64).exp(), max_relative = 1e-10);
    }

    #[test]
    fn empty_window_is_rejected() {
        assert!(matches!(
            solve_adjoint(1.0, |_| -1.0, 1.0, 1.0, 100, 3),
            Err(CrossingError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            solve_adjoint(1.0, |_| -1.0, 0.0, 1.0, 0, 3),
            Err(CrossingError::InvalidConfiguration(_))
        ));
    }
}
