//! Crossing-time estimators.
//!
//! Three independent ways to turn the error-representation functional
//! into a corrected crossing time: a single-shot Taylor expansion, a
//! secant iteration, and an inverse-quadratic-interpolation iteration.
//! Each adjoint-corrected functional evaluation costs one fresh backward
//! solve, so the refiners report how many they performed. Within a
//! refiner the iterations are strictly sequential; across the three
//! estimators there is no shared mutable state.

use crate::adjoint::solve_adjoint;
use crate::bracket::CrossingWindow;
use crate::error::{CrossingError, Result};
use crate::grid::Trajectory;
use crate::representation::error_representation;
use serde::{Deserialize, Serialize};

/// Tolerances, caps, and resolutions shared by the estimators. Passed
/// explicitly so tests can vary them independently.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EstimatorSettings {
    /// Convergence tolerance on |corrected value - threshold|.
    pub tolerance: f64,
    /// Iteration cap for both refiners; exhaustion is `NonConvergence`.
    pub max_iterations: usize,
    /// Uniform subintervals of every backward adjoint grid, independent
    /// of window length.
    pub adjoint_subintervals: usize,
    /// Denominators smaller than this in magnitude are reported as
    /// `NumericalDegeneracy` instead of being divided by.
    pub degeneracy_tolerance: f64,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-12,
            max_iterations: 100,
            adjoint_subintervals: 100,
            degeneracy_tolerance: 1e-14,
        }
    }
}

/// The forward solve and problem data every estimator consumes. The
/// adjoint degree is always `forward.degree() + 2`.
pub struct CrossingProblem<'a, F, G> {
    /// Forward trajectory whose crossing time is being corrected.
    pub forward: &'a Trajectory,
    /// Coefficient a(t) of the forward problem y' = a(t)·y.
    pub coeff: F,
    /// Coefficient of the adjoint equation, the negative state Jacobian
    /// of the forward RHS along the trajectory, as a function of time.
    pub adjoint_coeff: G,
    /// Adjoint initial condition at the candidate time (usually 1).
    pub adjoint_init: f64,
    /// Threshold value R defining the crossing.
    pub threshold: f64,
}

/// Outcome of an estimator: the corrected crossing time, the signed
/// correction applied to the coarse estimate, and the number of adjoint
/// problems solved along the way.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossingEstimate {
    pub crossing_time: f64,
    pub error_estimate: f64,
    pub adjoint_solves: usize,
}

/// Single-shot Taylor estimate (no iteration).
///
/// One adjoint solve at the coarse crossing time yields E; the
/// implicit-function-theorem expansion of y(T + dt) = R then gives
/// dt = -E / (a·E + a·R), with the denominator approximating y'(T).
pub fn taylor<F, G>(
    problem: &CrossingProblem<'_, F, G>,
    window: &CrossingWindow,
    settings: &EstimatorSettings,
) -> Result<CrossingEstimate>
where
    F: Fn(f64) -> f64,
    G: Fn(f64) -> f64,
{
    validate(settings)?;
    let candidate = window.coarse_time;
    let (_, e) = corrected_value(problem, settings, candidate)?;

    let coeff_at = (problem.coeff)(candidate);
    let denominator = coeff_at * e + coeff_at * problem.threshold;
    if denominator.abs() < settings.degeneracy_tolerance {
        return Err(CrossingError::NumericalDegeneracy {
            denominator,
            tolerance: settings.degeneracy_tolerance,
        });
    }

    let correction = -e / denominator;
    Ok(CrossingEstimate {
        crossing_time: candidate + correction,
        error_estimate: correction,
        adjoint_solves: 1,
    })
}

/// Secant refinement from the two straddling bracket nodes.
///
/// Each iteration solves one fresh adjoint problem at the new candidate,
/// forms the corrected value a = Y(x) + E(x), and applies the secant
/// update to (a - R). Adjoint-solve count is iterations + 2.
pub fn secant<F, G>(
    problem: &CrossingProblem<'_, F, G>,
    window: &CrossingWindow,
    settings: &EstimatorSettings,
) -> Result<CrossingEstimate>
where
    F: Fn(f64) -> f64,
    G: Fn(f64) -> f64,
{
    validate(settings)?;
    let r = problem.threshold;
    let mut x0 = window.lower.time;
    let mut x1 = window.upper.time;
    let (mut a0, _) = corrected_value(problem, settings, x0)?;
    let (mut a1, _) = corrected_value(problem, settings, x1)?;
    let mut solves = 2;

    for _ in 0..settings.max_iterations {
        let x2 = secant_step(a0 - r, a1 - r, x0, x1, settings.degeneracy_tolerance)?;
        let (a2, _) = corrected_value(problem, settings, x2)?;
        solves += 1;
        if (a2 - r).abs() < settings.tolerance {
            return Ok(CrossingEstimate {
                crossing_time: x2,
                error_estimate: x2 - window.coarse_time,
                adjoint_solves: solves,
            });
        }
        x0 = x1;
        a0 = a1;
        x1 = x2;
        a1 = a2;
    }

    Err(CrossingError::NonConvergence {
        best_estimate: x1,
        iterations: settings.max_iterations,
    })
}

/// Inverse-quadratic-interpolation refinement from three bracket nodes:
/// the straddling pair plus the outer neighbor (right preferred, left at
/// the domain boundary). Adjoint-solve count is iterations + 3.
pub fn inverse_quadratic<F, G>(
    problem: &CrossingProblem<'_, F, G>,
    window: &CrossingWindow,
    settings: &EstimatorSettings,
) -> Result<CrossingEstimate>
where
    F: Fn(f64) -> f64,
    G: Fn(f64) -> f64,
{
    validate(settings)?;
    let r = problem.threshold;
    let (mut x0, mut x1, mut x2) = if let Some(right) = window.outer_right {
        (window.lower.time, window.upper.time, right.time)
    } else if let Some(left) = window.outer_left {
        (left.time, window.lower.time, window.upper.time)
    } else {
        return Err(CrossingError::InvalidConfiguration(
            "inverse-quadratic refinement needs three bracket nodes".into(),
        ));
    };
    let (mut a0, _) = corrected_value(problem, settings, x0)?;
    let (mut a1, _) = corrected_value(problem, settings, x1)?;
    let (mut a2, _) = corrected_value(problem, settings, x2)?;
    let mut solves = 3;

    for _ in 0..settings.max_iterations {
        let x3 = inverse_quadratic_step(
            a0 - r,
            a1 - r,
            a2 - r,
            x0,
            x1,
            x2,
            settings.degeneracy_tolerance,
        )?;
        let (a3, _) = corrected_value(problem, settings, x3)?;
        solves += 1;
        if (a3 - r).abs() < settings.tolerance {
            return Ok(CrossingEstimate {
                crossing_time: x3,
                error_estimate: x3 - window.coarse_time,
                adjoint_solves: solves,
            });
        }
        x0 = x1;
        a0 = a1;
        x1 = x2;
        a1 = a2;
        x2 = x3;
        a2 = a3;
    }

    Err(CrossingError::NonConvergence {
        best_estimate: x2,
        iterations: settings.max_iterations,
    })
}

/// One adjoint-corrected functional evaluation at `candidate`: a fresh
/// backward solve at degree q+2, the error-representation pairing, and
/// the interpolated forward value. Returns (Y(x) + E, E).
fn corrected_value<F, G>(
    problem: &CrossingProblem<'_, F, G>,
    settings: &EstimatorSettings,
    candidate: f64,
) -> Result<(f64, f64)>
where
    F: Fn(f64) -> f64,
    G: Fn(f64) -> f64,
{
    let degree = problem.forward.degree() + 2;
    let adjoint = solve_adjoint(
        problem.adjoint_init,
        &problem.adjoint_coeff,
        problem.forward.start(),
        candidate,
        settings.adjoint_subintervals,
        degree,
    )?;
    let aligned = adjoint.time_aligned();
    let e = error_representation(problem.forward, &problem.coeff, &aligned, candidate)?;
    Ok((problem.forward.value_at(candidate)? + e, e))
}

fn secant_step(y0: f64, y1: f64, x0: f64, x1: f64, degeneracy_tolerance: f64) -> Result<f64> {
    let denominator = y1 - y0;
    if denominator.abs() < degeneracy_tolerance {
        return Err(CrossingError::NumericalDegeneracy {
            denominator,
            tolerance: degeneracy_tolerance,
        });
    }
    Ok((x0 * y1 - x1 * y0) / denominator)
}

fn inverse_quadratic_step(
    y0: f64,
    y1: f64,
    y2: f64,
    x0: f64,
    x1: f64,
    x2: f64,
    degeneracy_tolerance: f64,
) -> Result<f64> {
    for d in [y0 - y1, y0 - y2, y1 - y2] {
        if d.abs() < degeneracy_tolerance {
            return Err(CrossingError::NumericalDegeneracy {
                denominator: d,
                tolerance: degeneracy_tolerance,
            });
        }
    }
    Ok(
        x0 * y1 * y2 / ((y0 - y1) * (y0 - y2))
            + x1 * y0 * y2 / ((y1 - y0) * (y1 - y2))
            + x2 * y1 * y0 / ((y2 - y1) * (y2 - y0)),
    )
}

fn validate(settings: &EstimatorSettings) -> Result<()> {
    if !(settings.tolerance > 0.0) {
        return Err(CrossingError::InvalidConfiguration(
            "tolerance must be positive".into(),
        ));
    }
    if settings.max_iterations == 0 {
        return Err(CrossingError::InvalidConfiguration(
            "max_iterations must be at least 1".into(),
        ));
    }
    if settings.adjoint_subintervals == 0 {
        return Err(CrossingError::InvalidConfiguration(
            "adjoint grids need at least one subinterval".into(),
        ));
    }
    if !(settings.degeneracy_tolerance > 0.0) {
        return Err(CrossingError::InvalidConfiguration(
            "degeneracy_tolerance must be positive".into(),
        ));
    }
    Ok(())
}
