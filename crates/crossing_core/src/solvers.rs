//! Forward time integrators.
//!
//! Two fixed schemes: a continuous-Galerkin cG(q) solve for linear scalar
//! problems y' = a(t)·y, and a Crank-Nicolson (trapezoidal) solve for
//! general scalar problems y' = f(t, y). Both return a `Trajectory` on a
//! nodal refinement of the supplied grid.

use crate::basis::{equispaced, gauss_legendre, lagrange_derivative, lagrange_value, test_value};
use crate::error::{CrossingError, Result};
use crate::grid::{TimeGrid, Trajectory};
use crate::traits::Rhs;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Inner Newton solve settings for the implicit Crank-Nicolson update.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NewtonSettings {
    pub max_steps: usize,
    pub tolerance: f64,
}

impl Default for NewtonSettings {
    fn default() -> Self {
        Self {
            max_steps: 50,
            tolerance: 1e-13,
        }
    }
}

/// Continuous-Galerkin cG(q) solve of y' = a(t)·y with y(t0) = y0.
///
/// Per element the degree-q trial polynomial is fixed by continuity at
/// the left node plus q weak-form conditions against the degree-(q-1)
/// test space, assembled with 5q-point Gauss quadrature and solved by LU.
/// The returned trajectory carries the q+1 equispaced nodes of every
/// element, so it interpolates at exactly the scheme's own degree.
pub fn solve_cg<F>(y0: f64, coeff: F, grid: &TimeGrid, degree: usize) -> Result<Trajectory>
where
    F: Fn(f64) -> f64,
{
    if degree < 1 {
        return Err(CrossingError::InvalidConfiguration(
            "cG degree must be at least 1".into(),
        ));
    }
    let q = degree;
    let n_elem = grid.subintervals();
    let rule = gauss_legendre(5 * q)?;

    let mut times = Vec::with_capacity(n_elem * q + 1);
    let mut values = Vec::with_capacity(n_elem * q + 1);
    times.push(grid.start());
    values.push(y0);

    for e in 0..n_elem {
        let a = grid.nodes()[e];
        let b = grid.nodes()[e + 1];
        let nodes = equispaced(a, b, q + 1);

        // Weak form: for each test function j, integrate
        //   psi_j(x) * (L_i'(x) - a(x) L_i(x))
        // over the element, giving a q x (q+1) local matrix.
        let mut local = vec![0.0; q * (q + 1)];
        for i in 0..=q {
            for j in 0..q {
                local[j * (q + 1) + i] = rule.integrate(a, b, |x| {
                    test_value(a, b, q, j, x)
                        * (lagrange_derivative(&nodes, i, x) - coeff(x) * lagrange_value(&nodes, i, x))
                });
            }
        }

        // The left-node coefficient is known from continuity; move its
        // column to the right-hand side and solve the q x q remainder.
        let y_left = *values.last().unwrap();
        let matrix = DMatrix::from_fn(q, q, |j, i| local[j * (q + 1) + i + 1]);
        let rhs = DVector::from_fn(q, |j, _| -y_left * local[j * (q + 1)]);
        let solution = matrix.lu().solve(&rhs).ok_or_else(|| {
            CrossingError::InvalidConfiguration(format!(
                "singular local Galerkin system on element [{a}, {b}]"
            ))
        })?;

        for i in 1..=q {
            times.push(nodes[i]);
            values.push(solution[i - 1]);
        }
    }

    Ok(Trajectory::new(times, values, q))
}

/// Crank-Nicolson (trapezoidal) solve of y' = f(t, y) with y(t0) = y0,
/// using default Newton settings for the per-step implicit equation.
pub fn solve_crank_nicolson<R: Rhs>(y0: f64, grid: &TimeGrid, rhs: &R) -> Result<Trajectory> {
    solve_crank_nicolson_with(y0, grid, rhs, NewtonSettings::default())
}

/// Crank-Nicolson solve with explicit Newton settings.
///
/// Each step solves g(z) = z - y_n - dt/2·(f(t_n, y_n) + f(t_{n+1}, z)) = 0
/// by scalar Newton, with g'(z) from `Rhs::d_dy`. Second-order
/// accurate in the step size.
pub fn solve_crank_nicolson_with<R: Rhs>(
    y0: f64,
    grid: &TimeGrid,
    rhs: &R,
    settings: NewtonSettings,
) -> Result<Trajectory> {
    if settings.max_steps == 0 {
        return Err(CrossingError::InvalidConfiguration(
            "Newton max_steps must be at least 1".into(),
        ));
    }
    if !(settings.tolerance > 0.0) {
        return Err(CrossingError::InvalidConfiguration(
            "Newton tolerance must be positive".into(),
        ));
    }

    let nodes = grid.nodes();
    let mut values = Vec::with_capacity(nodes.len());
    values.push(y0);

    for w in nodes.windows(2) {
        let (t0, t1) = (w[0], w[1]);
        let dt = t1 - t0;
        let y_old = *values.last().unwrap();
        let explicit = rhs.eval(t0, y_old);

        let mut z = y_old;
        let mut converged = false;
        for _ in 0..settings.max_steps {
            let g = z - y_old - dt / 2.0 * (explicit + rhs.eval(t1, z));
            let dg = 1.0 - dt / 2.0 * rhs.d_dy(t1, z);
            let step = g / dg;
            z -= step;
            if step.abs() <= settings.tolerance * z.abs().max(1.0) {
                converged = true;
                break;
            }
        }
        if !converged {
            return Err(CrossingError::NonConvergence {
                best_estimate: z,
                iterations: settings.max_steps,
            });
        }
        values.push(z);
    }

    Ok(Trajectory::new(nodes.to_vec(), values, 1))
}
