//! Time grids and nodal trajectories.
//!
//! A `TimeGrid` holds the element boundaries a solver integrates over.
//! A `Trajectory` is what a solver returns: nodal values paired one-to-one
//! with a (possibly refined) nodal time axis, plus the polynomial degree
//! of the scheme that produced them. Interpolation is element-local
//! Lagrange of that same degree, so nodal values are reproduced exactly.

use crate::basis::{lagrange_derivative, lagrange_value};
use crate::error::{CrossingError, Result};
use serde::{Deserialize, Serialize};

/// Strictly increasing element boundaries over a fixed interval.
/// Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeGrid {
    nodes: Vec<f64>,
}

impl TimeGrid {
    /// Uniform grid with `subintervals` elements spanning [t0, t1].
    pub fn uniform(t0: f64, t1: f64, subintervals: usize) -> Result<Self> {
        if subintervals == 0 {
            return Err(CrossingError::InvalidConfiguration(
                "grid needs at least one subinterval".into(),
            ));
        }
        if !(t1 > t0) {
            return Err(CrossingError::InvalidConfiguration(format!(
                "grid end {t1} must exceed start {t0}"
            )));
        }
        let n = subintervals;
        let nodes = (0..=n)
            .map(|i| t0 + (t1 - t0) * i as f64 / n as f64)
            .collect();
        Ok(Self { nodes })
    }

    /// Grid from explicit boundaries; must be strictly increasing with at
    /// least two nodes.
    pub fn from_nodes(nodes: Vec<f64>) -> Result<Self> {
        if nodes.len() < 2 {
            return Err(CrossingError::InvalidConfiguration(
                "grid needs at least two nodes".into(),
            ));
        }
        if nodes.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(CrossingError::InvalidConfiguration(
                "grid nodes must be strictly increasing".into(),
            ));
        }
        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[f64] {
        &self.nodes
    }

    pub fn subintervals(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn start(&self) -> f64 {
        self.nodes[0]
    }

    pub fn end(&self) -> f64 {
        *self.nodes.last().unwrap()
    }
}

/// A discrete solution: nodal values on a refined time axis.
///
/// For a degree-q scheme over N elements the axis carries N·q + 1 nodes;
/// element `e` spans axis indices `e·q ..= (e+1)·q`. Crank-Nicolson
/// trajectories are stored with q = 1. Read-only once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    times: Vec<f64>,
    values: Vec<f64>,
    degree: usize,
}

impl Trajectory {
    pub(crate) fn new(times: Vec<f64>, values: Vec<f64>, degree: usize) -> Self {
        debug_assert!(degree >= 1);
        debug_assert_eq!(times.len(), values.len());
        debug_assert_eq!((times.len() - 1) % degree, 0);
        Self {
            times,
            values,
            degree,
        }
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn start(&self) -> f64 {
        self.times[0]
    }

    pub fn end(&self) -> f64 {
        *self.times.last().unwrap()
    }

    /// Number of elements (solver subintervals).
    pub fn elements(&self) -> usize {
        (self.times.len() - 1) / self.degree
    }

    /// Time of the boundary node shared by elements `e-1` and `e`.
    pub fn boundary_time(&self, e: usize) -> f64 {
        self.times[e * self.degree]
    }

    /// Value at the boundary node shared by elements `e-1` and `e`.
    pub fn boundary_value(&self, e: usize) -> f64 {
        self.values[e * self.degree]
    }

    /// Interpolated value at `t` via the local degree-q Lagrange basis.
    /// Queries at grid nodes reproduce the nodal values exactly; queries
    /// outside [start, end] are an error, the endpoints themselves are not.
    pub fn value_at(&self, t: f64) -> Result<f64> {
        let e = self.element_containing(t)?;
        let q = self.degree;
        let nodes = &self.times[e * q..=(e + 1) * q];
        let vals = &self.values[e * q..=(e + 1) * q];
        Ok((0..=q).map(|j| vals[j] * lagrange_value(nodes, j, t)).sum())
    }

    /// Derivative of the local interpolant at `t`.
    pub fn derivative_at(&self, t: f64) -> Result<f64> {
        let e = self.element_containing(t)?;
        let q = self.degree;
        let nodes = &self.times[e * q..=(e + 1) * q];
        let vals = &self.values[e * q..=(e + 1) * q];
        Ok((0..=q)
            .map(|j| vals[j] * lagrange_derivative(nodes, j, t))
            .sum())
    }

    fn element_containing(&self, t: f64) -> Result<usize> {
        if t < self.start() || t > self.end() {
            return Err(CrossingError::OutOfRange {
                query: t,
                start: self.start(),
                end: self.end(),
            });
        }
        let n_elem = self.elements();
        if t >= self.end() {
            return Ok(n_elem - 1);
        }
        let q = self.degree;
        // Bisect element boundaries for the element with boundary <= t.
        let mut lo = 0usize;
        let mut hi = n_elem - 1;
        while lo < hi {
            let mid = (lo + hi + 1) / 2;
            if self.times[mid * q] <= t {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        Ok(lo)
    }
}
