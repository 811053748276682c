//! Locating the first threshold crossing of a trajectory.

use crate::error::{CrossingError, Result};
use crate::grid::Trajectory;
use serde::{Deserialize, Serialize};

/// One element-boundary sample of a trajectory. `index` addresses the
/// node on the trajectory's refined time axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub index: usize,
    pub time: f64,
    pub value: f64,
}

/// The nodes surrounding the first threshold crossing.
///
/// `lower` and `upper` are the consecutive element boundaries whose values
/// straddle the threshold; `outer_left` / `outer_right` are their next
/// neighbors outward, absent when the crossing sits against a domain
/// boundary. `coarse_time` is the piecewise-linear crossing estimate
/// between the straddling nodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossingWindow {
    pub outer_left: Option<Node>,
    pub lower: Node,
    pub upper: Node,
    pub outer_right: Option<Node>,
    pub coarse_time: f64,
}

/// Scans element-boundary values for the first sign change of
/// (value - threshold), in either direction, and returns the surrounding
/// window. A trajectory that crosses several times yields the earliest
/// crossing. No sign change anywhere is `ThresholdNotReached`.
pub fn locate_crossing(trajectory: &Trajectory, threshold: f64) -> Result<CrossingWindow> {
    let n_elem = trajectory.elements();
    let q = trajectory.degree();

    for e in 0..n_elem {
        let y1 = trajectory.boundary_value(e);
        let y2 = trajectory.boundary_value(e + 1);
        let crosses_up = y1 < threshold && y2 >= threshold;
        let crosses_down = y1 > threshold && y2 <= threshold;
        if !(crosses_up || crosses_down) {
            continue;
        }

        let t1 = trajectory.boundary_time(e);
        let t2 = trajectory.boundary_time(e + 1);
        let s = (threshold - y1) / (y2 - y1);
        let coarse_time = s * t2 + (1.0 - s) * t1;

        let node = |b: usize| Node {
            index: b * q,
            time: trajectory.boundary_time(b),
            value: trajectory.boundary_value(b),
        };
        return Ok(CrossingWindow {
            outer_left: (e >= 1).then(|| node(e - 1)),
            lower: node(e),
            upper: node(e + 1),
            outer_right: (e + 2 <= n_elem).then(|| node(e + 2)),
            coarse_time,
        });
    }

    Err(CrossingError::ThresholdNotReached { threshold })
}

#[cfg(test)]
mod tests {
    use super::locate_crossing;
    use crate::error::CrossingError;
    use crate::grid::Trajectory;
    use approx::assert_relative_eq;

    fn ramp() -> Trajectory {
        // Linear ramp 0..1 over [0, 1] on 10 elements.
        let times: Vec<f64> = (0..=10).map(|i| i as f64 / 10.0).collect();
        let values = times.clone();
        Trajectory::new(times, values, 1)
    }

    #[test]
    fn finds_straddling_nodes_and_coarse_estimate() {
        let window = locate_crossing(&ramp(), 0.42).expect("crossing should exist");
        assert_relative_eq!(window.lower.time, 0.4, epsilon = 1e-14);
        assert_relative_eq!(window.upper.time, 0.5, epsilon = 1e-14);
        assert!(window.lower.value < 0.42 && window.upper.value >= 0.42);
        assert_relative_eq!(window.coarse_time, 0.42, epsilon = 1e-13);
        assert_relative_eq!(window.outer_left.unwrap().time, 0.3, epsilon = 1e-14);
        assert_relative_eq!(window.outer_right.unwrap().time, 0.6, epsilon = 1e-14);
    }

    #[test]
    fn unreached_threshold_is_a_distinct_error() {
        match locate_crossing(&ramp(), 2.0) {
            Err(CrossingError::ThresholdNotReached { threshold }) => {
                assert_eq!(threshold, 2.0);
            }
            other => panic!("expected ThresholdNotReached, got {other:?}"),
        }
    }

    #[test]
    fn oscillating_trajectory_reports_first_crossing() {
        let times: Vec<f64> = (0..=8).map(|i| i as f64).collect();
        let values = vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        let traj = Trajectory::new(times, values, 1);
        let window = locate_crossing(&traj, 0.5).unwrap();
        assert_eq!(window.lower.index, 0);
        assert_relative_eq!(window.coarse_time, 0.5, epsilon = 1e-14);
    }

    #[test]
    fn downward_crossings_are_detected() {
        let times: Vec<f64> = (0..=4).map(|i| i as f64).collect();
        let values = vec![2.0, 1.5, 0.5, 0.2, 0.1];
        let traj = Trajectory::new(times, values, 1);
        let window = locate_crossing(&traj, 1.0).unwrap();
        assert_eq!(window.lower.index, 1);
        assert_relative_eq!(window.coarse_time, 1.5, epsilon = 1e-14);
    }

    #[test]
    fn window_at_left_domain_boundary_has_no_outer_left() {
        let times: Vec<f64> = (0..=3).map(|i| i as f64).collect();
        let values = vec![0.0, 1.0, 2.0, 3.0];
        let traj = Trajectory::new(times, values, 1);
        let window = locate_crossing(&traj, 0.5).unwrap();
        assert!(window.outer_left.is_none());
        assert!(window.outer_right.is_some());
    }

    #[test]
    fn refined_axis_indices_point_at_element_boundaries() {
        // Degree-2 trajectory: boundaries are every second axis node.
        let times: Vec<f64> = (0..=8).map(|i| i as f64 / 8.0).collect();
        let values: Vec<f64> = times.iter().map(|t| 2.0 * t).collect();
        let traj = Trajectory::new(times, values, 2);
        let window = locate_crossing(&traj, 1.1).unwrap();
        assert_eq!(window.lower.index % 2, 0);
        assert_eq!(window.upper.index, window.lower.index + 2);
    }
}
