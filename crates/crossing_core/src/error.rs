use thiserror::Error;

/// Structured failure modes of the crossing-time pipeline.
///
/// Every public entry point reports problems through this enum so callers
/// can distinguish bad inputs from genuine mathematical outcomes (a
/// threshold that is never reached, a refiner that ran out of iterations)
/// and decide whether to fall back to a different estimator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CrossingError {
    /// Malformed inputs: degenerate grids, polynomial degree < 1,
    /// non-positive tolerances, singular local systems.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The trajectory never crosses the threshold anywhere on its grid.
    /// There is no crossing time to refine, so the pipeline must stop.
    #[error("threshold {threshold} is never reached on this grid")]
    ThresholdNotReached { threshold: f64 },

    /// An iterative solve exhausted its iteration cap. The best iterate
    /// is reported so the caller can decide whether to trust it.
    #[error("no convergence after {iterations} iterations (best estimate {best_estimate})")]
    NonConvergence { best_estimate: f64, iterations: usize },

    /// A denominator fell below the configured tolerance; continuing
    /// would produce an unbounded estimate.
    #[error("degenerate denominator {denominator} (magnitude below {tolerance})")]
    NumericalDegeneracy { denominator: f64, tolerance: f64 },

    /// Interpolation query outside the trajectory's time range.
    #[error("query time {query} outside trajectory range [{start}, {end}]")]
    OutOfRange { query: f64, start: f64, end: f64 },
}

pub type Result<T> = std::result::Result<T, CrossingError>;
