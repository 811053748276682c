pub mod adjoint;
pub mod basis;
pub mod bracket;
pub mod error;
pub mod estimators;
pub mod grid;
pub mod representation;
pub mod solvers;
/// The `crossing_core` crate estimates the error in a numerically computed
/// threshold-crossing time of a scalar ODE, without knowing the exact
/// solution, via adjoint-based a posteriori analysis.
///
/// Key components:
/// - **Solvers**: cG(q) Galerkin and Crank-Nicolson forward integrators.
/// - **Grid/Trajectory**: immutable nodal solutions with element-local
///   Lagrange interpolation.
/// - **Bracket**: locates the first threshold crossing and its window.
/// - **Adjoint**: backward cG(q+2) solve on the reversed time axis.
/// - **Representation**: the weak-residual pairing E of forward residual
///   and adjoint weight.
/// - **Estimators**: Taylor, secant, and inverse-quadratic corrections of
///   the crossing time, each consuming E.
pub mod traits;
