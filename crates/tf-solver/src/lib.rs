//! Damped Newton solver for the steady-state CFD residual assembled by
//! `tf-discretization`.
//!
//! The unknowns are the staggered-grid state vector (velocity components,
//! pressure and, when present, temperature, laid out per [`VariableLayout`]);
//! `Discretization::rhs`/`jacobian` supply `F(x)` and `J(x)`, this crate
//! supplies the root-finding loop and the linear-solve seam it runs against.

pub mod error;
pub mod jacobian;
pub mod linear_solve;
pub mod newton;

pub use error::{SolverError, SolverResult};
pub use linear_solve::{DenseLuSolve, LinearSolve};
pub use newton::{NewtonOutcome, newton, newton_with_observer};
pub use tf_discretization::VariableLayout;
