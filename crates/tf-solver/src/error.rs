//! Error types for the nonlinear solve layer.

use tf_core::error::TfError;
use thiserror::Error;

/// Errors that can occur while driving Newton's method to a root of `F(x)`.
#[derive(Error, Debug)]
pub enum SolverError {
    /// The direct linear solve (`J·δ = −r`) failed even after falling back
    /// to the SVD pseudo-inverse.
    #[error("Jacobian is singular: {what}")]
    SingularJacobian { what: String },

    /// The residual never dropped below tolerance within the iteration
    /// budget.
    #[error("Newton iteration did not converge after {iterations} iterations, residual = {residual_norm}")]
    NewtonDidNotConverge { iterations: usize, residual_norm: f64 },

    /// A state, step or problem-setup precondition was violated before a
    /// linear solve was even attempted.
    #[error("Invalid state: {what}")]
    InvalidState { what: String },
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<SolverError> for TfError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::SingularJacobian { .. } => TfError::InvalidArg {
                what: "jacobian is singular",
            },
            SolverError::NewtonDidNotConverge { .. } => TfError::InvalidArg {
                what: "newton did not converge",
            },
            SolverError::InvalidState { .. } => TfError::InvalidArg { what: "state" },
        }
    }
}
