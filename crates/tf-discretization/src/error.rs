//! Error types for problem configuration and discretization setup.

use tf_core::error::TfError;
use thiserror::Error;

/// Errors raised while validating a [`crate::Parameters`] record against a
/// [`tf_stencil::VariableLayout`], before any stencil is ever built.
#[derive(Error, Debug)]
pub enum DiscretizationError {
    /// A field combination that cannot describe a physical problem (negative
    /// Reynolds number, a buoyancy-coupled problem type without a
    /// temperature dof, a malformed continuation step-size bracket, ...).
    #[error("Invalid configuration: {what}")]
    InvalidConfig { what: &'static str },

    /// A required parameter was not supplied for the selected problem type.
    #[error("Missing required parameter: {name}")]
    MissingParameter { name: &'static str },
}

pub type DiscretizationResult<T> = Result<T, DiscretizationError>;

impl From<DiscretizationError> for TfError {
    fn from(e: DiscretizationError) -> Self {
        match e {
            DiscretizationError::InvalidConfig { what } => TfError::InvalidArg { what },
            DiscretizationError::MissingParameter { name } => TfError::MissingParameter { name },
        }
    }
}
