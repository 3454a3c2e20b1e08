//! Error types for pseudo-arclength path following.

use tf_core::error::TfError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContinuationError {
    /// The corrector kept failing until `ds` shrank below `ds_min`.
    #[error("arclength step underflowed: ds={ds} < ds_min={ds_min}")]
    StepSizeUnderflow { ds: f64, ds_min: f64 },

    /// The bordered corrector itself broke down (non-convergence, a
    /// degenerate tangent, or a failed rebuild of the discretization at a
    /// trial parameter value).
    #[error("corrector failed: {what}")]
    CorrectorFailed { what: String },
}

pub type ContinuationResult<T> = Result<T, ContinuationError>;

impl From<ContinuationError> for TfError {
    fn from(e: ContinuationError) -> Self {
        match e {
            ContinuationError::StepSizeUnderflow { .. } => TfError::InvalidArg {
                what: "continuation step size underflow",
            },
            ContinuationError::CorrectorFailed { .. } => TfError::InvalidArg {
                what: "continuation corrector",
            },
        }
    }
}
