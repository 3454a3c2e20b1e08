//! Pseudo-arclength continuation along `{(x(s), μ(s)) : F(x,μ) = 0}`,
//! stacked on top of `tf-discretization`'s residual/Jacobian and
//! `tf-solver`'s linear-solve seam.

pub mod continuation;
pub mod error;
pub mod problem;

pub use continuation::{ContinuationOutcome, ContinuationProgressEvent, continuation};
pub use error::{ContinuationError, ContinuationResult};
pub use problem::{ContinuationProblem, ReynoldsContinuation};
