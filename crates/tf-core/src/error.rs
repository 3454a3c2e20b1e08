use thiserror::Error;

pub type TfResult<T> = Result<T, TfError>;

/// Structural errors shared across the grid, discretization and solver layers.
///
/// These are the "fatal" errors in the sense of section 7 of the design: shape
/// mismatches, bad parameters, and invalid dof layouts are not recoverable by
/// retrying with a different step size, unlike a failed Newton iteration.
#[derive(Error, Debug)]
pub enum TfError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Invariant violated: {what}")]
    Invariant { what: &'static str },

    #[error("Invalid domain for {what}: {detail}")]
    InvalidDomain { what: &'static str, detail: String },

    #[error("Missing required parameter: {name}")]
    MissingParameter { name: &'static str },
}
