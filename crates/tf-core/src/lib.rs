//! tf-core: stable foundation shared by the grid, discretization, solver and
//! continuation layers.
//!
//! Contains:
//! - numeric (Real + tolerances + float helpers)
//! - error (shared error types)
//! - timing (lightweight opt-in perf instrumentation)

pub mod error;
pub mod numeric;
pub mod timing;

// Re-exports: nice ergonomics for downstream crates
pub use error::{TfError, TfResult};
pub use numeric::*;
