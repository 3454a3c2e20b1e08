//! tf-grid: structured-grid coordinate construction.
//!
//! Builds the per-axis coordinate vectors (uniform or tanh-stretched) that
//! the discretization layer needs to compute cell spacings and face areas.

pub mod axis;
pub mod metrics;

pub use axis::Axis;
pub use metrics::GridMetrics;
