//! The continuation-parameter seam: rebuilds a [`Discretization`] for a
//! trial value of the scalar path parameter `mu`.
//!
//! `Discretization` has no notion of "the parameter currently being
//! continued in" — it only knows a fixed, validated [`Parameters`] record.
//! A [`ContinuationProblem`] closes that gap by knowing how to turn `mu`
//! back into a full `Parameters` record (and thus a fresh `Discretization`)
//! without the continuation loop itself needing to know which field `mu`
//! addresses.

use tf_core::TfResult;
use tf_discretization::{Discretization, Parameters, VariableLayout};
use tf_grid::GridMetrics;

pub trait ContinuationProblem {
    fn discretization_at(&self, mu: f64) -> TfResult<Discretization>;
}

/// Continuation in the Reynolds number, holding grid, layout and every other
/// [`Parameters`] field fixed along the branch — the path used by the
/// lid-driven-cavity continuation scenario.
#[derive(Clone)]
pub struct ReynoldsContinuation {
    grid: GridMetrics,
    layout: VariableLayout,
    base: Parameters,
}

impl ReynoldsContinuation {
    pub fn new(base: Parameters, grid: GridMetrics, layout: VariableLayout) -> Self {
        Self { grid, layout, base }
    }
}

impl ContinuationProblem for ReynoldsContinuation {
    fn discretization_at(&self, mu: f64) -> TfResult<Discretization> {
        let parameters = Parameters {
            reynolds: mu,
            ..self.base
        };
        Discretization::new(parameters, self.grid.clone(), self.layout)
    }
}
