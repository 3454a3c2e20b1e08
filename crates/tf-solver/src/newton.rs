//! Damped Newton's method over a [`Discretization`]'s residual/Jacobian
//! pair, per §4.7: assemble, solve the linear system for the step, advance,
//! and repeat until the residual (or the step itself) is small enough.
//!
//! Line search and the iteration-observer callback are carried over from the
//! teacher's network Newton solver, stripped of the positivity/enthalpy
//! trust-region machinery that doesn't apply to this domain.

use std::sync::atomic::{AtomicUsize, Ordering};

use tf_discretization::Discretization;

use crate::error::{SolverError, SolverResult};
use crate::linear_solve::LinearSolve;

const LINE_SEARCH_BETA: f64 = 0.5;
const MAX_LINE_SEARCH_ITERS: usize = 25;
const MIN_STEP_ALPHA: f64 = 1e-12;

/// Caps how many backtracking-line-search warnings this process ever prints,
/// mirroring the teacher's rate-limited `[REG]`/`[TRUST]` diagnostics in
/// `steady.rs`/`solve.rs` rather than flooding stderr on a stubborn solve.
static LINE_SEARCH_WARN_COUNT: AtomicUsize = AtomicUsize::new(0);
const LINE_SEARCH_WARN_LIMIT: usize = 20;

/// The outcome of a Newton solve: the final iterate plus convergence
/// bookkeeping.
#[derive(Clone, Debug)]
pub struct NewtonOutcome {
    pub x: Vec<f64>,
    pub residual_norm: f64,
    pub iterations: usize,
    pub converged: bool,
}

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Solves `F(x) = 0` for the discretization's residual, starting from `x0`.
pub fn newton(discretization: &Discretization, solver: &dyn LinearSolve, x0: &[f64]) -> SolverResult<NewtonOutcome> {
    newton_with_observer(discretization, solver, x0, None)
}

/// Same as [`newton`], but invokes `iteration_observer(iteration, residual_norm)`
/// before each step — the hook `tf_continuation` uses to report corrector
/// progress without coupling the Newton loop to any particular UI.
pub fn newton_with_observer(
    discretization: &Discretization,
    solver: &dyn LinearSolve,
    x0: &[f64],
    mut iteration_observer: Option<&mut dyn FnMut(usize, f64)>,
) -> SolverResult<NewtonOutcome> {
    let params = discretization.parameters();
    let mut x = x0.to_vec();
    let mut r = discretization.rhs(&x);
    let mut r_norm = norm(&r);

    for iter in 0..params.max_newton_iterations {
        if let Some(observer) = iteration_observer.as_mut() {
            observer(iter, r_norm);
        }

        if r_norm < params.newton_tolerance {
            return Ok(NewtonOutcome {
                x,
                residual_norm: r_norm,
                iterations: iter,
                converged: true,
            });
        }

        let jac = discretization.jacobian(&x);
        let neg_r: Vec<f64> = r.iter().map(|v| -v).collect();
        let delta = solver.solve(&jac, &neg_r)?;

        let mut alpha = 1.0;
        let mut accepted: Option<(Vec<f64>, Vec<f64>, f64)> = None;
        for _ in 0..MAX_LINE_SEARCH_ITERS {
            let x_new: Vec<f64> = x.iter().zip(delta.iter()).map(|(xi, di)| xi + alpha * di).collect();
            let r_new = discretization.rhs(&x_new);
            let r_new_norm = norm(&r_new);
            if r_new_norm < r_norm || alpha < MIN_STEP_ALPHA {
                accepted = Some((x_new, r_new, r_new_norm));
                break;
            }
            alpha *= LINE_SEARCH_BETA;
        }

        if let Some((_, _, r_new_norm)) = &accepted {
            if *r_new_norm > 0.5 * r_norm && alpha < 1.0 {
                let warn_count = LINE_SEARCH_WARN_COUNT.fetch_add(1, Ordering::Relaxed);
                if warn_count < LINE_SEARCH_WARN_LIMIT {
                    eprintln!(
                        "[LINESEARCH] iteration {iter}: backtracked to alpha={alpha:.3e}, residual only {r_norm:.3e} -> {r_new_norm:.3e}"
                    );
                }
            }
        }

        let (x_new, r_new, r_new_norm) = accepted.ok_or_else(|| SolverError::InvalidState {
            what: format!("line search failed to find a descent step at iteration {iter}"),
        })?;

        let step_norm = norm(&delta) * alpha;
        x = x_new;
        r = r_new;
        r_norm = r_new_norm;

        if step_norm < params.newton_tolerance {
            return Ok(NewtonOutcome {
                x,
                residual_norm: r_norm,
                iterations: iter + 1,
                converged: true,
            });
        }
    }

    Err(SolverError::NewtonDidNotConverge {
        iterations: params.max_newton_iterations,
        residual_norm: r_norm,
    })
}
