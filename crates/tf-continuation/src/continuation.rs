//! Pseudo-arclength path following (§4.8): predictor, bordered-Newton
//! corrector, tangent update by implicit differentiation of `F(x,μ)=0`
//! along the branch, and adaptive step-size control.
//!
//! The corrector solves the augmented system by Keller's bordering
//! algorithm rather than materializing an `(n+1)×(n+1)` dense matrix: two
//! solves against the same `n×n` Jacobian (via [`LinearSolve`]) plus a
//! scalar elimination recover `(δx, δμ)` exactly.

use std::sync::atomic::{AtomicUsize, Ordering};

use tf_solver::LinearSolve;

use crate::error::{ContinuationError, ContinuationResult};
use crate::problem::ContinuationProblem;

/// Caps how many step-rejection warnings this process ever prints, mirroring
/// the teacher's rate-limited `[REG]`/`[TRUST]` diagnostics in
/// `tf-solver/src/steady.rs`/`solve.rs`.
static STEP_REJECT_WARN_COUNT: AtomicUsize = AtomicUsize::new(0);
const STEP_REJECT_WARN_LIMIT: usize = 20;

/// Finite-difference step for `∂F/∂μ`. The continuation parameter has no
/// closed-form derivative through the `Discretization` facade — rebuilding
/// at `μ ± ε` and differencing the residual is the only seam available.
const MU_EPSILON: f64 = 1e-6;

const GROW: f64 = 1.5;
const SHRINK: f64 = 2.0;

/// Progress events for one predictor/corrector step, modeled on the
/// teacher's `SolveProgressEvent`.
#[derive(Clone, Debug)]
pub enum ContinuationProgressEvent {
    StepStarted { step: usize, mu: f64, ds: f64 },
    CorrectorIteration { step: usize, iteration: usize, residual_norm: f64 },
    StepAccepted { step: usize, mu: f64, ds_next: f64 },
    StepRejected { step: usize, ds_next: f64 },
    TargetReached { steps: usize, mu: f64 },
}

#[derive(Clone, Debug)]
pub struct ContinuationOutcome {
    pub x: Vec<f64>,
    pub mu: f64,
    pub steps: usize,
}

/// Follows the branch from `(x0, mu0)` towards `mu = target`.
#[allow(clippy::too_many_arguments)]
pub fn continuation(
    problem: &dyn ContinuationProblem,
    solver: &dyn LinearSolve,
    x0: Vec<f64>,
    mu0: f64,
    target: f64,
    ds0: f64,
    ds_min: f64,
    ds_max: f64,
    nopt: usize,
    max_corrector_iterations: usize,
    tolerance: f64,
    max_steps: usize,
    mut progress: Option<&mut dyn FnMut(ContinuationProgressEvent)>,
) -> ContinuationResult<ContinuationOutcome> {
    let direction = (target - mu0).signum();
    if direction == 0.0 {
        return Ok(ContinuationOutcome { x: x0, mu: mu0, steps: 0 });
    }

    let mut x = x0;
    let mut mu = mu0;
    let mut ds = ds0.abs() * direction;
    let mut x_dot = vec![0.0; x.len()];
    let mut mu_dot = direction;

    for step in 0..max_steps {
        if let Some(cb) = progress.as_mut() {
            cb(ContinuationProgressEvent::StepStarted { step, mu, ds });
        }

        let x_hat: Vec<f64> = x.iter().zip(x_dot.iter()).map(|(xi, xd)| xi + ds * xd).collect();
        let mu_hat = mu + ds * mu_dot;

        let corrected = corrector(
            problem,
            solver,
            &x_hat,
            mu_hat,
            &x_dot,
            mu_dot,
            max_corrector_iterations,
            tolerance,
            step,
            &mut progress,
        );

        match corrected {
            Ok((x_new, mu_new, iterations)) => {
                if (mu_new - target) * direction >= 0.0 {
                    let (x_final, mu_final) = interpolate_to_target(&x, mu, &x_new, mu_new, target);
                    if let Some(cb) = progress.as_mut() {
                        cb(ContinuationProgressEvent::TargetReached { steps: step + 1, mu: mu_final });
                    }
                    return Ok(ContinuationOutcome {
                        x: x_final,
                        mu: mu_final,
                        steps: step + 1,
                    });
                }

                let (x_dot_new, mu_dot_new) = tangent(problem, solver, &x_new, mu_new, &x_dot, mu_dot)?;

                if iterations <= nopt {
                    ds = clamp_step(ds * GROW, ds_max, direction);
                }
                x = x_new;
                mu = mu_new;
                x_dot = x_dot_new;
                mu_dot = mu_dot_new;

                if let Some(cb) = progress.as_mut() {
                    cb(ContinuationProgressEvent::StepAccepted { step, mu, ds_next: ds });
                }
            }
            Err(e) => {
                ds /= SHRINK;
                let warn_count = STEP_REJECT_WARN_COUNT.fetch_add(1, Ordering::Relaxed);
                if warn_count < STEP_REJECT_WARN_LIMIT {
                    eprintln!("[CONTINUATION] step {step} rejected ({e}); shrinking ds to {ds:.3e}");
                }
                if ds.abs() < ds_min {
                    return Err(ContinuationError::StepSizeUnderflow { ds: ds.abs(), ds_min });
                }
                if let Some(cb) = progress.as_mut() {
                    cb(ContinuationProgressEvent::StepRejected { step, ds_next: ds });
                }
            }
        }
    }

    Ok(ContinuationOutcome { x, mu, steps: max_steps })
}

#[allow(clippy::too_many_arguments)]
fn corrector(
    problem: &dyn ContinuationProblem,
    solver: &dyn LinearSolve,
    x_hat: &[f64],
    mu_hat: f64,
    x_dot: &[f64],
    mu_dot: f64,
    max_iterations: usize,
    tolerance: f64,
    step: usize,
    progress: &mut Option<&mut dyn FnMut(ContinuationProgressEvent)>,
) -> ContinuationResult<(Vec<f64>, f64, usize)> {
    let mut x = x_hat.to_vec();
    let mut mu = mu_hat;

    for iter in 0..max_iterations {
        let disc = rebuild(problem, mu)?;
        let f = disc.rhs(&x);
        let y = dot(x_dot, &sub(&x, x_hat)) + mu_dot * (mu - mu_hat);
        let residual_norm = norm(&f).max(y.abs());

        if let Some(cb) = progress.as_mut() {
            cb(ContinuationProgressEvent::CorrectorIteration { step, iteration: iter, residual_norm });
        }

        if residual_norm < tolerance {
            return Ok((x, mu, iter));
        }

        let jac = disc.jacobian(&x);
        let f_mu = parameter_derivative(problem, &x, mu)?;
        let neg_f: Vec<f64> = f.iter().map(|v| -v).collect();
        let neg_f_mu: Vec<f64> = f_mu.iter().map(|v| -v).collect();

        let a = linear_solve(solver, &jac, &neg_f)?;
        let b = linear_solve(solver, &jac, &neg_f_mu)?;

        let denom = dot(x_dot, &b) + mu_dot;
        if denom.abs() < 1e-14 {
            return Err(ContinuationError::CorrectorFailed {
                what: "bordered system denominator vanished".to_string(),
            });
        }
        let delta_mu = (-y - dot(x_dot, &a)) / denom;
        let delta_x: Vec<f64> = a.iter().zip(b.iter()).map(|(ai, bi)| ai + delta_mu * bi).collect();

        for (xi, di) in x.iter_mut().zip(delta_x.iter()) {
            *xi += di;
        }
        mu += delta_mu;
    }

    Err(ContinuationError::CorrectorFailed {
        what: format!("corrector did not converge within {max_iterations} iterations"),
    })
}

fn tangent(
    problem: &dyn ContinuationProblem,
    solver: &dyn LinearSolve,
    x: &[f64],
    mu: f64,
    prev_x_dot: &[f64],
    prev_mu_dot: f64,
) -> ContinuationResult<(Vec<f64>, f64)> {
    let disc = rebuild(problem, mu)?;
    let jac = disc.jacobian(x);
    let f_mu = parameter_derivative(problem, x, mu)?;
    let neg_f_mu: Vec<f64> = f_mu.iter().map(|v| -v).collect();
    let x_mu = linear_solve(solver, &jac, &neg_f_mu)?;

    let norm_sq = x_mu.iter().map(|v| v * v).sum::<f64>() + 1.0;
    let scale = 1.0 / norm_sq.sqrt();
    let mut new_x_dot: Vec<f64> = x_mu.iter().map(|v| v * scale).collect();
    let mut new_mu_dot = scale;

    if dot(&new_x_dot, prev_x_dot) + new_mu_dot * prev_mu_dot < 0.0 {
        for v in new_x_dot.iter_mut() {
            *v = -*v;
        }
        new_mu_dot = -new_mu_dot;
    }
    Ok((new_x_dot, new_mu_dot))
}

fn parameter_derivative(problem: &dyn ContinuationProblem, x: &[f64], mu: f64) -> ContinuationResult<Vec<f64>> {
    let disc_minus = rebuild(problem, mu - MU_EPSILON)?;
    let disc_plus = rebuild(problem, mu + MU_EPSILON)?;
    let f_minus = disc_minus.rhs(x);
    let f_plus = disc_plus.rhs(x);
    Ok(f_plus
        .iter()
        .zip(f_minus.iter())
        .map(|(p, m)| (p - m) / (2.0 * MU_EPSILON))
        .collect())
}

fn rebuild(problem: &dyn ContinuationProblem, mu: f64) -> ContinuationResult<tf_discretization::Discretization> {
    problem.discretization_at(mu).map_err(|e| ContinuationError::CorrectorFailed { what: e.to_string() })
}

fn linear_solve(solver: &dyn LinearSolve, jac: &tf_discretization::CrsMatrix, rhs: &[f64]) -> ContinuationResult<Vec<f64>> {
    solver.solve(jac, rhs).map_err(|e| ContinuationError::CorrectorFailed { what: e.to_string() })
}

fn clamp_step(ds: f64, ds_max: f64, direction: f64) -> f64 {
    if ds.abs() > ds_max {
        ds_max * direction
    } else {
        ds
    }
}

fn interpolate_to_target(x_prev: &[f64], mu_prev: f64, x_new: &[f64], mu_new: f64, target: f64) -> (Vec<f64>, f64) {
    if (mu_new - mu_prev).abs() < 1e-14 {
        return (x_new.to_vec(), mu_new);
    }
    let t = (target - mu_prev) / (mu_new - mu_prev);
    let x_final: Vec<f64> = x_prev.iter().zip(x_new.iter()).map(|(a, b)| a + t * (b - a)).collect();
    (x_final, target)
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn sub(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b.iter()).map(|(x, y)| x - y).collect()
}

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}
