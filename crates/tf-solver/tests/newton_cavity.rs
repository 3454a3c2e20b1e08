//! Black-box Newton solves against a fully wired lid-driven-cavity
//! discretization, driven only through the public `tf-discretization`/
//! `tf-solver` API surface.

use tf_discretization::{Discretization, Parameters, VariableLayout};
use tf_grid::GridMetrics;
use tf_solver::{DenseLuSolve, newton};

fn cavity(nx: usize, ny: usize, reynolds: f64) -> Discretization {
    let grid = GridMetrics::uniform_plane(0.0, 1.0, nx, 0.0, 1.0, ny);
    let layout = VariableLayout::new(2, false);
    let parameters = Parameters {
        reynolds,
        ..Parameters::default()
    };
    Discretization::new(parameters, grid, layout).unwrap()
}

#[test]
fn stokes_cavity_converges_from_zero_state() {
    let disc = cavity(4, 4, 0.0);
    let x0 = vec![0.0; disc.state_len()];

    let outcome = newton(&disc, &DenseLuSolve, &x0).unwrap();

    println!(
        "Stokes cavity converged in {} iterations, residual norm {}",
        outcome.iterations, outcome.residual_norm
    );
    assert!(outcome.converged);
    assert_eq!(outcome.x, x0, "Stokes cavity at rest should already be a residual root");
}

#[test]
fn moderate_reynolds_cavity_converges_to_a_moving_state() {
    let disc = cavity(5, 5, 100.0);
    let x0 = vec![0.0; disc.state_len()];

    let outcome = newton(&disc, &DenseLuSolve, &x0).unwrap();

    println!(
        "Re=100 cavity converged in {} iterations, residual norm {}",
        outcome.iterations, outcome.residual_norm
    );
    assert!(outcome.converged, "Newton should converge for a well-posed lid-driven cavity at Re=100");

    let norm: f64 = outcome.x.iter().map(|v| v * v).sum::<f64>().sqrt();
    assert!(norm > 0.0, "the lid should drive a nontrivial flow field");
}

#[test]
fn newton_outcome_residual_is_consistent_with_discretization_rhs() {
    let disc = cavity(4, 4, 50.0);
    let x0 = vec![0.0; disc.state_len()];
    let outcome = newton(&disc, &DenseLuSolve, &x0).unwrap();

    let r = disc.rhs(&outcome.x);
    let r_norm: f64 = r.iter().map(|v| v * v).sum::<f64>().sqrt();
    assert!(
        (r_norm - outcome.residual_norm).abs() < 1e-6,
        "reported residual norm {} should match rhs(x) norm {}",
        outcome.residual_norm,
        r_norm
    );
}
