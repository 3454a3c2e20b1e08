//! Black-box pseudo-arclength continuation runs against the lid-driven
//! cavity, driven only through the public `tf-continuation` API surface.

use tf_continuation::{ReynoldsContinuation, continuation};
use tf_discretization::{Parameters, VariableLayout};
use tf_grid::GridMetrics;
use tf_solver::DenseLuSolve;

#[test]
fn continuation_reaches_target_reynolds_number_from_rest() {
    let grid = GridMetrics::uniform_box(0.0, 1.0, 4, 0.0, 1.0, 4, 0.0, 1.0, 4);
    let layout = VariableLayout::new(3, false);
    let problem = ReynoldsContinuation::new(Parameters::default(), grid, layout);

    let x0 = vec![0.0; 4 * 4 * 4 * layout.dof()];

    let outcome = continuation(
        &problem,
        &DenseLuSolve,
        x0,
        0.0,
        100.0,
        10.0,
        1e-3,
        100.0,
        3,
        30,
        1e-8,
        200,
        None,
    )
    .unwrap();

    println!("reached mu={} in {} steps", outcome.mu, outcome.steps);
    assert!((outcome.mu - 100.0).abs() < 1e-6, "continuation should land exactly on the target");

    let norm: f64 = outcome.x.iter().map(|v| v * v).sum::<f64>().sqrt();
    assert!(norm > 0.0, "branch tracking from rest should leave the cavity in nontrivial motion");
}

#[test]
fn continuation_progress_callback_reports_monotonically_increasing_steps() {
    let grid = GridMetrics::uniform_plane(0.0, 1.0, 4, 0.0, 1.0, 4);
    let layout = VariableLayout::new(2, false);
    let problem = ReynoldsContinuation::new(Parameters::default(), grid, layout);
    let x0 = vec![0.0; 4 * 4 * layout.dof()];

    let mut seen_steps = Vec::new();
    let mut observer = |event: tf_continuation::ContinuationProgressEvent| {
        if let tf_continuation::ContinuationProgressEvent::StepStarted { step, .. } = event {
            seen_steps.push(step);
        }
    };

    let outcome = continuation(
        &problem,
        &DenseLuSolve,
        x0,
        0.0,
        50.0,
        5.0,
        1e-3,
        50.0,
        3,
        30,
        1e-8,
        100,
        Some(&mut observer),
    )
    .unwrap();

    println!("observed {} StepStarted events across {} accepted steps", seen_steps.len(), outcome.steps);
    assert!(!seen_steps.is_empty(), "the progress callback should fire at least once");
    for pair in seen_steps.windows(2) {
        assert!(pair[1] >= pair[0], "step indices should never go backwards");
    }
}
