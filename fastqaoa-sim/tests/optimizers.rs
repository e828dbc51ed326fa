//! Optimizer termination and end-to-end QAOA optimization

use fastqaoa_sim::{
    energy, grad_qpe_qaoa, grid_search, optimize_interpolated, optimize_linear, qaoa, AdamConfig,
    AdamOptimizer, ConvergenceStatus, LbfgsConfig, LbfgsOptimizer, Metrics, Objective, Optimizer,
    QaoaObjective, QpeQaoaObjective, Schedule, SimulatorConfig,
};
use fastqaoa_state::{Comparison, Diagonals, QpeIndicator, Real};
use rand::rngs::StdRng;
use rand::SeedableRng;

const TOL: Real = if cfg!(feature = "f32") { 1e-4 } else { 1e-10 };

/// Negated MaxCut of a 5-cycle
fn cycle_cost() -> Diagonals {
    let n = 5;
    let mut masks = Vec::new();
    let mut coeffs = Vec::new();
    for i in 0..n {
        let j = (i + 1) % n;
        masks.extend_from_slice(&[1u64 << i, 1u64 << j, (1u64 << i) | (1u64 << j)]);
        coeffs.extend_from_slice(&[-1.0, -1.0, 2.0]);
    }
    Diagonals::brute_force(n, &masks, &coeffs).unwrap()
}

#[test]
fn adam_hits_iteration_limit() {
    let cost = cycle_cost();
    let config = SimulatorConfig::default();
    let mut objective = QaoaObjective::new(&cost, &cost, &config).unwrap();
    let optimizer = AdamOptimizer::new(
        AdamConfig::default()
            .with_max_iterations(5)
            .with_tolerance(0.0),
    );

    let result = optimizer.optimize(&mut objective, &Schedule::linear(2)).unwrap();
    assert_eq!(result.status, ConvergenceStatus::MaxIterations);
    assert!(!result.converged());
    assert_eq!(result.iterations, 5);
}

#[test]
fn adam_improves_linear_ramp() {
    let cost = cycle_cost();
    let config = SimulatorConfig::default();
    let mut objective = QaoaObjective::new(&cost, &cost, &config).unwrap();
    let optimizer = AdamOptimizer::new(
        AdamConfig::default()
            .with_learning_rate(0.05)
            .with_max_iterations(300),
    );

    let initial = Schedule::linear(2);
    let start = energy(&cost, &cost, &initial).unwrap();
    let result = optimizer.optimize(&mut objective, &initial).unwrap();

    assert!(result.value < start);
    assert!((result.trace[0] - start).abs() < TOL);
}

#[test]
fn lbfgs_converges_on_qaoa() {
    let cost = cycle_cost();
    let config = SimulatorConfig::default();
    let mut objective = QaoaObjective::new(&cost, &cost, &config).unwrap();
    let optimizer = LbfgsOptimizer::new(LbfgsConfig::default().with_max_iterations(200));

    let initial = Schedule::linear(3);
    let start = energy(&cost, &cost, &initial).unwrap();
    let result = optimizer.optimize(&mut objective, &initial).unwrap();

    assert!(result.converged());
    assert!(result.value < start);
    for pair in result.trace.windows(2) {
        assert!(pair[1] <= pair[0] + TOL);
    }

    let state = qaoa(&cost, &result.schedule).unwrap();
    let metrics = Metrics::compute(&state, &cost, None).unwrap();
    assert!((metrics.energy - result.value).abs() < TOL);
    assert!((metrics.approx_ratio - result.value / cost.min_val()).abs() < TOL);
}

#[test]
fn lbfgs_hits_iteration_limit() {
    let cost = cycle_cost();
    let config = SimulatorConfig::default();
    let mut objective = QaoaObjective::new(&cost, &cost, &config).unwrap();
    let optimizer = LbfgsOptimizer::new(
        LbfgsConfig::default()
            .with_max_iterations(1)
            .with_tolerance(0.0),
    );

    let result = optimizer.optimize(&mut objective, &Schedule::linear(2)).unwrap();
    assert_eq!(result.status, ConvergenceStatus::MaxIterations);
    assert_eq!(result.iterations, 1);
}

#[test]
fn lbfgs_on_constrained_objective_tracks_success() {
    let cost = cycle_cost();
    let weight = Diagonals::brute_force(5, &[1, 2, 4, 8, 16], &[1.0; 5]).unwrap();
    let constraint = weight.signed_indicator(2.0, Comparison::Equal);
    let config = SimulatorConfig::default();
    let mut objective = QpeQaoaObjective::new(&cost, &cost, &constraint, &config).unwrap();
    let optimizer = LbfgsOptimizer::new(LbfgsConfig::default().with_max_iterations(50));

    let result = optimizer.optimize(&mut objective, &Schedule::linear(2)).unwrap();
    let success = objective.success_probability().unwrap();
    assert!(success > 0.0 && success <= 1.0 + TOL);
    assert!(result.value.is_finite());

    // the tracked probability belongs to the returned angles
    let fresh = grad_qpe_qaoa(&cost, &cost, &constraint, &result.schedule).unwrap();
    assert!((fresh.success_probability.unwrap() - success).abs() < TOL);
    assert!((fresh.value - result.value).abs() < TOL);
}

#[test]
fn linear_ramp_optimization_on_estimated_constraint() {
    let cost = cycle_cost();
    let weight = Diagonals::brute_force(5, &[1, 2, 4, 8, 16], &[0.25; 5]).unwrap();
    let constraint = QpeIndicator::new(4, 5).unwrap().apply(&weight);
    let config = SimulatorConfig::default();
    let mut objective = QpeQaoaObjective::new(&cost, &cost, &constraint, &config).unwrap();

    let start = Schedule::linear(3).scaled(0.5, 0.5);
    let initial = objective.value(&start).unwrap();
    let result =
        optimize_linear(&mut objective, &LbfgsOptimizer::default(), 3, (0.5, 0.5)).unwrap();

    assert_eq!(result.schedule.depth(), 3);
    assert!(result.optimization.value <= initial + TOL);
    assert_eq!(
        result.schedule,
        Schedule::linear(3).scaled(result.beta_scale, result.gamma_scale)
    );
}

#[test]
fn random_start_is_reproducible() {
    let first = Schedule::random(4, &mut StdRng::seed_from_u64(7));
    let second = Schedule::random(4, &mut StdRng::seed_from_u64(7));
    assert_eq!(first, second);
    assert_eq!(first.depth(), 4);

    let cost = cycle_cost();
    let config = SimulatorConfig::default();
    let mut objective = QaoaObjective::new(&cost, &cost, &config).unwrap();
    let result = LbfgsOptimizer::default().optimize(&mut objective, &first).unwrap();
    assert!(result.value <= energy(&cost, &cost, &first).unwrap() + TOL);
}

#[test]
fn grid_search_seeds_interpolation() {
    let cost = cycle_cost();
    let config = SimulatorConfig::default();
    let pi = std::f64::consts::PI as Real;

    let grid = grid_search(&config, &cost, &cost, 1, 12, (0.0, pi), (0.0, pi)).unwrap();
    let mut objective = QaoaObjective::new(&cost, &cost, &config).unwrap();
    let optimizer = LbfgsOptimizer::default();
    let results = optimize_interpolated(&mut objective, &optimizer, &[1, 2, 4], &grid.schedule)
        .unwrap();

    assert_eq!(results.len(), 3);
    assert!(results[&1].value <= grid.value + TOL);
    for (depth, result) in &results {
        assert_eq!(result.schedule.depth(), *depth);
    }
}
