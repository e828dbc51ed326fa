//! QAOA Example: MaxCut Problem
//!
//! Optimizes a depth-3 QAOA circuit for MaxCut on a 6-vertex graph, first
//! with a coarse grid search and then with depth-by-depth L-BFGS.
//!
//! Run with: RUST_LOG=fastqaoa_sim=debug cargo run --example qaoa_maxcut

use fastqaoa_sim::{
    grid_search, optimize_interpolated, qaoa, AdamConfig, AdamOptimizer, LbfgsOptimizer,
    Metrics, Optimizer, QaoaObjective, SimulatorConfig,
};
use fastqaoa_state::{sample, Diagonals, Real, SampleCounts};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("QAOA: MaxCut Problem\n");
    println!("====================\n");

    // Graph: hexagon with two chords
    let num_qubits = 6;
    let edges = [(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0), (0, 3), (1, 4)];

    // Negated cut size: Σ 2·x_i·x_j − x_i − x_j over the edges
    let mut masks = Vec::new();
    let mut coeffs = Vec::new();
    for &(i, j) in &edges {
        masks.extend_from_slice(&[1u64 << i, 1u64 << j, (1u64 << i) | (1u64 << j)]);
        coeffs.extend_from_slice(&[-1.0, -1.0, 2.0]);
    }
    let cost = Diagonals::brute_force(num_qubits, &masks, &coeffs)?;
    println!("Maximum cut: {}", -cost.min_val());

    let config = SimulatorConfig::fast();
    let pi = std::f64::consts::PI as Real;

    // Step 1: coarse scan at depth 1
    let grid = grid_search(&config, &cost, &cost, 1, 16, (0.0, pi), (0.0, pi))?;
    println!(
        "Grid search: beta = {:.4}, gamma = {:.4}, energy = {:.6}",
        grid.beta_scale, grid.gamma_scale, grid.value
    );

    // Step 2: warm-started L-BFGS up to depth 3
    let mut objective = QaoaObjective::new(&cost, &cost, &config)?;
    let lbfgs = LbfgsOptimizer::default();
    let results = optimize_interpolated(&mut objective, &lbfgs, &[1, 2, 3], &grid.schedule)?;

    println!("\nDepth | Energy     | Iterations | Status");
    println!("------+------------+------------+--------------");
    for (depth, result) in &results {
        println!(
            "{:5} | {:10.6} | {:10} | {:?}",
            depth, result.value, result.iterations, result.status
        );
    }

    // Step 3: polish the deepest schedule with Adam
    let Some(best) = results.values().last() else {
        return Ok(());
    };
    let adam = AdamOptimizer::new(AdamConfig::default().with_max_iterations(200));
    let polished = adam.optimize(&mut objective, &best.schedule)?;
    println!("\nAdam polish: {:.6} -> {:.6}", best.value, polished.value);

    // Final state quality
    let state = qaoa(&cost, &polished.schedule)?;
    let metrics = Metrics::compute(&state, &cost, None)?;
    println!("\nApproximation ratio: {:.4}", metrics.approx_ratio);
    println!("P(optimal):          {:.4}", metrics.p_opt);
    println!("Random baseline:     {:.4}", metrics.random_val);

    let mut rng = StdRng::seed_from_u64(7);
    let counts = SampleCounts::from_samples(&sample(&state, 1000, &mut rng));
    println!("\nMost frequent cuts (1000 shots):");
    for (outcome, count) in counts.sorted_outcomes().into_iter().take(5) {
        println!("  {:0width$b}: {count}", outcome, width = num_qubits);
    }

    Ok(())
}
