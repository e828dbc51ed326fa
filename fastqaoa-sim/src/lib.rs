//! Fast QAOA simulation with adjoint gradients
//!
//! This crate implements the circuit layer on top of `fastqaoa-state`:
//! the transverse-field mixer as a radix-2/4/8 butterfly transform, QAOA
//! and QPE-QAOA forward simulation, reverse-mode gradients with a constant
//! number of registers, and optimizers over layer angles.
//!
//! # Features
//!
//! - **Butterfly mixer**: `exp(−iβ Σ X_j)` in `⌈n / 3⌉` to `n` passes over the state
//! - **Adjoint gradients**: exact gradients for all `2p` angles in one backward sweep
//! - **QPE-QAOA**: constraint filtering with success-probability tracking
//! - **Optimizers**: Adam and L-BFGS, plus grid search, linear-ramp scaling
//!   and depth interpolation for initialization
//! - **Batch evaluation**: rayon-parallel energies for many schedules
//! - **Metrics**: approximation ratios and near-optimal probability mass
//!
//! # Example
//!
//! ```
//! use fastqaoa_sim::{
//!     AdamConfig, AdamOptimizer, Optimizer, QaoaObjective, Schedule, SimulatorConfig,
//! };
//! use fastqaoa_state::Diagonals;
//!
//! // Negated MaxCut of a triangle: Σ 2·x_i·x_j − x_i − x_j over the edges
//! let masks = [0b001, 0b010, 0b100, 0b011, 0b110, 0b101];
//! let cost = Diagonals::brute_force(3, &masks, &[-2.0, -2.0, -2.0, 2.0, 2.0, 2.0])?;
//! let config = SimulatorConfig::default();
//!
//! let mut objective = QaoaObjective::new(&cost, &cost, &config)?;
//! let optimizer = AdamOptimizer::new(AdamConfig::default().with_max_iterations(20));
//! let result = optimizer.optimize(&mut objective, &Schedule::linear(2))?;
//!
//! assert_eq!(result.schedule.depth(), 2);
//! # Ok::<(), fastqaoa_sim::SimulatorError>(())
//! ```

pub mod config;
pub mod error;
pub mod finite_difference;
pub mod gradient;
pub mod metrics;
pub mod mixer;
pub mod optimize;
pub mod qaoa;
pub mod qpe_qaoa;
pub mod schedule;

pub use config::SimulatorConfig;
pub use error::{Result, SimulatorError};
pub use finite_difference::{
    finite_difference_gradient, finite_difference_gradient_with, FiniteDifferenceMethod,
};
pub use gradient::{sum_x_product, Gradient, GradientEvaluation, Objective};
pub use metrics::Metrics;
pub use mixer::{apply_mixer, decompose, MixerPlan, Radix};
pub use optimize::{
    grid_search, optimize_interpolated, optimize_linear, AdamConfig, AdamOptimizer,
    ConvergenceStatus, GridSearchResult, LbfgsConfig, LbfgsOptimizer, LinearRampObjective,
    LinearRampResult, OptimizationResult, Optimizer,
};
pub use qaoa::{apply_phase, energy, grad_qaoa, multi_energy, qaoa, QaoaObjective, QaoaSimulator};
pub use qpe_qaoa::{
    apply_qpe_phase, apply_qpe_phase_normalized, grad_qpe_qaoa, qpe_qaoa, qpe_qaoa_normalized,
    QpeOutcome, QpeQaoaObjective, QpeQaoaSimulator,
};
pub use schedule::Schedule;
