//! Adam optimizer

use super::{ConvergenceStatus, OptimizationResult, Optimizer};
use crate::error::{Result, SimulatorError};
use crate::gradient::{Gradient, Objective};
use crate::schedule::Schedule;
use fastqaoa_state::Real;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Adam optimizer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdamConfig {
    /// Learning rate
    pub learning_rate: Real,
    /// Maximum iterations
    pub max_iterations: usize,
    /// Convergence tolerance on the change of the objective
    pub tolerance: Real,
    /// Beta1 (exponential decay rate for first moment)
    pub beta1: Real,
    /// Beta2 (exponential decay rate for second moment)
    pub beta2: Real,
    /// Epsilon (small constant for numerical stability)
    pub epsilon: Real,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            max_iterations: 1000,
            tolerance: 1e-6,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }
}

impl AdamConfig {
    pub fn with_learning_rate(mut self, learning_rate: Real) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: Real) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0) {
            return Err(SimulatorError::InvalidConfig(format!(
                "learning_rate must be > 0, got {}",
                self.learning_rate
            )));
        }
        if self.max_iterations == 0 {
            return Err(SimulatorError::InvalidConfig(
                "max_iterations must be > 0".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.beta1) || !(0.0..1.0).contains(&self.beta2) {
            return Err(SimulatorError::InvalidConfig(format!(
                "beta1 and beta2 must be in [0,1), got {} and {}",
                self.beta1, self.beta2
            )));
        }
        if !(self.epsilon > 0.0) || self.tolerance < 0.0 {
            return Err(SimulatorError::InvalidConfig(
                "epsilon must be > 0 and tolerance >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Adam optimizer
///
/// Adaptive Moment Estimation keeps running averages of the gradient and its
/// square per parameter and folds the bias correction of both into the step
/// size, `lr·sqrt(1 − β2^t)/(1 − β1^t)`.
#[derive(Debug, Clone, Default)]
pub struct AdamOptimizer {
    config: AdamConfig,
}

impl AdamOptimizer {
    pub fn new(config: AdamConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AdamConfig {
        &self.config
    }
}

impl Optimizer for AdamOptimizer {
    fn optimize<O: Objective + ?Sized>(
        &self,
        objective: &mut O,
        initial: &Schedule,
    ) -> Result<OptimizationResult> {
        let config = &self.config;
        config.validate()?;

        let mut params = initial.to_vec();
        let num_params = params.len();

        // First and second moment estimates
        let mut m = vec![0.0; num_params];
        let mut v = vec![0.0; num_params];

        let mut schedule = initial.clone();
        let mut gradient = Gradient::zeros(initial.depth());
        let mut trace_values = Vec::new();
        let mut prev_value = Real::INFINITY;

        for iteration in 0..config.max_iterations {
            let value = objective.evaluate(&schedule, &mut gradient)?;
            trace_values.push(value);
            trace!(iteration, value, "adam iteration");

            if (prev_value - value).abs() <= config.tolerance {
                debug!(iterations = iteration + 1, value, "adam converged");
                return Ok(OptimizationResult {
                    schedule,
                    value,
                    status: ConvergenceStatus::Converged,
                    iterations: iteration + 1,
                    trace: trace_values,
                });
            }
            prev_value = value;

            let t = (iteration + 1) as i32;
            let step = config.learning_rate * (1.0 - config.beta2.powi(t)).sqrt()
                / (1.0 - config.beta1.powi(t));

            for (i, g) in gradient.to_vec().into_iter().enumerate() {
                m[i] = config.beta1 * m[i] + (1.0 - config.beta1) * g;
                v[i] = config.beta2 * v[i] + (1.0 - config.beta2) * g * g;
                params[i] -= step * m[i] / (v[i].sqrt() + config.epsilon);
            }
            schedule = Schedule::from_flat(&params)?;
        }

        // Max iterations reached
        let value = objective.value(&schedule)?;
        trace_values.push(value);
        debug!(
            iterations = config.max_iterations,
            value, "adam reached the iteration limit"
        );

        Ok(OptimizationResult {
            schedule,
            value,
            status: ConvergenceStatus::MaxIterations,
            iterations: config.max_iterations,
            trace: trace_values,
        })
    }
}
