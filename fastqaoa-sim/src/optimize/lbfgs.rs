//! L-BFGS optimizer
//!
//! Limited-memory BFGS approximates the inverse Hessian from the last few
//! parameter and gradient differences. Gradients come from the adjoint
//! sweep of the objective, so every iteration costs one gradient
//! evaluation plus the forward passes of the line search.

use super::{dot, ConvergenceStatus, OptimizationResult, Optimizer};
use crate::error::{Result, SimulatorError};
use crate::gradient::{Gradient, Objective};
use crate::schedule::Schedule;
use fastqaoa_state::Real;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Configuration for L-BFGS optimizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LbfgsConfig {
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// Convergence tolerance on the change of the objective
    pub tolerance: Real,
    /// Number of corrections kept to approximate the inverse Hessian
    pub memory_size: usize,
    /// Maximum number of backtracking steps per line search
    pub max_line_search_iterations: usize,
    /// Armijo sufficient decrease constant
    pub armijo: Real,
    /// Step shrink factor while backtracking
    pub backtrack: Real,
}

impl Default for LbfgsConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-6,
            memory_size: 6,
            max_line_search_iterations: 20,
            armijo: 1e-4,
            backtrack: 0.5,
        }
    }
}

impl LbfgsConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: Real) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_memory_size(mut self, memory_size: usize) -> Self {
        self.memory_size = memory_size;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 || self.memory_size == 0 || self.max_line_search_iterations == 0
        {
            return Err(SimulatorError::InvalidConfig(
                "max_iterations, memory_size and max_line_search_iterations must be > 0"
                    .to_string(),
            ));
        }
        if !(self.armijo > 0.0 && self.armijo < 1.0) || !(self.backtrack > 0.0 && self.backtrack < 1.0)
        {
            return Err(SimulatorError::InvalidConfig(format!(
                "armijo and backtrack must be in (0,1), got {} and {}",
                self.armijo, self.backtrack
            )));
        }
        if self.tolerance < 0.0 {
            return Err(SimulatorError::InvalidConfig(format!(
                "tolerance must be >= 0, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// One stored curvature pair
#[derive(Debug, Clone)]
struct Correction {
    s: Vec<Real>,
    y: Vec<Real>,
    rho: Real,
}

/// L-BFGS optimizer for layer angles
#[derive(Debug, Clone, Default)]
pub struct LbfgsOptimizer {
    config: LbfgsConfig,
}

impl LbfgsOptimizer {
    pub fn new(config: LbfgsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LbfgsConfig {
        &self.config
    }

    /// Search direction from the two-loop recursion
    fn direction(gradient: &[Real], history: &VecDeque<Correction>) -> Vec<Real> {
        let mut q = gradient.to_vec();
        let mut alpha = vec![0.0; history.len()];

        // First loop (newest to oldest)
        for (i, c) in history.iter().enumerate().rev() {
            alpha[i] = c.rho * dot(&c.s, &q);
            for (qj, yj) in q.iter_mut().zip(&c.y) {
                *qj -= alpha[i] * yj;
            }
        }

        // Initial Hessian scaling from the newest pair
        let scale = history
            .back()
            .map(|c| dot(&c.s, &c.y) / dot(&c.y, &c.y))
            .unwrap_or(1.0);
        let mut r: Vec<Real> = q.iter().map(|qi| scale * qi).collect();

        // Second loop (oldest to newest)
        for (i, c) in history.iter().enumerate() {
            let beta = c.rho * dot(&c.y, &r);
            for (rj, sj) in r.iter_mut().zip(&c.s) {
                *rj += sj * (alpha[i] - beta);
            }
        }

        r.iter().map(|ri| -ri).collect()
    }

    /// Backtracking line search enforcing the Armijo condition
    ///
    /// Returns the accepted parameters or `None` when no step length
    /// gives sufficient decrease.
    fn line_search<O: Objective + ?Sized>(
        &self,
        objective: &mut O,
        params: &[Real],
        direction: &[Real],
        value: Real,
        slope: Real,
    ) -> Result<Option<Vec<Real>>> {
        let mut alpha = 1.0;
        for _ in 0..self.config.max_line_search_iterations {
            let candidate: Vec<Real> = params
                .iter()
                .zip(direction)
                .map(|(p, d)| p + alpha * d)
                .collect();
            let trial = objective.value(&Schedule::from_flat(&candidate)?)?;
            if trial <= value + self.config.armijo * alpha * slope {
                return Ok(Some(candidate));
            }
            alpha *= self.config.backtrack;
        }
        Ok(None)
    }
}

impl Optimizer for LbfgsOptimizer {
    fn optimize<O: Objective + ?Sized>(
        &self,
        objective: &mut O,
        initial: &Schedule,
    ) -> Result<OptimizationResult> {
        let config = &self.config;
        config.validate()?;

        let mut schedule = initial.clone();
        let mut params = schedule.to_vec();
        let mut gradient = Gradient::zeros(schedule.depth());
        let mut value = objective.evaluate(&schedule, &mut gradient)?;
        let mut grad = gradient.to_vec();

        let mut history: VecDeque<Correction> = VecDeque::with_capacity(config.memory_size);
        let mut trace_values = vec![value];
        // rejected line-search trials leave the objective at another point
        let mut stale = false;

        for iteration in 0..config.max_iterations {
            let mut direction = Self::direction(&grad, &history);
            let mut slope = dot(&grad, &direction);
            if slope >= 0.0 {
                // Not a descent direction, restart from steepest descent
                history.clear();
                direction = grad.iter().map(|g| -g).collect();
                slope = -dot(&grad, &grad);
            }

            if slope == 0.0 {
                debug!(iterations = iteration, value, "l-bfgs at stationary point");
                return Ok(OptimizationResult {
                    schedule,
                    value,
                    status: ConvergenceStatus::Converged,
                    iterations: iteration,
                    trace: trace_values,
                });
            }

            let next = match self.line_search(objective, &params, &direction, value, slope)? {
                Some(next) => next,
                None if !history.is_empty() => {
                    trace!(iteration, "line search failed, resetting history");
                    history.clear();
                    stale = true;
                    continue;
                }
                None => {
                    debug!(iterations = iteration, value, "l-bfgs line search exhausted");
                    let value = objective.value(&schedule)?;
                    return Ok(OptimizationResult {
                        schedule,
                        value,
                        status: ConvergenceStatus::Converged,
                        iterations: iteration,
                        trace: trace_values,
                    });
                }
            };

            let next_schedule = Schedule::from_flat(&next)?;
            let next_value = objective.evaluate(&next_schedule, &mut gradient)?;
            stale = false;
            let next_grad = gradient.to_vec();

            let s: Vec<Real> = next.iter().zip(&params).map(|(n, o)| n - o).collect();
            let y: Vec<Real> = next_grad.iter().zip(&grad).map(|(n, o)| n - o).collect();
            let sy = dot(&s, &y);
            if sy > Real::EPSILON {
                if history.len() == config.memory_size {
                    history.pop_front();
                }
                history.push_back(Correction { s, y, rho: 1.0 / sy });
            } else {
                history.clear();
            }

            let change = (value - next_value).abs();
            params = next;
            schedule = next_schedule;
            value = next_value;
            grad = next_grad;
            trace_values.push(value);
            trace!(iteration, value, change, "l-bfgs iteration");

            if change <= config.tolerance {
                debug!(iterations = iteration + 1, value, "l-bfgs converged");
                return Ok(OptimizationResult {
                    schedule,
                    value,
                    status: ConvergenceStatus::Converged,
                    iterations: iteration + 1,
                    trace: trace_values,
                });
            }
        }

        if stale {
            value = objective.value(&schedule)?;
        }
        debug!(
            iterations = config.max_iterations,
            value, "l-bfgs reached the iteration limit"
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
