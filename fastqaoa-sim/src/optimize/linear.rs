//! Two-parameter search along a fixed linear ramp
//!
//! Instead of tuning all `2p` angles, the ramp of [`Schedule::linear`] is
//! kept fixed and only its overall β and γ magnitudes are optimized. The
//! reduced problem is presented to the optimizers as a depth-1 schedule
//! `(Δβ, Δγ)`.

use super::{dot, OptimizationResult, Optimizer};
use crate::error::{Result, SimulatorError};
use crate::gradient::{Gradient, Objective};
use crate::schedule::Schedule;
use fastqaoa_state::Real;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Objective over the scales `(Δβ, Δγ)` of a fixed ramp
///
/// The full-depth schedule is `ramp.scaled(Δβ, Δγ)`, so by the chain rule
/// the reduced gradient is `(∂E/∂β · ramp_β, ∂E/∂γ · ramp_γ)`.
#[derive(Debug)]
pub struct LinearRampObjective<O> {
    inner: O,
    ramp: Schedule,
    full_gradient: Gradient,
}

impl<O: Objective> LinearRampObjective<O> {
    /// Scale the linear ramp of `depth` layers
    ///
    /// # Errors
    /// Returns [`SimulatorError::InvalidConfig`] for `depth == 0`.
    pub fn new(inner: O, depth: usize) -> Result<Self> {
        if depth == 0 {
            return Err(SimulatorError::InvalidConfig(
                "linear ramp needs at least one layer".to_string(),
            ));
        }
        Ok(Self::with_ramp(inner, Schedule::linear(depth)))
    }

    /// Scale an arbitrary fixed ramp
    pub fn with_ramp(inner: O, ramp: Schedule) -> Self {
        let full_gradient = Gradient::zeros(ramp.depth());
        Self {
            inner,
            ramp,
            full_gradient,
        }
    }

    #[inline]
    pub fn ramp(&self) -> &Schedule {
        &self.ramp
    }

    #[inline]
    pub fn inner(&self) -> &O {
        &self.inner
    }

    pub fn into_inner(self) -> O {
        self.inner
    }

    /// Full-depth schedule for the scales stored in a depth-1 `scales`
    pub fn expand(&self, scales: &Schedule) -> Result<Schedule> {
        if scales.depth() != 1 {
            return Err(SimulatorError::InvalidConfig(format!(
                "ramp scales are a single layer, got depth {}",
                scales.depth()
            )));
        }
        Ok(self.ramp.scaled(scales.betas()[0], scales.gammas()[0]))
    }
}

impl<O: Objective> Objective for LinearRampObjective<O> {
    fn num_qubits(&self) -> usize {
        self.inner.num_qubits()
    }

    fn evaluate(&mut self, scales: &Schedule, gradient: &mut Gradient) -> Result<Real> {
        let full = self.expand(scales)?;
        let value = self.inner.evaluate(&full, &mut self.full_gradient)?;

        gradient.reset(1);
        gradient.betas[0] = dot(&self.full_gradient.betas, self.ramp.betas());
        gradient.gammas[0] = dot(&self.full_gradient.gammas, self.ramp.gammas());
        Ok(value)
    }

    fn value(&mut self, scales: &Schedule) -> Result<Real> {
        let full = self.expand(scales)?;
        self.inner.value(&full)
    }
}

/// Outcome of [`optimize_linear`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRampResult {
    pub beta_scale: Real,
    pub gamma_scale: Real,
    /// The ramp scaled by the optimal magnitudes
    pub schedule: Schedule,
    /// Run over the scales, with `schedule` holding `(Δβ, Δγ)` as one layer
    pub optimization: OptimizationResult,
}

/// Optimize the β and γ magnitudes of a `depth`-layer linear ramp
///
/// Works for any objective, constrained or not; `initial` is the starting
/// `(Δβ, Δγ)`.
pub fn optimize_linear<O, P>(
    objective: &mut O,
    optimizer: &P,
    depth: usize,
    initial: (Real, Real),
) -> Result<LinearRampResult>
where
    O: Objective + ?Sized,
    P: Optimizer,
{
    let mut reduced = LinearRampObjective::new(objective, depth)?;
    let start = Schedule::new(vec![initial.0], vec![initial.1])?;
    let optimization = optimizer.optimize(&mut reduced, &start)?;

    let schedule = reduced.expand(&optimization.schedule)?;
    let beta_scale = optimization.schedule.betas()[0];
    let gamma_scale = optimization.schedule.gammas()[0];
    debug!(
        depth,
        beta_scale,
        gamma_scale,
        value = optimization.value,
        "linear ramp optimized"
    );

    Ok(LinearRampResult {
        beta_scale,
        gamma_scale,
        schedule,
        optimization,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulatorConfig;
    use crate::finite_difference::finite_difference_gradient;
    use crate::optimize::LbfgsOptimizer;
    use crate::qaoa::{energy, QaoaObjective};
    use approx::assert_relative_eq;
    use fastqaoa_state::Diagonals;

    const TOL: Real = if cfg!(feature = "f32") { 1e-4 } else { 1e-10 };
    const FD_STEP: Real = if cfg!(feature = "f32") { 1e-2 } else { 1e-5 };
    const FD_TOLERANCE: Real = if cfg!(feature = "f32") { 1e-2 } else { 1e-7 };

    fn ring_cost(n: usize) -> Diagonals {
        let values: Vec<Real> = (0..1usize << n)
            .map(|x| {
                let cut = (0..n)
                    .filter(|&i| ((x >> i) & 1) != ((x >> ((i + 1) % n)) & 1))
                    .count();
                -(cut as Real)
            })
            .collect();
        Diagonals::from_values(&values).unwrap()
    }

    #[test]
    fn test_reduced_gradient_matches_finite_difference() {
        let cost = ring_cost(4);
        let config = SimulatorConfig::default();
        let inner = QaoaObjective::new(&cost, &cost, &config).unwrap();
        let mut reduced = LinearRampObjective::new(inner, 3).unwrap();

        let scales = Schedule::new(vec![0.7], vec![1.1]).unwrap();
        let mut gradient = Gradient::zeros(0);
        let value = reduced.evaluate(&scales, &mut gradient).unwrap();
        assert_eq!(gradient.depth(), 1);

        let full = Schedule::linear(3).scaled(0.7, 1.1);
        assert_relative_eq!(value, energy(&cost, &cost, &full).unwrap(), epsilon = TOL);

        let reference = finite_difference_gradient(|s| reduced.value(s), &scales, FD_STEP).unwrap();
        assert_relative_eq!(gradient.betas[0], reference.betas[0], epsilon = FD_TOLERANCE);
        assert_relative_eq!(gradient.gammas[0], reference.gammas[0], epsilon = FD_TOLERANCE);
    }

    #[test]
    fn test_rejects_deep_scales() {
        let cost = ring_cost(3);
        let config = SimulatorConfig::default();
        let inner = QaoaObjective::new(&cost, &cost, &config).unwrap();
        let mut reduced = LinearRampObjective::new(inner, 2).unwrap();

        let mut gradient = Gradient::zeros(0);
        assert!(reduced.evaluate(&Schedule::linear(2), &mut gradient).is_err());
        assert!(LinearRampObjective::new(QaoaObjective::new(&cost, &cost, &config).unwrap(), 0)
            .is_err());
    }

    #[test]
    fn test_optimize_linear_improves_start() {
        let cost = ring_cost(4);
        let config = SimulatorConfig::default();
        let mut objective = QaoaObjective::new(&cost, &cost, &config).unwrap();

        let result =
            optimize_linear(&mut objective, &LbfgsOptimizer::default(), 4, (0.5, 0.5)).unwrap();

        let start = energy(&cost, &cost, &Schedule::linear(4).scaled(0.5, 0.5)).unwrap();
        assert!(result.optimization.value <= start + TOL);
        assert_eq!(result.schedule.depth(), 4);
        assert_eq!(
            result.schedule,
            Schedule::linear(4).scaled(result.beta_scale, result.gamma_scale)
        );
        assert_relative_eq!(
            energy(&cost, &cost, &result.schedule).unwrap(),
            result.optimization.value,
            epsilon = TOL
        );
    }
}
