//! Solution-quality metrics of a final state

use crate::error::{Result, SimulatorError};
use fastqaoa_state::{Diagonals, Real, StateVector, CMP_TOLERANCE};
use serde::{Deserialize, Serialize};

/// Quality summary of a state with respect to a cost function
///
/// Ratios are taken relative to the cost minimum, so for a minimization
/// problem with negative costs an approximation ratio of 1 means all mass
/// sits on optimal solutions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Expected cost ⟨C⟩
    pub energy: Real,
    /// ⟨C⟩ / min C
    pub approx_ratio: Real,
    /// Probability of measuring a feasible bitstring
    pub feasible_ratio: Real,
    /// Approximation ratio conditioned on feasibility
    pub feasible_approx_ratio: Real,
    /// Mass on optimal solutions
    pub p_opt: Real,
    /// Mass within 0.1% of the optimum
    pub p_999: Real,
    /// Mass within 1% of the optimum
    pub p_99: Real,
    /// Mass within 10% of the optimum
    pub p_9: Real,
    /// Improvement over uniform random guessing, normalized so the optimum is 1
    pub random_approx_ratio: Real,
    pub min_val: Real,
    /// Mean cost of a uniformly random bitstring
    pub random_val: Real,
    pub max_val: Real,
}

impl Metrics {
    /// Evaluate `state` against `cost`
    ///
    /// Without a constraint every bitstring counts as feasible; with one,
    /// entries `>= 0` are feasible. Operators narrower than the state are
    /// broadcast like [`StateVector::mult_diagonals`].
    ///
    /// # Errors
    /// [`SimulatorError::QubitMismatch`] if an operator is wider than the
    /// state, [`SimulatorError::ZeroMinimum`] if the cost minimum is zero.
    pub fn compute(
        state: &StateVector,
        cost: &Diagonals,
        constraint: Option<&Diagonals>,
    ) -> Result<Self> {
        for dg in std::iter::once(cost).chain(constraint) {
            if dg.num_qubits() > state.num_qubits() {
                return Err(SimulatorError::QubitMismatch {
                    expected: state.num_qubits(),
                    actual: dg.num_qubits(),
                });
            }
        }

        let min_val = cost.min_val();
        if min_val == 0.0 {
            return Err(SimulatorError::ZeroMinimum);
        }

        let mut metrics = Metrics {
            min_val,
            max_val: cost.max_val(),
            ..Default::default()
        };

        let costs = cost.values();
        for (i, amplitude) in state.amplitudes().iter().enumerate() {
            let p = amplitude.norm_sqr();
            let value = costs[i % costs.len()];
            let ratio = value / min_val;
            let gap = 1.0 - ratio;

            metrics.energy += p * value;
            metrics.approx_ratio += p * ratio;
            metrics.random_val += value;

            let feasible = constraint
                .map(|k| k.values()[i % k.dimension()] >= 0.0)
                .unwrap_or(true);
            if feasible {
                metrics.feasible_ratio += p;
                metrics.feasible_approx_ratio += p * ratio;
            }

            if gap < CMP_TOLERANCE {
                metrics.p_opt += p;
            }
            if gap < 1e-3 {
                metrics.p_999 += p;
            }
            if gap < 1e-2 {
                metrics.p_99 += p;
            }
            if gap < 1e-1 {
                metrics.p_9 += p;
            }
        }

        if metrics.feasible_ratio > 0.0 {
            metrics.feasible_approx_ratio /= metrics.feasible_ratio;
        }
        metrics.random_val /= state.dimension() as Real;

        let spread = metrics.random_val - min_val;
        // Constant cost: every state is optimal and random
        metrics.random_approx_ratio = if spread == 0.0 {
            0.0
        } else {
            (metrics.random_val - metrics.energy) / spread
        };

        Ok(metrics)
    }
}
