//! Gradient containers and the objective interface used by optimizers
//!
//! Both circuit variants compute their gradients by the adjoint method: one
//! forward sweep, then a single reverse walk over the layers that peels off
//! one mixer and one phase layer at a time from a pair of registers. The
//! pieces shared by the two sweeps live here.

use crate::error::{Result, SimulatorError};
use crate::schedule::Schedule;
use fastqaoa_state::{Complex, Real, StateVector};
use serde::{Deserialize, Serialize};

/// Per-layer partial derivatives of an objective
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Gradient {
    /// ∂E/∂β_p
    pub betas: Vec<Real>,
    /// ∂E/∂γ_p
    pub gammas: Vec<Real>,
}

impl Gradient {
    /// All-zero gradient for `depth` layers
    pub fn zeros(depth: usize) -> Self {
        Self {
            betas: vec![0.0; depth],
            gammas: vec![0.0; depth],
        }
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.betas.len()
    }

    /// Resize to `depth` layers and clear every entry
    pub(crate) fn reset(&mut self, depth: usize) {
        self.betas.clear();
        self.betas.resize(depth, 0.0);
        self.gammas.clear();
        self.gammas.resize(depth, 0.0);
    }

    /// Flat layout matching [`Schedule::to_vec`]
    pub fn to_vec(&self) -> Vec<Real> {
        let mut flat = Vec::with_capacity(2 * self.depth());
        flat.extend_from_slice(&self.betas);
        flat.extend_from_slice(&self.gammas);
        flat
    }

    /// Euclidean norm over all entries
    pub fn norm(&self) -> Real {
        self.betas
            .iter()
            .chain(&self.gammas)
            .map(|g| g * g)
            .sum::<Real>()
            .sqrt()
    }
}

/// Result of one value-and-gradient evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientEvaluation {
    /// Expectation value of the cost operator
    pub value: Real,
    pub gradient: Gradient,
    /// Retained probability mass, for the constrained variant only
    pub success_probability: Option<Real>,
}

/// β-derivative functional of one mixer layer
///
/// Computes `Σ_i −2·Im(conj(Σ_j right[i ⊕ 2^j]) · left[i])`, i.e.
/// `2·Im⟨left|B|right⟩` with `B = Σ_j X_j`. Evaluated right after a mixer
/// layer this is the derivative of `Re⟨left|right⟩` with respect to the
/// layer's angle.
pub fn sum_x_product(left: &StateVector, right: &StateVector) -> Result<Real> {
    if left.num_qubits() != right.num_qubits() {
        return Err(SimulatorError::QubitMismatch {
            expected: left.num_qubits(),
            actual: right.num_qubits(),
        });
    }

    let num_qubits = right.num_qubits();
    let right = right.amplitudes();
    let total: Real = left
        .amplitudes()
        .iter()
        .enumerate()
        .map(|(i, l)| {
            let flipped: Complex = (0..num_qubits).map(|j| right[i ^ (1 << j)]).sum();
            -2.0 * (flipped.conj() * l).im
        })
        .sum();
    Ok(total)
}

/// Value-and-gradient oracle consumed by the optimizers
///
/// Implementations own whatever registers and plans they need, so repeated
/// evaluations do not allocate. An objective must not be shared across
/// threads while it is being evaluated.
pub trait Objective {
    /// Qubit count of the underlying circuit
    fn num_qubits(&self) -> usize;

    /// Evaluate the objective at `schedule`, writing its gradient
    ///
    /// `gradient` is resized to the schedule's depth.
    fn evaluate(&mut self, schedule: &Schedule, gradient: &mut Gradient) -> Result<Real>;

    /// Evaluate the objective without keeping the gradient
    fn value(&mut self, schedule: &Schedule) -> Result<Real> {
        let mut gradient = Gradient::zeros(schedule.depth());
        self.evaluate(schedule, &mut gradient)
    }
}

impl<T: Objective + ?Sized> Objective for &mut T {
    fn num_qubits(&self) -> usize {
        (**self).num_qubits()
    }

    fn evaluate(&mut self, schedule: &Schedule, gradient: &mut Gradient) -> Result<Real> {
        (**self).evaluate(schedule, gradient)
    }

    fn value(&mut self, schedule: &Schedule) -> Result<Real> {
        (**self).value(schedule)
    }
}
