//! Constrained QAOA with a projective phase layer
//!
//! The phase layer is replaced by a filter that mixes the phase rotation with
//! a feasibility operator `k`:
//!
//! ```text
//! f_i = (½·exp(iγ·c_i) + ½) + (½·exp(iγ·c_i) − ½)·k_i
//! ```
//!
//! With `k_i = +1` the layer is the ordinary phase rotation and with
//! `k_i = −1` it leaves the amplitude alone. Smooth indicators with values
//! strictly between ±1 shrink amplitudes, so the layer is not unitary and the
//! state has to be renormalized. The retained probability mass is reported as
//! the success probability.
//!
//! The adjoint sweep works on the normalized state and tracks a third
//! register holding the back-propagated state itself. Its overlap, weighted
//! by the expectation value, accounts for the derivative of the
//! normalization.
//!
//! A factor `f_i` vanishes only for `k_i = 0` together with `γ·c_i ≡ π`; the
//! gradient divides by `f_i` and is undefined there.

use crate::config::SimulatorConfig;
use crate::error::Result;
use crate::gradient::{sum_x_product, Gradient, GradientEvaluation, Objective};
use crate::mixer::MixerPlan;
use crate::qaoa::{check_operator, phase_factor};
use crate::schedule::Schedule;
use fastqaoa_state::{Complex, Diagonals, Real, StateVector};

/// Pointwise filter factor and its `½·exp(iγc)` component
#[inline]
fn filter_factor(gamma: Real, value: Real, constraint: Real) -> (Complex, Complex) {
    let half = 0.5 * phase_factor(gamma, value);
    ((half + 0.5) + (half - 0.5) * constraint, half)
}

/// Multiply every amplitude by the projective filter factor
pub fn apply_qpe_phase(
    state: &mut StateVector,
    phase: &Diagonals,
    constraint: &Diagonals,
    gamma: Real,
) -> Result<()> {
    check_operator(state.num_qubits(), phase)?;
    check_operator(state.num_qubits(), constraint)?;
    for ((amp, &v), &k) in state
        .amplitudes_mut()
        .iter_mut()
        .zip(phase.values())
        .zip(constraint.values())
    {
        *amp *= filter_factor(gamma, v, k).0;
    }
    Ok(())
}

/// Apply the filter, renormalize, and return the retained mass
pub fn apply_qpe_phase_normalized(
    state: &mut StateVector,
    phase: &Diagonals,
    constraint: &Diagonals,
    gamma: Real,
) -> Result<Real> {
    apply_qpe_phase(state, phase, constraint, gamma)?;
    Ok(state.normalize())
}

/// Final state of a constrained circuit and its success probability
#[derive(Debug, Clone, PartialEq)]
pub struct QpeOutcome {
    /// Normalized final state
    pub state: StateVector,
    /// Overall retained probability mass
    pub success_probability: Real,
    /// Mass retained by each layer, when normalizing per layer
    pub layer_probabilities: Vec<Real>,
}

/// Reusable constrained-QAOA evaluator
///
/// Holds the mixer plan and the three registers of the adjoint sweep.
#[derive(Debug, Clone)]
pub struct QpeQaoaSimulator {
    plan: MixerPlan,
    left: StateVector,
    right: StateVector,
    left_p: StateVector,
}

impl QpeQaoaSimulator {
    /// Create an evaluator for `num_qubits` qubits
    pub fn new(num_qubits: usize, config: &SimulatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            plan: MixerPlan::new(num_qubits, config.max_radix)?,
            left: StateVector::plus_state(num_qubits)?,
            right: StateVector::plus_state(num_qubits)?,
            left_p: StateVector::plus_state(num_qubits)?,
        })
    }

    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.plan.num_qubits()
    }

    /// State produced by the most recent run
    #[inline]
    pub fn state(&self) -> &StateVector {
        &self.left
    }

    /// Run the circuit with a single normalization at the end
    ///
    /// Returns the success probability. The state is available through
    /// [`QpeQaoaSimulator::state`].
    pub fn run(
        &mut self,
        phase: &Diagonals,
        constraint: &Diagonals,
        schedule: &Schedule,
    ) -> Result<Real> {
        self.left.reset_plus();
        for (beta, gamma) in schedule.layers() {
            apply_qpe_phase(&mut self.left, phase, constraint, gamma)?;
            self.plan.apply(&mut self.left, beta)?;
        }
        Ok(self.left.normalize())
    }

    /// Run the circuit renormalizing after every filter layer
    ///
    /// Returns the product of the per-layer retained masses. When
    /// `layer_probabilities` is given it receives each layer's mass.
    pub fn run_normalized(
        &mut self,
        phase: &Diagonals,
        constraint: &Diagonals,
        schedule: &Schedule,
        mut layer_probabilities: Option<&mut Vec<Real>>,
    ) -> Result<Real> {
        if let Some(layers) = layer_probabilities.as_deref_mut() {
            layers.clear();
        }

        self.left.reset_plus();
        let mut success = 1.0;
        for (beta, gamma) in schedule.layers() {
            let retained = apply_qpe_phase_normalized(&mut self.left, phase, constraint, gamma)?;
            success *= retained;
            if let Some(layers) = layer_probabilities.as_deref_mut() {
                layers.push(retained);
            }
            self.plan.apply(&mut self.left, beta)?;
        }
        Ok(success)
    }

    /// Expectation value of `cost` in the normalized final state
    ///
    /// Returns `(energy, success_probability)`.
    pub fn energy(
        &mut self,
        phase: &Diagonals,
        cost: &Diagonals,
        constraint: &Diagonals,
        schedule: &Schedule,
    ) -> Result<(Real, Real)> {
        let success = self.run(phase, constraint, schedule)?;
        let value = self.left.expectation(&self.left, cost)?.re;
        Ok((value, success))
    }

    /// Expectation value and gradient by one adjoint sweep
    ///
    /// Returns `(energy, success_probability)`; `gradient` is resized to the
    /// schedule's depth.
    pub fn gradient(
        &mut self,
        phase: &Diagonals,
        cost: &Diagonals,
        constraint: &Diagonals,
        schedule: &Schedule,
        gradient: &mut Gradient,
    ) -> Result<(Real, Real)> {
        let success = self.run(phase, constraint, schedule)?;

        let Self {
            plan,
            left,
            right,
            left_p,
        } = self;
        right.copy_from(left)?;
        left_p.copy_from(left)?;
        left.mult_diagonals(cost)?;
        let value = left.dot(right)?.re;

        gradient.reset(schedule.depth());
        for (p, (beta, gamma)) in schedule.layers().enumerate().rev() {
            gradient.betas[p] = sum_x_product(left, right)? - value * sum_x_product(left_p, right)?;

            plan.apply(left, -beta)?;
            plan.apply(right, -beta)?;
            plan.apply(left_p, -beta)?;

            let mut accumulated = Complex::new(0.0, 0.0);
            for ((((l, r), lp), &v), &k) in left
                .amplitudes_mut()
                .iter_mut()
                .zip(right.amplitudes_mut().iter_mut())
                .zip(left_p.amplitudes_mut().iter_mut())
                .zip(phase.values())
                .zip(constraint.values())
            {
                let (factor, half) = filter_factor(gamma, v, k);
                let before = *r / factor;
                let derivative = v * (1.0 + k) * half * before;
                accumulated += (l.conj() - value * lp.conj()) * derivative;

                *r = before;
                *l *= factor.conj();
                *lp *= factor.conj();
            }
            gradient.gammas[p] = -2.0 * accumulated.im;
        }
        Ok((value, success))
    }
}

/// Constrained circuit with deferred normalization
pub fn qpe_qaoa(phase: &Diagonals, constraint: &Diagonals, schedule: &Schedule) -> Result<QpeOutcome> {
    let mut simulator = QpeQaoaSimulator::new(phase.num_qubits(), &SimulatorConfig::default())?;
    let success_probability = simulator.run(phase, constraint, schedule)?;
    Ok(QpeOutcome {
        state: simulator.left,
        success_probability,
        layer_probabilities: Vec::new(),
    })
}

/// Constrained circuit renormalized after every layer
pub fn qpe_qaoa_normalized(
    phase: &Diagonals,
    constraint: &Diagonals,
    schedule: &Schedule,
) -> Result<QpeOutcome> {
    let mut simulator = QpeQaoaSimulator::new(phase.num_qubits(), &SimulatorConfig::default())?;
    let mut layer_probabilities = Vec::with_capacity(schedule.depth());
    let success_probability =
        simulator.run_normalized(phase, constraint, schedule, Some(&mut layer_probabilities))?;
    Ok(QpeOutcome {
        state: simulator.left,
        success_probability,
        layer_probabilities,
    })
}

/// Expectation value, gradient and success probability of a constrained circuit
pub fn grad_qpe_qaoa(
    phase: &Diagonals,
    cost: &Diagonals,
    constraint: &Diagonals,
    schedule: &Schedule,
) -> Result<GradientEvaluation> {
    let mut simulator = QpeQaoaSimulator::new(phase.num_qubits(), &SimulatorConfig::default())?;
    let mut gradient = Gradient::zeros(schedule.depth());
    let (value, success) = simulator.gradient(phase, cost, constraint, schedule, &mut gradient)?;
    Ok(GradientEvaluation {
        value,
        gradient,
        success_probability: Some(success),
    })
}

/// Constrained-QAOA expectation value as an optimizer objective
#[derive(Debug, Clone)]
pub struct QpeQaoaObjective<'a> {
    phase: &'a Diagonals,
    cost: &'a Diagonals,
    constraint: &'a Diagonals,
    simulator: QpeQaoaSimulator,
    success_probability: Option<Real>,
}

impl<'a> QpeQaoaObjective<'a> {
    pub fn new(
        phase: &'a Diagonals,
        cost: &'a Diagonals,
        constraint: &'a Diagonals,
        config: &SimulatorConfig,
    ) -> Result<Self> {
        check_operator(phase.num_qubits(), cost)?;
        check_operator(phase.num_qubits(), constraint)?;
        Ok(Self {
            phase,
            cost,
            constraint,
            simulator: QpeQaoaSimulator::new(phase.num_qubits(), config)?,
            success_probability: None,
        })
    }

    /// Success probability of the most recent evaluation
    pub fn success_probability(&self) -> Option<Real> {
        self.success_probability
    }
}

impl Objective for QpeQaoaObjective<'_> {
    fn num_qubits(&self) -> usize {
        self.simulator.num_qubits()
    }

    fn evaluate(&mut self, schedule: &Schedule, gradient: &mut Gradient) -> Result<Real> {
        let (value, success) =
            self.simulator
                .gradient(self.phase, self.cost, self.constraint, schedule, gradient)?;
        self.success_probability = Some(success);
        Ok(value)
    }

    fn value(&mut self, schedule: &Schedule) -> Result<Real> {
        let (value, success) =
            self.simulator
                .energy(self.phase, self.cost, self.constraint, schedule)?;
        self.success_probability = Some(success);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TOL: Real = if cfg!(feature = "f32") { 1e-4 } else { 1e-10 };

    fn smooth_constraint(num_qubits: usize) -> Diagonals {
        let values: Vec<Real> = (0..1usize << num_qubits)
            .map(|i| (0.9 * i as Real).cos())
            .collect();
        Diagonals::from_values(&values).unwrap()
    }

    #[test]
    fn test_filter_limits() {
        let (gamma, v) = (0.7, 1.3);
        let (feasible, _) = filter_factor(gamma, v, 1.0);
        let expected = phase_factor(gamma, v);
        assert_relative_eq!(feasible.re, expected.re, epsilon = TOL);
        assert_relative_eq!(feasible.im, expected.im, epsilon = TOL);

        let (infeasible, _) = filter_factor(gamma, v, -1.0);
        assert_relative_eq!(infeasible.re, 1.0, epsilon = TOL);
        assert_relative_eq!(infeasible.im, 0.0, epsilon = TOL);
    }

    #[test]
    fn test_normalized_layer_returns_mass() {
        let mut state = StateVector::plus_state(2).unwrap();
        let phase = Diagonals::from_values(&[0.0; 4]).unwrap();
        let constraint = Diagonals::from_values(&[1.0, 1.0, 0.0, 0.0]).unwrap();

        // γ = 0 turns every factor into 1
        let mass = apply_qpe_phase_normalized(&mut state, &phase, &constraint, 0.0).unwrap();
        assert_relative_eq!(mass, 1.0, epsilon = TOL);

        // γ·c = π on every entry gives f = −k, so half of the mass is lost
        let phase = Diagonals::from_values(&[1.0; 4]).unwrap();
        let mut state = StateVector::plus_state(2).unwrap();
        let pi = std::f64::consts::PI as Real;
        let mass = apply_qpe_phase_normalized(&mut state, &phase, &constraint, pi).unwrap();
        assert_relative_eq!(mass, 0.5, epsilon = TOL);
        assert!(state.is_normalized(TOL));
    }

    #[test]
    fn test_layer_masses_multiply_to_deferred_mass() {
        let phase = Diagonals::brute_force(4, &[0b0011, 0b0110, 0b1100], &[1.0, -2.0, 0.5]).unwrap();
        let constraint = smooth_constraint(4);
        let schedule = Schedule::new(vec![0.3, 0.8, 0.1], vec![0.5, 1.1, 0.9]).unwrap();

        let deferred = qpe_qaoa(&phase, &constraint, &schedule).unwrap();
        let normalized = qpe_qaoa_normalized(&phase, &constraint, &schedule).unwrap();

        assert_eq!(normalized.layer_probabilities.len(), 3);
        let product: Real = normalized.layer_probabilities.iter().product();
        assert_relative_eq!(product, normalized.success_probability, epsilon = TOL);
        assert_relative_eq!(
            normalized.success_probability,
            deferred.success_probability,
            epsilon = TOL
        );

        let (a, b) = (&deferred.state, &normalized.state);
        for (x, y) in a.amplitudes().iter().zip(b.amplitudes()) {
            assert_relative_eq!(x.re, y.re, epsilon = TOL);
            assert_relative_eq!(x.im, y.im, epsilon = TOL);
        }
    }

    #[test]
    fn test_constraint_mismatch() {
        let phase = Diagonals::from_values(&[0.0; 4]).unwrap();
        let constraint = Diagonals::from_values(&[1.0; 8]).unwrap();
        let mut state = StateVector::plus_state(2).unwrap();
        assert!(apply_qpe_phase(&mut state, &phase, &constraint, 0.1).is_err());
    }

    #[test]
    fn test_objective_tracks_success_probability() {
        let phase = Diagonals::brute_force(3, &[0b011], &[1.0]).unwrap();
        let constraint = smooth_constraint(3);
        let mut objective =
            QpeQaoaObjective::new(&phase, &phase, &constraint, &SimulatorConfig::default()).unwrap();
        assert_eq!(objective.success_probability(), None);

        let schedule = Schedule::linear(2);
        let value = objective.value(&schedule).unwrap();
        let p = objective.success_probability().unwrap();
        assert!(p > 0.0 && p <= 1.0 + TOL);

        let mut gradient = Gradient::default();
        let again = objective.evaluate(&schedule, &mut gradient).unwrap();
        assert_relative_eq!(value, again, epsilon = TOL);
        assert_relative_eq!(objective.success_probability().unwrap(), p, epsilon = TOL);
    }
}
