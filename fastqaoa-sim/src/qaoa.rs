//! QAOA forward simulation and adjoint gradients
//!
//! A depth-`p` QAOA circuit starts in |+...+⟩ and applies, per layer, the
//! diagonal phase `exp(iγ_p·c)` followed by the mixer `exp(−iβ_p·X)`. The
//! phase operator `c` drives the circuit; the cost operator measured at the
//! end may differ from it (for instance a penalized phase operator with an
//! unpenalized cost).
//!
//! # Example
//!
//! ```
//! use fastqaoa_sim::{energy, grad_qaoa, Schedule};
//! use fastqaoa_state::Diagonals;
//!
//! let cost = Diagonals::brute_force(3, &[0b011, 0b110], &[-1.0, -1.0]).unwrap();
//! let schedule = Schedule::linear(2);
//!
//! let value = energy(&cost, &cost, &schedule).unwrap();
//! let evaluation = grad_qaoa(&cost, &cost, &schedule).unwrap();
//! assert!((evaluation.value - value).abs() < 1e-5);
//! assert_eq!(evaluation.gradient.depth(), 2);
//! ```

use crate::config::SimulatorConfig;
use crate::error::{Result, SimulatorError};
use crate::gradient::{sum_x_product, Gradient, GradientEvaluation, Objective};
use crate::mixer::MixerPlan;
use crate::schedule::Schedule;
use fastqaoa_state::{Complex, Diagonals, Real, StateVector};
use rayon::prelude::*;
use tracing::debug;

/// `exp(iγv)` as `cos(γv) + i·sin(γv)`
#[inline]
pub(crate) fn phase_factor(gamma: Real, value: Real) -> Complex {
    let (s, c) = (gamma * value).sin_cos();
    Complex::new(c, s)
}

pub(crate) fn check_operator(num_qubits: usize, dg: &Diagonals) -> Result<()> {
    if dg.num_qubits() != num_qubits {
        return Err(SimulatorError::QubitMismatch {
            expected: num_qubits,
            actual: dg.num_qubits(),
        });
    }
    Ok(())
}

/// Multiply every amplitude by `exp(iγ·phase[i])`
pub fn apply_phase(state: &mut StateVector, phase: &Diagonals, gamma: Real) -> Result<()> {
    check_operator(state.num_qubits(), phase)?;
    for (amp, &v) in state.amplitudes_mut().iter_mut().zip(phase.values()) {
        *amp *= phase_factor(gamma, v);
    }
    Ok(())
}

/// Undo [`apply_phase`] on two registers at once
fn unapply_phase(left: &mut StateVector, right: &mut StateVector, phase: &Diagonals, gamma: Real) {
    let factors = phase.values().iter().map(|&v| phase_factor(gamma, v).conj());
    for ((l, r), f) in left
        .amplitudes_mut()
        .iter_mut()
        .zip(right.amplitudes_mut().iter_mut())
        .zip(factors)
    {
        *l *= f;
        *r *= f;
    }
}

fn forward(
    plan: &mut MixerPlan,
    state: &mut StateVector,
    phase: &Diagonals,
    schedule: &Schedule,
) -> Result<()> {
    state.reset_plus();
    for (beta, gamma) in schedule.layers() {
        apply_phase(state, phase, gamma)?;
        plan.apply(state, beta)?;
    }
    Ok(())
}

/// Reusable QAOA evaluator
///
/// Holds the mixer plan and the two registers of the adjoint sweep, so
/// repeated evaluations on the same qubit count do not allocate.
#[derive(Debug, Clone)]
pub struct QaoaSimulator {
    plan: MixerPlan,
    left: StateVector,
    right: StateVector,
}

impl QaoaSimulator {
    /// Create an evaluator for `num_qubits` qubits
    pub fn new(num_qubits: usize, config: &SimulatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            plan: MixerPlan::new(num_qubits, config.max_radix)?,
            left: StateVector::plus_state(num_qubits)?,
            right: StateVector::plus_state(num_qubits)?,
        })
    }

    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.plan.num_qubits()
    }

    /// Run the circuit and return the final state
    ///
    /// The returned state lives in the evaluator and is overwritten by the
    /// next call.
    pub fn run(&mut self, phase: &Diagonals, schedule: &Schedule) -> Result<&StateVector> {
        forward(&mut self.plan, &mut self.left, phase, schedule)?;
        Ok(&self.left)
    }

    /// Expectation value of `cost` in the final state
    pub fn energy(&mut self, phase: &Diagonals, cost: &Diagonals, schedule: &Schedule) -> Result<Real> {
        let state = self.run(phase, schedule)?;
        Ok(state.expectation(state, cost)?.re)
    }

    /// Expectation value and its gradient by one adjoint sweep
    ///
    /// `gradient` is resized to the schedule's depth.
    pub fn gradient(
        &mut self,
        phase: &Diagonals,
        cost: &Diagonals,
        schedule: &Schedule,
        gradient: &mut Gradient,
    ) -> Result<Real> {
        forward(&mut self.plan, &mut self.left, phase, schedule)?;

        let Self { plan, left, right } = self;
        right.copy_from(left)?;
        left.mult_diagonals(cost)?;
        let value = left.dot(right)?.re;

        gradient.reset(schedule.depth());
        for (p, (beta, gamma)) in schedule.layers().enumerate().rev() {
            gradient.betas[p] = sum_x_product(left, right)?;

            plan.apply(left, -beta)?;
            plan.apply(right, -beta)?;

            gradient.gammas[p] = -2.0 * left.expectation(right, phase)?.im;

            if p > 0 {
                unapply_phase(left, right, phase, gamma);
            }
        }
        Ok(value)
    }
}

/// Final state of a QAOA circuit
pub fn qaoa(phase: &Diagonals, schedule: &Schedule) -> Result<StateVector> {
    let config = SimulatorConfig::default();
    let mut plan = MixerPlan::new(phase.num_qubits(), config.max_radix)?;
    let mut state = StateVector::plus_state(phase.num_qubits())?;
    forward(&mut plan, &mut state, phase, schedule)?;
    Ok(state)
}

/// Expectation value of `cost` after a QAOA circuit driven by `phase`
pub fn energy(phase: &Diagonals, cost: &Diagonals, schedule: &Schedule) -> Result<Real> {
    let state = qaoa(phase, schedule)?;
    Ok(state.expectation(&state, cost)?.re)
}

/// Expectation value and gradient of a QAOA circuit
pub fn grad_qaoa(
    phase: &Diagonals,
    cost: &Diagonals,
    schedule: &Schedule,
) -> Result<GradientEvaluation> {
    let mut simulator = QaoaSimulator::new(phase.num_qubits(), &SimulatorConfig::default())?;
    let mut gradient = Gradient::zeros(schedule.depth());
    let value = simulator.gradient(phase, cost, schedule, &mut gradient)?;
    Ok(GradientEvaluation {
        value,
        gradient,
        success_probability: None,
    })
}

/// Energies of many schedules
///
/// Large batches are spread over the rayon pool. Every worker owns its own
/// evaluator, so no register or plan is ever shared.
pub fn multi_energy(
    config: &SimulatorConfig,
    phase: &Diagonals,
    cost: &Diagonals,
    schedules: &[Schedule],
) -> Result<Vec<Real>> {
    let num_qubits = phase.num_qubits();
    if config.parallelize(schedules.len()) {
        debug!(batch = schedules.len(), "evaluating schedules in parallel");
        schedules
            .par_iter()
            .map_init(
                || QaoaSimulator::new(num_qubits, config),
                |simulator, schedule| match simulator {
                    Ok(simulator) => simulator.energy(phase, cost, schedule),
                    Err(err) => Err(err.clone()),
                },
            )
            .collect()
    } else {
        let mut simulator = QaoaSimulator::new(num_qubits, config)?;
        schedules
            .iter()
            .map(|schedule| simulator.energy(phase, cost, schedule))
            .collect()
    }
}

/// QAOA expectation value as an optimizer objective
#[derive(Debug, Clone)]
pub struct QaoaObjective<'a> {
    phase: &'a Diagonals,
    cost: &'a Diagonals,
    simulator: QaoaSimulator,
}

impl<'a> QaoaObjective<'a> {
    pub fn new(phase: &'a Diagonals, cost: &'a Diagonals, config: &SimulatorConfig) -> Result<Self> {
        check_operator(phase.num_qubits(), cost)?;
        Ok(Self {
            phase,
            cost,
            simulator: QaoaSimulator::new(phase.num_qubits(), config)?,
        })
    }
}

impl Objective for QaoaObjective<'_> {
    fn num_qubits(&self) -> usize {
        self.simulator.num_qubits()
    }

    fn evaluate(&mut self, schedule: &Schedule, gradient: &mut Gradient) -> Result<Real> {
        self.simulator
            .gradient(self.phase, self.cost, schedule, gradient)
    }

    fn value(&mut self, schedule: &Schedule) -> Result<Real> {
        self.simulator.energy(self.phase, self.cost, schedule)
    }
}
