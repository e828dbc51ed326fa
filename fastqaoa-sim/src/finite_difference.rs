//! Finite difference reference gradients
//!
//! The adjoint sweeps are checked against these. They cost two circuit
//! evaluations per parameter (one for the one-sided rules) and are only
//! meant for validation on small instances.

use crate::error::Result;
use crate::gradient::Gradient;
use crate::schedule::Schedule;
use fastqaoa_state::Real;

/// Finite difference rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiniteDifferenceMethod {
    /// Forward difference: f'(x) ≈ [f(x+ε) - f(x)] / ε
    Forward,
    /// Central difference: f'(x) ≈ [f(x+ε) - f(x-ε)] / (2ε)
    Central,
    /// Backward difference: f'(x) ≈ [f(x) - f(x-ε)] / ε
    Backward,
}

/// Central-difference gradient of `f` at `schedule`
pub fn finite_difference_gradient<F>(f: F, schedule: &Schedule, epsilon: Real) -> Result<Gradient>
where
    F: FnMut(&Schedule) -> Result<Real>,
{
    finite_difference_gradient_with(f, schedule, epsilon, FiniteDifferenceMethod::Central)
}

/// Finite-difference gradient of `f` at `schedule` using `method`
pub fn finite_difference_gradient_with<F>(
    mut f: F,
    schedule: &Schedule,
    epsilon: Real,
    method: FiniteDifferenceMethod,
) -> Result<Gradient>
where
    F: FnMut(&Schedule) -> Result<Real>,
{
    let params = schedule.to_vec();
    let base = match method {
        FiniteDifferenceMethod::Central => None,
        FiniteDifferenceMethod::Forward | FiniteDifferenceMethod::Backward => Some(f(schedule)?),
    };

    let mut evaluate_shifted = |i: usize, shift: Real| -> Result<Real> {
        let mut shifted = params.clone();
        shifted[i] += shift;
        f(&Schedule::from_flat(&shifted)?)
    };

    let mut flat = Vec::with_capacity(params.len());
    for i in 0..params.len() {
        let derivative = match (method, base) {
            (FiniteDifferenceMethod::Forward, Some(base)) => {
                (evaluate_shifted(i, epsilon)? - base) / epsilon
            }
            (FiniteDifferenceMethod::Backward, Some(base)) => {
                (base - evaluate_shifted(i, -epsilon)?) / epsilon
            }
            _ => {
                let plus = evaluate_shifted(i, epsilon)?;
                let minus = evaluate_shifted(i, -epsilon)?;
                (plus - minus) / (2.0 * epsilon)
            }
        };
        flat.push(derivative);
    }

    let gammas = flat.split_off(schedule.depth());
    Ok(Gradient { betas: flat, gammas })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TOL: Real = if cfg!(feature = "f32") { 1e-2 } else { 1e-8 };
    const ONE_SIDED_TOL: Real = if cfg!(feature = "f32") { 1e-2 } else { 1e-5 };

    // f = Σ β_p² + 3·Σ γ_p
    fn quadratic(schedule: &Schedule) -> Result<Real> {
        let b: Real = schedule.betas().iter().map(|b| b * b).sum();
        let g: Real = schedule.gammas().iter().sum();
        Ok(b + 3.0 * g)
    }

    #[test]
    fn test_central_difference() {
        let schedule = Schedule::new(vec![0.5, -1.0], vec![0.2, 0.4]).unwrap();
        let gradient = finite_difference_gradient(quadratic, &schedule, 1e-2).unwrap();

        assert_relative_eq!(gradient.betas[0], 1.0, epsilon = TOL);
        assert_relative_eq!(gradient.betas[1], -2.0, epsilon = TOL);
        assert_relative_eq!(gradient.gammas[0], 3.0, epsilon = TOL);
        assert_relative_eq!(gradient.gammas[1], 3.0, epsilon = TOL);
    }

    #[test]
    fn test_one_sided_differences() {
        let schedule = Schedule::new(vec![0.5], vec![0.0]).unwrap();
        let eps = if cfg!(feature = "f32") { 1e-3 } else { 1e-6 };

        let forward =
            finite_difference_gradient_with(quadratic, &schedule, eps, FiniteDifferenceMethod::Forward)
                .unwrap();
        let backward =
            finite_difference_gradient_with(quadratic, &schedule, eps, FiniteDifferenceMethod::Backward)
                .unwrap();

        assert_relative_eq!(forward.betas[0], 1.0, epsilon = ONE_SIDED_TOL);
        assert_relative_eq!(backward.betas[0], 1.0, epsilon = ONE_SIDED_TOL);
        assert_relative_eq!(forward.gammas[0], 3.0, epsilon = ONE_SIDED_TOL);
    }

    #[test]
    fn test_errors_propagate() {
        let schedule = Schedule::linear(1);
        let result = finite_difference_gradient(
            |_| Err(crate::error::SimulatorError::InvalidConfig("boom".into())),
            &schedule,
            1e-3,
        );
        assert!(result.is_err());
    }
}
