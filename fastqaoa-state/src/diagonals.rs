//! Diagonal operators over the computational basis
//!
//! A [`Diagonals`] holds one real value per basis state of an `n`-qubit
//! register, i.e. the eigenvalues of an operator that is diagonal in the
//! computational basis. Cost functions and feasibility indicators of
//! combinatorial problems are represented this way so that phase layers can
//! be applied pointwise without ever materialising a matrix.
//!
//! The cached minimum and maximum always describe the current contents:
//! every constructor computes them in the same pass that fills the array, and
//! the in-place [`Diagonals::scale`] / [`Diagonals::shift`] update them in
//! O(1).
//!
//! # Example
//!
//! ```
//! use fastqaoa_state::Diagonals;
//!
//! // x0 * x2 with coefficient 3 over three qubits
//! let dg = Diagonals::brute_force(3, &[0b101], &[3.0]).unwrap();
//! assert_eq!(dg.values(), &[0.0, 0.0, 0.0, 0.0, 0.0, 3.0, 0.0, 3.0]);
//! assert_eq!(dg.min_val(), 0.0);
//! assert_eq!(dg.max_val(), 3.0);
//! ```

use crate::error::{Result, StateError};
use crate::precision::{Real, CMP_TOLERANCE, MAX_QUBITS};
use serde::{Deserialize, Serialize};
use std::ops::Index;
use tracing::debug;

/// Comparator used by feasibility tests
///
/// `Equal` and `NotEqual` compare with the absolute tolerance
/// [`CMP_TOLERANCE`]; the ordering comparators are exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    /// `lhs <= rhs`
    LessEqual,
    /// `lhs >= rhs`
    GreaterEqual,
    /// `lhs < rhs`
    Less,
    /// `lhs > rhs`
    Greater,
    /// `|lhs - rhs| <= tol`
    Equal,
    /// `|lhs - rhs| > tol`
    NotEqual,
}

impl Comparison {
    /// Evaluate the comparison `lhs ⋈ rhs`
    #[inline]
    pub fn holds(self, lhs: Real, rhs: Real) -> bool {
        let diff = lhs - rhs;
        match self {
            Comparison::LessEqual => diff <= 0.0,
            Comparison::GreaterEqual => diff >= 0.0,
            Comparison::Less => diff < 0.0,
            Comparison::Greater => diff > 0.0,
            Comparison::Equal => diff.abs() <= CMP_TOLERANCE,
            Comparison::NotEqual => diff.abs() > CMP_TOLERANCE,
        }
    }
}

/// Real-valued function over all `2^n` basis states with cached extrema
#[derive(Debug, Clone, PartialEq)]
pub struct Diagonals {
    num_qubits: usize,
    values: Vec<Real>,
    min_val: Real,
    max_val: Real,
}

fn check_qubits(num_qubits: usize) -> Result<()> {
    if num_qubits > MAX_QUBITS {
        return Err(StateError::TooManyQubits {
            num_qubits,
            max_qubits: MAX_QUBITS,
        });
    }
    Ok(())
}

fn extrema(values: &[Real]) -> (Real, Real) {
    values
        .iter()
        .fold((Real::INFINITY, Real::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

impl Diagonals {
    pub(crate) fn from_vec(num_qubits: usize, values: Vec<Real>) -> Self {
        let (min_val, max_val) = extrema(&values);
        Self {
            num_qubits,
            values,
            min_val,
            max_val,
        }
    }

    /// Create an operator by copying an explicit array of `2^n` values
    ///
    /// The qubit count is derived from the array length.
    ///
    /// # Errors
    /// Returns [`StateError::InvalidDimension`] if the length is zero or not a
    /// power of two.
    pub fn from_values(values: &[Real]) -> Result<Self> {
        let dimension = values.len();
        if dimension == 0 || !dimension.is_power_of_two() {
            return Err(StateError::InvalidDimension { dimension });
        }
        let num_qubits = dimension.trailing_zeros() as usize;
        check_qubits(num_qubits)?;
        Ok(Self::from_vec(num_qubits, values.to_vec()))
    }

    /// Evaluate a sparse pseudo-boolean polynomial on every basis state
    ///
    /// Monomial `j` contributes `coeffs[j]` to basis state `i` whenever all
    /// qubits of `masks[j]` are set in `i`. A zero mask is a constant term.
    /// Runs in O(2^n · monomials).
    ///
    /// # Errors
    /// Returns an error if `masks` and `coeffs` differ in length or the qubit
    /// count is too large.
    pub fn brute_force(num_qubits: usize, masks: &[u64], coeffs: &[Real]) -> Result<Self> {
        check_qubits(num_qubits)?;
        if masks.len() != coeffs.len() {
            return Err(StateError::DimensionMismatch {
                expected: masks.len(),
                actual: coeffs.len(),
            });
        }

        let dimension = 1usize << num_qubits;
        let mut values = Vec::with_capacity(dimension);
        let mut min_val = Real::INFINITY;
        let mut max_val = Real::NEG_INFINITY;

        for i in 0..dimension as u64 {
            let value: Real = masks
                .iter()
                .zip(coeffs)
                .filter(|&(&mask, _)| i & mask == mask)
                .map(|(_, &coeff)| coeff)
                .sum();
            min_val = min_val.min(value);
            max_val = max_val.max(value);
            values.push(value);
        }

        Ok(Self {
            num_qubits,
            values,
            min_val,
            max_val,
        })
    }

    /// Number of qubits
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Number of entries (`2^num_qubits`)
    #[inline]
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Values indexed by basis state
    #[inline]
    pub fn values(&self) -> &[Real] {
        &self.values
    }

    /// Value at a basis state, if in range
    #[inline]
    pub fn get(&self, index: usize) -> Option<Real> {
        self.values.get(index).copied()
    }

    /// Smallest value
    #[inline]
    pub fn min_val(&self) -> Real {
        self.min_val
    }

    /// Largest value
    #[inline]
    pub fn max_val(&self) -> Real {
        self.max_val
    }

    fn check_same_qubits(&self, other: &Diagonals) -> Result<()> {
        if self.num_qubits != other.num_qubits {
            return Err(StateError::QubitMismatch {
                expected: self.num_qubits,
                actual: other.num_qubits,
            });
        }
        Ok(())
    }

    /// Replace every entry whose `lhs` value fails `lhs ⋈ rhs` with `replacement`
    ///
    /// Entries at feasible basis states are kept unchanged.
    pub fn mask(
        &self,
        lhs: &Diagonals,
        rhs: Real,
        cmp: Comparison,
        replacement: Real,
    ) -> Result<Self> {
        self.check_same_qubits(lhs)?;
        let values = self
            .values
            .iter()
            .zip(&lhs.values)
            .map(|(&v, &l)| if cmp.holds(l, rhs) { v } else { replacement })
            .collect();
        Ok(Self::from_vec(self.num_qubits, values))
    }

    /// Add `penalty · (lhs − rhs)²` to every entry violating `lhs ⋈ rhs`
    ///
    /// A negative `penalty` requests automatic selection: the smallest
    /// coefficient that lifts every infeasible entry to at least the
    /// second-smallest feasible value, so no infeasible state can undercut the
    /// best feasible one. Returns the penalized operator together with the
    /// penalty coefficient that was applied.
    pub fn quad_penalty(
        &self,
        lhs: &Diagonals,
        rhs: Real,
        cmp: Comparison,
        penalty: Real,
    ) -> Result<(Self, Real)> {
        self.check_same_qubits(lhs)?;

        let penalty = if penalty < 0.0 {
            self.auto_penalty(lhs, rhs, cmp)
        } else {
            penalty
        };

        let values = self
            .values
            .iter()
            .zip(&lhs.values)
            .map(|(&v, &l)| {
                if cmp.holds(l, rhs) {
                    v
                } else {
                    let diff = l - rhs;
                    v + penalty * diff * diff
                }
            })
            .collect();

        Ok((Self::from_vec(self.num_qubits, values), penalty))
    }

    fn auto_penalty(&self, lhs: &Diagonals, rhs: Real, cmp: Comparison) -> Real {
        let sentinel = self.max_val + 1.0;
        let mut min_val = sentinel;
        let mut second_min = sentinel;

        for (&v, &l) in self.values.iter().zip(&lhs.values) {
            if !cmp.holds(l, rhs) {
                continue;
            }
            if v < min_val {
                second_min = min_val;
                min_val = v;
            } else if v > min_val + CMP_TOLERANCE && v < second_min {
                second_min = v;
            }
        }

        // fewer than two distinct feasible values
        if second_min > self.max_val {
            second_min = 0.0;
        }

        let penalty = self
            .values
            .iter()
            .zip(&lhs.values)
            .filter(|&(_, &l)| !cmp.holds(l, rhs))
            .map(|(&v, &l)| {
                let diff = l - rhs;
                (second_min - v) / (diff * diff + CMP_TOLERANCE)
            })
            .fold(0.0, Real::max);

        debug!(penalty, second_min, "derived quadratic penalty");
        penalty
    }

    /// 0/1 indicator of the basis states satisfying `self ⋈ rhs`
    ///
    /// The cached extrema are fixed at 0 and 1 regardless of contents.
    pub fn compare(&self, rhs: Real, cmp: Comparison) -> Self {
        let values = self
            .values
            .iter()
            .map(|&v| if cmp.holds(v, rhs) { 1.0 } else { 0.0 })
            .collect();
        Self {
            num_qubits: self.num_qubits,
            values,
            min_val: 0.0,
            max_val: 1.0,
        }
    }

    /// +1 at feasible basis states, −1 elsewhere
    ///
    /// This is the constraint encoding consumed by the QPE phase layer.
    pub fn signed_indicator(&self, rhs: Real, cmp: Comparison) -> Self {
        let mut indicator = self.compare(rhs, cmp);
        indicator.scale(2.0);
        indicator.shift(-1.0);
        indicator
    }

    /// Multiply every entry by `factor` in place
    pub fn scale(&mut self, factor: Real) {
        for v in &mut self.values {
            *v *= factor;
        }
        if factor < 0.0 {
            let max_val = self.max_val;
            self.max_val = factor * self.min_val;
            self.min_val = factor * max_val;
        } else {
            self.max_val *= factor;
            self.min_val *= factor;
        }
    }

    /// Add `offset` to every entry in place
    pub fn shift(&mut self, offset: Real) {
        for v in &mut self.values {
            *v += offset;
        }
        self.min_val += offset;
        self.max_val += offset;
    }

    /// Mean value over sampled basis states (Monte Carlo expectation)
    pub fn expectation_from_samples(&self, samples: &[usize]) -> Result<Real> {
        if samples.is_empty() {
            return Err(StateError::EmptySample);
        }
        let mut total = 0.0;
        for &index in samples {
            total += self.get(index).ok_or(StateError::IndexOutOfRange {
                index,
                dimension: self.dimension(),
            })?;
        }
        Ok(total / samples.len() as Real)
    }
}

impl Index<usize> for Diagonals {
    type Output = Real;

    #[inline]
    fn index(&self, index: usize) -> &Real {
        &self.values[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TOL: Real = if cfg!(feature = "f32") { 1e-4 } else { 1e-10 };

    #[test]
    fn test_brute_force_single_monomial() {
        let dg = Diagonals::brute_force(3, &[0b101], &[3.0]).unwrap();

        for i in 0..8 {
            let expected = if i == 5 || i == 7 { 3.0 } else { 0.0 };
            assert_eq!(dg[i], expected);
        }
        assert_eq!(dg.min_val(), 0.0);
        assert_eq!(dg.max_val(), 3.0);
    }

    #[test]
    fn test_brute_force_with_constant_term() {
        // 1 - 2 x0 + x0 x1
        let dg = Diagonals::brute_force(2, &[0, 0b01, 0b11], &[1.0, -2.0, 1.0]).unwrap();
        assert_eq!(dg.values(), &[1.0, -1.0, 1.0, 0.0]);
        assert_eq!(dg.min_val(), -1.0);
        assert_eq!(dg.max_val(), 1.0);
    }

    #[test]
    fn test_brute_force_length_mismatch() {
        let result = Diagonals::brute_force(2, &[0b01, 0b10], &[1.0]);
        assert_eq!(
            result,
            Err(StateError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_from_values() {
        let dg = Diagonals::from_values(&[2.0, -1.0, 4.0, 0.5]).unwrap();
        assert_eq!(dg.num_qubits(), 2);
        assert_eq!(dg.dimension(), 4);
        assert_eq!(dg.min_val(), -1.0);
        assert_eq!(dg.max_val(), 4.0);
    }

    #[test]
    fn test_from_values_invalid_dimension() {
        assert_eq!(
            Diagonals::from_values(&[1.0, 2.0, 3.0]),
            Err(StateError::InvalidDimension { dimension: 3 })
        );
        assert!(Diagonals::from_values(&[]).is_err());
    }

    #[test]
    fn test_comparison_kinds() {
        assert!(Comparison::LessEqual.holds(1.0, 1.0));
        assert!(!Comparison::Less.holds(1.0, 1.0));
        assert!(Comparison::GreaterEqual.holds(1.0, 1.0));
        assert!(!Comparison::Greater.holds(1.0, 1.0));
        assert!(Comparison::Equal.holds(1.0 + 1e-9, 1.0));
        assert!(!Comparison::NotEqual.holds(1.0 + 1e-9, 1.0));
        assert!(Comparison::NotEqual.holds(1.0 + 1e-6, 1.0));
    }

    #[test]
    fn test_mask_replaces_infeasible() {
        let cost = Diagonals::from_values(&[-1.0, -2.0, -5.0, -4.0]).unwrap();
        let weight = Diagonals::from_values(&[0.0, 1.0, 2.0, 3.0]).unwrap();

        let masked = cost.mask(&weight, 1.0, Comparison::LessEqual, 10.0).unwrap();
        assert_eq!(masked.values(), &[-1.0, -2.0, 10.0, 10.0]);
        assert_eq!(masked.min_val(), -2.0);
        assert_eq!(masked.max_val(), 10.0);
    }

    #[test]
    fn test_mask_qubit_mismatch() {
        let cost = Diagonals::from_values(&[0.0; 4]).unwrap();
        let weight = Diagonals::from_values(&[0.0; 8]).unwrap();
        assert_eq!(
            cost.mask(&weight, 0.0, Comparison::Equal, 1.0),
            Err(StateError::QubitMismatch {
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn test_quad_penalty_explicit() {
        let cost = Diagonals::from_values(&[0.0, 0.0, 0.0, 0.0]).unwrap();
        let weight = Diagonals::from_values(&[0.0, 1.0, 2.0, 3.0]).unwrap();

        let (penalized, penalty) = cost
            .quad_penalty(&weight, 1.0, Comparison::LessEqual, 2.0)
            .unwrap();
        assert_eq!(penalty, 2.0);
        assert_eq!(penalized.values(), &[0.0, 0.0, 2.0, 8.0]);
        assert_eq!(penalized.max_val(), 8.0);
    }

    #[test]
    fn test_quad_penalty_auto() {
        let cost = Diagonals::from_values(&[-1.0, -2.0, -5.0, -4.0]).unwrap();
        let weight = Diagonals::from_values(&[0.0, 1.0, 2.0, 3.0]).unwrap();

        let (penalized, penalty) = cost
            .quad_penalty(&weight, 1.0, Comparison::LessEqual, -1.0)
            .unwrap();

        assert_relative_eq!(penalty, 4.0, epsilon = TOL);
        assert_relative_eq!(penalized[2], -1.0, epsilon = TOL);
        assert_relative_eq!(penalized[3], 12.0, epsilon = TOL);
        // best feasible value stays the global minimum
        assert_eq!(penalized.min_val(), -2.0);
    }

    #[test]
    fn test_compare_indicator() {
        let weight = Diagonals::from_values(&[0.0, 1.0, 1.0 + 1e-10, 3.0]).unwrap();
        let indicator = weight.compare(1.0, Comparison::Equal);
        assert_eq!(indicator.values(), &[0.0, 1.0, 1.0, 0.0]);
        assert_eq!(indicator.min_val(), 0.0);
        assert_eq!(indicator.max_val(), 1.0);
    }

    #[test]
    fn test_signed_indicator() {
        let weight = Diagonals::from_values(&[0.0, 1.0, 2.0, 3.0]).unwrap();
        let constraint = weight.signed_indicator(1.0, Comparison::LessEqual);
        assert_eq!(constraint.values(), &[1.0, 1.0, -1.0, -1.0]);
        assert_eq!(constraint.min_val(), -1.0);
        assert_eq!(constraint.max_val(), 1.0);
    }

    #[test]
    fn test_scale_negative_swaps_extrema() {
        let mut dg = Diagonals::from_values(&[-1.0, 2.0]).unwrap();
        dg.scale(-2.0);
        assert_eq!(dg.values(), &[2.0, -4.0]);
        assert_eq!(dg.min_val(), -4.0);
        assert_eq!(dg.max_val(), 2.0);
    }

    #[test]
    fn test_shift() {
        let mut dg = Diagonals::from_values(&[-1.0, 2.0]).unwrap();
        dg.shift(0.5);
        assert_eq!(dg.values(), &[-0.5, 2.5]);
        assert_eq!(dg.min_val(), -0.5);
        assert_eq!(dg.max_val(), 2.5);
    }

    #[test]
    fn test_expectation_from_samples() {
        let dg = Diagonals::from_values(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        let mean = dg.expectation_from_samples(&[0, 3, 3, 1]).unwrap();
        assert_relative_eq!(mean, 2.75);

        assert_eq!(dg.expectation_from_samples(&[]), Err(StateError::EmptySample));
        assert_eq!(
            dg.expectation_from_samples(&[4]),
            Err(StateError::IndexOutOfRange {
                index: 4,
                dimension: 4
            })
        );
    }
}
