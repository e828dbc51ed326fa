//! Dense state vector with the linear-algebra primitives of a QAOA sweep
//!
//! A [`StateVector`] owns `2^n` complex amplitudes. Besides construction and
//! normalization it provides the handful of pointwise kernels the circuit
//! simulation is built from: multiplication by a [`Diagonals`], the inner
//! product, and the diagonal-weighted inner product.
//!
//! The amplitude buffer can be exchanged wholesale with a buffer of the same
//! length through [`StateVector::exchange_buffer`]. Double-buffered
//! transforms use this to hand their output to the vector and take the old
//! amplitudes back as scratch space, without copying.

use crate::diagonals::Diagonals;
use crate::error::{Result, StateError};
use crate::precision::{real, Complex, Real, MAX_QUBITS};

/// Quantum state vector over `2^n` basis states
///
/// # Example
///
/// ```
/// use fastqaoa_state::StateVector;
///
/// let state = StateVector::plus_state(2).unwrap();
/// assert_eq!(state.dimension(), 4);
/// assert!(state.is_normalized(1e-6));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    /// Number of qubits
    num_qubits: usize,

    /// Amplitudes indexed by basis state
    data: Vec<Complex>,
}

impl StateVector {
    fn checked_dimension(num_qubits: usize) -> Result<usize> {
        if num_qubits > MAX_QUBITS {
            return Err(StateError::TooManyQubits {
                num_qubits,
                max_qubits: MAX_QUBITS,
            });
        }
        Ok(1 << num_qubits)
    }

    /// Create a new state vector initialized to |0...0⟩
    ///
    /// # Errors
    /// Returns error if `num_qubits` is too large
    pub fn new(num_qubits: usize) -> Result<Self> {
        let dimension = Self::checked_dimension(num_qubits)?;
        let mut data = vec![Complex::new(0.0, 0.0); dimension];
        data[0] = real(1.0);
        Ok(Self { num_qubits, data })
    }

    /// Create the uniform superposition |+...+⟩
    ///
    /// Every amplitude equals `1/√(2^n)`.
    pub fn plus_state(num_qubits: usize) -> Result<Self> {
        let dimension = Self::checked_dimension(num_qubits)?;
        Ok(Self {
            num_qubits,
            data: vec![real(1.0 / (dimension as Real).sqrt()); dimension],
        })
    }

    /// Create a state vector from raw amplitude data
    ///
    /// # Errors
    /// Returns error if `amplitudes` does not have length `2^num_qubits`
    pub fn from_amplitudes(num_qubits: usize, amplitudes: &[Complex]) -> Result<Self> {
        let dimension = Self::checked_dimension(num_qubits)?;
        if amplitudes.len() != dimension {
            return Err(StateError::DimensionMismatch {
                expected: dimension,
                actual: amplitudes.len(),
            });
        }
        Ok(Self {
            num_qubits,
            data: amplitudes.to_vec(),
        })
    }

    /// Get the number of qubits
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Get the state dimension (2^num_qubits)
    #[inline]
    pub fn dimension(&self) -> usize {
        self.data.len()
    }

    /// Get a reference to the state amplitudes
    #[inline]
    pub fn amplitudes(&self) -> &[Complex] {
        &self.data
    }

    /// Get a mutable reference to the state amplitudes
    #[inline]
    pub fn amplitudes_mut(&mut self) -> &mut [Complex] {
        &mut self.data
    }

    /// Re-initialize an existing register to |+...+⟩ without reallocating
    pub fn reset_plus(&mut self) {
        let value = real(1.0 / (self.dimension() as Real).sqrt());
        self.data.fill(value);
    }

    /// Overwrite this register with the amplitudes of `other`
    pub fn copy_from(&mut self, other: &StateVector) -> Result<()> {
        self.check_same_qubits(other)?;
        self.data.copy_from_slice(&other.data);
        Ok(())
    }

    /// Exchange the amplitude buffer with `buffer`
    ///
    /// After the call the vector holds what `buffer` held and `buffer` holds
    /// the previous amplitudes. Nothing is copied.
    ///
    /// # Panics
    /// Panics if `buffer` does not have exactly `2^n` entries.
    #[inline]
    pub fn exchange_buffer(&mut self, buffer: &mut Vec<Complex>) {
        assert_eq!(
            buffer.len(),
            self.data.len(),
            "exchanged buffer must match the state dimension"
        );
        std::mem::swap(&mut self.data, buffer);
    }

    fn check_same_qubits(&self, other: &StateVector) -> Result<()> {
        if self.num_qubits != other.num_qubits {
            return Err(StateError::QubitMismatch {
                expected: self.num_qubits,
                actual: other.num_qubits,
            });
        }
        Ok(())
    }

    fn check_broadcast(&self, dg: &Diagonals) -> Result<()> {
        if dg.num_qubits() > self.num_qubits {
            return Err(StateError::QubitMismatch {
                expected: self.num_qubits,
                actual: dg.num_qubits(),
            });
        }
        Ok(())
    }

    /// Multiply every amplitude by the matching diagonal entry
    ///
    /// An operator on fewer qubits is broadcast over repeated blocks: entry
    /// `i mod 2^m` multiplies amplitude `i`.
    pub fn mult_diagonals(&mut self, dg: &Diagonals) -> Result<()> {
        self.check_broadcast(dg)?;
        let values = dg.values();
        for block in self.data.chunks_exact_mut(values.len()) {
            for (amp, &v) in block.iter_mut().zip(values) {
                *amp *= v;
            }
        }
        Ok(())
    }

    /// Inner product ⟨self|other⟩, conjugate-linear in `self`
    pub fn dot(&self, other: &StateVector) -> Result<Complex> {
        self.check_same_qubits(other)?;
        Ok(self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a.conj() * b)
            .sum())
    }

    /// Diagonal-weighted inner product ⟨self|D|other⟩
    ///
    /// The operator is broadcast like in [`StateVector::mult_diagonals`].
    pub fn expectation(&self, other: &StateVector, dg: &Diagonals) -> Result<Complex> {
        self.check_same_qubits(other)?;
        self.check_broadcast(dg)?;
        let values = dg.values();
        Ok(self
            .data
            .chunks_exact(values.len())
            .zip(other.data.chunks_exact(values.len()))
            .flat_map(|(a, b)| a.iter().zip(b).zip(values))
            .map(|((a, b), &v)| a.conj() * b * v)
            .sum())
    }

    /// Total probability mass Σ|amplitude|²
    pub fn norm_sqr(&self) -> Real {
        self.data.iter().map(|a| a.norm_sqr()).sum()
    }

    /// Scale the vector to unit norm
    ///
    /// Returns the probability mass before normalization, which the
    /// constrained variant reports as a success probability.
    pub fn normalize(&mut self) -> Real {
        let mass = self.norm_sqr();
        let inv_norm = 1.0 / mass.sqrt();
        for amplitude in &mut self.data {
            *amplitude *= inv_norm;
        }
        mass
    }

    /// Check if the state is normalized (|Σ|a|² − 1| < epsilon)
    pub fn is_normalized(&self, epsilon: Real) -> bool {
        (self.norm_sqr() - 1.0).abs() < epsilon
    }

    /// Born-rule probability of every basis state
    pub fn probabilities(&self) -> Vec<Real> {
        self.data.iter().map(|a| a.norm_sqr()).collect()
    }
}
