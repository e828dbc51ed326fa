//! Dense state representations for QAOA-style simulation
//!
//! This crate provides the data layer of the simulator: diagonal operators
//! over the computational basis, dense state vectors, and Born-rule sampling.
//!
//! # Components
//!
//! - **Diagonals**: real-valued functions on bitstrings, built from
//!   pseudo-Boolean polynomials and combined by masking, penalties and
//!   comparisons
//! - **StateVector**: `2^n` complex amplitudes with the pointwise kernels a
//!   circuit sweep needs
//! - **QpeIndicator**: smooth phase-estimation response that turns a
//!   constraint operator into the signed filter of a QPE phase layer
//! - **Sampling**: cumulative-table sampling of basis states
//!
//! # Example
//!
//! ```
//! use fastqaoa_state::{Diagonals, StateVector};
//!
//! // cost(x) = x0 + x1 on two qubits
//! let cost = Diagonals::brute_force(2, &[0b01, 0b10], &[1.0, 1.0]).unwrap();
//! let state = StateVector::plus_state(2).unwrap();
//!
//! let energy = state.expectation(&state, &cost).unwrap().re;
//! assert!((energy - 1.0).abs() < 1e-6);
//! ```

pub mod diagonals;
pub mod error;
pub mod indicator;
pub mod precision;
pub mod sampling;
pub mod state_vector;

pub use diagonals::{Comparison, Diagonals};
pub use error::{Result, StateError};
pub use indicator::{indicator_base, QpeIndicator, MAX_INDICATOR_BITS};
pub use precision::{Complex, Real, CMP_TOLERANCE, MAX_QUBITS};
pub use sampling::{sample, CumulativeTable, SampleCounts};
pub use state_vector::StateVector;
