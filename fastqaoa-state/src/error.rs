//! Error types for diagonal operator and state vector operations

use thiserror::Error;

/// Errors that can occur during diagonal operator and state vector operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    /// Array length is not a (non-zero) power of two
    #[error("Invalid dimension {dimension}, expected a power of 2")]
    InvalidDimension { dimension: usize },

    /// Qubit count exceeds what a dense vector can hold
    #[error("Too many qubits: {num_qubits}, max supported is {max_qubits}")]
    TooManyQubits { num_qubits: usize, max_qubits: usize },

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Operands with different qubit counts combined in one expression
    #[error("Qubit count mismatch: expected {expected}, got {actual}")]
    QubitMismatch { expected: usize, actual: usize },

    /// Basis-state index outside the operator
    #[error("Basis state {index} out of range for dimension {dimension}")]
    IndexOutOfRange { index: usize, dimension: usize },

    /// Monte Carlo estimate requested over zero samples
    #[error("Cannot estimate an expectation value from an empty sample")]
    EmptySample,

    /// QPE indicator built from an unusable resolution, range or shift
    #[error("Invalid QPE indicator: {0}")]
    InvalidIndicator(String),
}

/// Result type for state vector operations
pub type Result<T> = std::result::Result<T, StateError>;
