//! Error types for the simulator

use fastqaoa_state::StateError;
use thiserror::Error;

/// Result type for simulator operations
pub type Result<T> = std::result::Result<T, SimulatorError>;

/// Errors that can occur during simulation and optimization
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulatorError {
    /// Error raised by a state or operator primitive
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Schedule with a different number of betas and gammas
    #[error("Schedule depth mismatch: {betas} betas, {gammas} gammas")]
    DepthMismatch { betas: usize, gammas: usize },

    /// Operator or register built for a different qubit count
    #[error("Qubit count mismatch: expected {expected}, got {actual}")]
    QubitMismatch { expected: usize, actual: usize },

    /// Approximation ratios are taken relative to the cost minimum
    #[error("Cost minimum is zero, approximation ratios are undefined")]
    ZeroMinimum,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimulatorError::DepthMismatch { betas: 2, gammas: 3 };
        assert_eq!(err.to_string(), "Schedule depth mismatch: 2 betas, 3 gammas");

        let err = SimulatorError::InvalidConfig("memory_size must be > 0".to_string());
        assert!(err.to_string().contains("memory_size"));
    }

    #[test]
    fn test_state_error_conversion() {
        let err: SimulatorError = StateError::EmptySample.into();
        assert!(matches!(err, SimulatorError::State(StateError::EmptySample)));
    }
}
