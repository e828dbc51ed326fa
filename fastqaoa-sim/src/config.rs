//! Simulator configuration

use crate::error::{Result, SimulatorError};
use crate::mixer::Radix;
use serde::{Deserialize, Serialize};

/// Configuration for circuit simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Largest butterfly block the mixer may fuse
    ///
    /// Larger blocks touch memory fewer times per mixer application at the
    /// cost of more arithmetic per amplitude.
    ///
    /// Default: Radix::Four
    pub max_radix: Radix,

    /// Evaluate batches of schedules on the rayon thread pool
    ///
    /// Default: true
    pub parallel_batches: bool,

    /// Minimum number of schedules in a batch before it is parallelized
    ///
    /// Small batches run on the calling thread to avoid pool overhead.
    ///
    /// Default: 4
    pub parallel_threshold: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            max_radix: Radix::Four,
            parallel_batches: true,
            parallel_threshold: 4,
        }
    }
}

impl SimulatorConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration with the widest butterfly blocks
    pub fn fast() -> Self {
        Self {
            max_radix: Radix::Eight,
            ..Default::default()
        }
    }

    /// Single-threaded, qubit-by-qubit mixer
    ///
    /// Useful as a reference when checking the fused kernels.
    pub fn reference() -> Self {
        Self {
            max_radix: Radix::Two,
            parallel_batches: false,
            ..Default::default()
        }
    }

    /// Set the largest butterfly block
    pub fn with_max_radix(mut self, radix: Radix) -> Self {
        self.max_radix = radix;
        self
    }

    /// Enable or disable parallel batch evaluation
    pub fn with_parallel_batches(mut self, enabled: bool) -> Self {
        self.parallel_batches = enabled;
        self
    }

    /// Set the batch size above which batches are parallelized
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Whether a batch of `len` schedules should go to the thread pool
    pub(crate) fn parallelize(&self, len: usize) -> bool {
        self.parallel_batches && len >= self.parallel_threshold
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.parallel_threshold == 0 {
            return Err(SimulatorError::InvalidConfig(
                "parallel_threshold must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimulatorConfig::default();
        assert_eq!(config.max_radix, Radix::Four);
        assert!(config.parallel_batches);
        assert_eq!(config.parallel_threshold, 4);
    }

    #[test]
    fn test_presets() {
        assert_eq!(SimulatorConfig::fast().max_radix, Radix::Eight);

        let reference = SimulatorConfig::reference();
        assert_eq!(reference.max_radix, Radix::Two);
        assert!(!reference.parallel_batches);
    }

    #[test]
    fn test_builder_pattern() {
        let config = SimulatorConfig::new()
            .with_max_radix(Radix::Eight)
            .with_parallel_batches(false)
            .with_parallel_threshold(16);

        assert_eq!(config.max_radix, Radix::Eight);
        assert!(!config.parallel_batches);
        assert_eq!(config.parallel_threshold, 16);
        assert!(!config.parallelize(100));
    }

    #[test]
    fn test_parallelize_threshold() {
        let config = SimulatorConfig::default();
        assert!(!config.parallelize(3));
        assert!(config.parallelize(4));
    }

    #[test]
    fn test_validate() {
        assert!(SimulatorConfig::default().validate().is_ok());

        let invalid = SimulatorConfig {
            parallel_threshold: 0,
            ..Default::default()
        };
        assert!(invalid.validate().is_err());
    }
}
