//! Angle optimizers driving an [`Objective`](crate::gradient::Objective)
//!
//! # Features
//!
//! - **Adam**: bias-corrected first/second moment updates
//! - **L-BFGS**: two-loop recursion with Armijo backtracking
//! - **Linear ramp**: optimize only the β and γ magnitudes of a fixed ramp
//! - **Grid search**: scan of a scaled linear ramp, evaluated in parallel
//! - **Depth interpolation**: warm-start successive depths from the
//!   previous optimum
//!
//! Reaching the iteration cap is a normal outcome, reported through
//! [`ConvergenceStatus::MaxIterations`] rather than as an error.

pub mod adam;
pub mod lbfgs;
pub mod linear;
pub mod search;

pub use adam::{AdamConfig, AdamOptimizer};
pub use lbfgs::{LbfgsConfig, LbfgsOptimizer};
pub use linear::{optimize_linear, LinearRampObjective, LinearRampResult};
pub use search::{grid_search, optimize_interpolated, GridSearchResult};

use crate::error::Result;
use crate::gradient::Objective;
use crate::schedule::Schedule;
use fastqaoa_state::Real;
use serde::{Deserialize, Serialize};

/// Why an optimizer stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceStatus {
    /// Objective change fell below the tolerance
    Converged,
    /// Reached maximum iterations
    MaxIterations,
}

/// Complete optimization result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Final angles
    pub schedule: Schedule,
    /// Objective value at `schedule`
    pub value: Real,
    pub status: ConvergenceStatus,
    /// Number of iterations performed
    pub iterations: usize,
    /// Objective value after every iteration
    pub trace: Vec<Real>,
}

impl OptimizationResult {
    /// Check if optimization converged
    pub fn converged(&self) -> bool {
        self.status == ConvergenceStatus::Converged
    }
}

/// Common interface of the gradient-based optimizers
pub trait Optimizer {
    /// Minimize `objective` starting from `initial`
    fn optimize<O: Objective + ?Sized>(
        &self,
        objective: &mut O,
        initial: &Schedule,
    ) -> Result<OptimizationResult>;
}

fn dot(a: &[Real], b: &[Real]) -> Real {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
