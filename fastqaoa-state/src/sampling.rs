//! Born-rule sampling of basis states
//!
//! Sampling builds a cumulative probability table over basis states in
//! natural index order and locates each uniform draw by a linear scan. The
//! table is reusable, so repeated sampling from the same state only pays for
//! the scans.

use crate::precision::Real;
use crate::state_vector::StateVector;
use rand::Rng;
use std::collections::HashMap;
use tracing::trace;

/// Cumulative probability table of a state vector
#[derive(Debug, Clone)]
pub struct CumulativeTable {
    cumulative: Vec<Real>,
}

impl CumulativeTable {
    /// Build the table from the squared amplitudes of `state`
    ///
    /// The last entry is forced to exactly 1 so that floating-point drift in
    /// the running sum never leaves a draw unmatched.
    pub fn new(state: &StateVector) -> Self {
        let mut running = 0.0;
        let mut cumulative: Vec<Real> = state
            .amplitudes()
            .iter()
            .map(|a| {
                running += a.norm_sqr();
                running
            })
            .collect();
        if let Some(last) = cumulative.last_mut() {
            *last = 1.0;
        }
        Self { cumulative }
    }

    /// Number of basis states covered by the table
    #[inline]
    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }

    /// Cumulative probabilities in basis-state order
    #[inline]
    pub fn values(&self) -> &[Real] {
        &self.cumulative
    }

    /// First basis state whose cumulative probability exceeds `draw`
    pub fn locate(&self, draw: Real) -> usize {
        self.cumulative
            .iter()
            .position(|&c| c > draw)
            .unwrap_or(self.cumulative.len() - 1)
    }

    /// Draw `num` independent basis-state indices
    pub fn sample<R: Rng + ?Sized>(&self, num: usize, rng: &mut R) -> Vec<usize> {
        (0..num)
            .map(|_| self.locate(rng.gen::<Real>()))
            .collect()
    }
}

/// Draw `num` basis-state indices from `state` according to the Born rule
///
/// # Example
///
/// ```
/// use fastqaoa_state::{sample, StateVector};
/// use rand::SeedableRng;
///
/// let state = StateVector::new(3).unwrap();
/// let mut rng = rand::rngs::StdRng::seed_from_u64(7);
/// assert_eq!(sample(&state, 4, &mut rng), vec![0, 0, 0, 0]);
/// ```
pub fn sample<R: Rng + ?Sized>(state: &StateVector, num: usize, rng: &mut R) -> Vec<usize> {
    if num == 0 {
        return Vec::new();
    }
    trace!(num, dimension = state.dimension(), "sampling basis states");
    CumulativeTable::new(state).sample(num, rng)
}

/// Histogram of sampled basis states
#[derive(Debug, Clone, Default)]
pub struct SampleCounts {
    counts: HashMap<usize, usize>,
    shots: usize,
}

impl SampleCounts {
    /// Tally a list of sampled indices
    pub fn from_samples(samples: &[usize]) -> Self {
        let mut counts = Self::default();
        for &outcome in samples {
            counts.add_outcome(outcome);
        }
        counts
    }

    /// Record one more outcome
    pub fn add_outcome(&mut self, outcome: usize) {
        *self.counts.entry(outcome).or_insert(0) += 1;
        self.shots += 1;
    }

    /// Total number of recorded samples
    pub fn shots(&self) -> usize {
        self.shots
    }

    pub fn count(&self, outcome: usize) -> usize {
        self.counts.get(&outcome).copied().unwrap_or(0)
    }

    /// Empirical frequency of `outcome`, zero when nothing was recorded
    pub fn frequency(&self, outcome: usize) -> Real {
        if self.shots == 0 {
            return 0.0;
        }
        self.count(outcome) as Real / self.shots as Real
    }

    /// Outcomes sorted by count (descending), ties broken by index
    pub fn sorted_outcomes(&self) -> Vec<(usize, usize)> {
        let mut outcomes: Vec<_> = self.counts.iter().map(|(&k, &v)| (k, v)).collect();
        outcomes.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        outcomes
    }

    /// Counts keyed by bitstring, most significant qubit first
    pub fn to_bitstring_counts(&self, num_qubits: usize) -> HashMap<String, usize> {
        self.counts
            .iter()
            .map(|(&outcome, &count)| (format!("{:0width$b}", outcome, width = num_qubits), count))
            .collect()
    }
}
