//! Angle initialization strategies: coarse grid scans and depth-by-depth
//! warm starts

use super::{OptimizationResult, Optimizer};
use crate::config::SimulatorConfig;
use crate::error::{Result, SimulatorError};
use crate::gradient::Objective;
use crate::qaoa::multi_energy;
use crate::schedule::Schedule;
use fastqaoa_state::{Diagonals, Real};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Best point found by [`grid_search`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSearchResult {
    pub beta_scale: Real,
    pub gamma_scale: Real,
    /// The scaled schedule at the best grid point
    pub schedule: Schedule,
    pub value: Real,
}

/// `dim` evenly spaced points on `[lo, hi)`
fn grid_axis((lo, hi): (Real, Real), dim: usize) -> Vec<Real> {
    let step = (hi - lo) / dim as Real;
    (0..dim).map(|i| lo + step * i as Real).collect()
}

/// Scan a `dim × dim` grid of angle scales
///
/// For `depth == 1` the grid points are the angles themselves. Deeper
/// circuits scale the linear ramp of [`Schedule::linear`], so the grid
/// covers the ramp's overall β and γ magnitudes. All grid points are
/// evaluated as one [`multi_energy`] batch.
pub fn grid_search(
    config: &SimulatorConfig,
    phase: &Diagonals,
    cost: &Diagonals,
    depth: usize,
    dim: usize,
    beta_extent: (Real, Real),
    gamma_extent: (Real, Real),
) -> Result<GridSearchResult> {
    if depth == 0 || dim == 0 {
        return Err(SimulatorError::InvalidConfig(format!(
            "grid search needs depth > 0 and dim > 0, got depth {depth} and dim {dim}"
        )));
    }

    let base = if depth == 1 {
        Schedule::new(vec![1.0], vec![1.0])?
    } else {
        Schedule::linear(depth)
    };

    let betas = grid_axis(beta_extent, dim);
    let gammas = grid_axis(gamma_extent, dim);
    let points: Vec<(Real, Real)> = gammas
        .iter()
        .flat_map(|&g| betas.iter().map(move |&b| (b, g)))
        .collect();
    let schedules: Vec<Schedule> = points.iter().map(|&(b, g)| base.scaled(b, g)).collect();

    let values = multi_energy(config, phase, cost, &schedules)?;
    let best = values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(i, _)| i)
        .unwrap_or(0);

    let (beta_scale, gamma_scale) = points[best];
    debug!(depth, dim, beta_scale, gamma_scale, value = values[best], "grid search finished");

    Ok(GridSearchResult {
        beta_scale,
        gamma_scale,
        schedule: schedules[best].clone(),
        value: values[best],
    })
}

/// Optimize successive depths, warm-starting each from the previous optimum
///
/// The schedule carried from one depth to the next is resampled with
/// [`Schedule::interpolate`]; `initial` is resampled onto the first depth
/// the same way. Results are keyed by depth.
pub fn optimize_interpolated<O, P>(
    objective: &mut O,
    optimizer: &P,
    depths: &[usize],
    initial: &Schedule,
) -> Result<BTreeMap<usize, OptimizationResult>>
where
    O: Objective + ?Sized,
    P: Optimizer,
{
    let mut results = BTreeMap::new();
    let mut current = initial.clone();

    for &depth in depths {
        let start = current.interpolate(depth);
        let result = optimizer.optimize(objective, &start)?;
        debug!(
            depth,
            value = result.value,
            iterations = result.iterations,
            "depth optimized"
        );
        current = result.schedule.clone();
        results.insert(depth, result);
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::{AdamConfig, AdamOptimizer};
    use crate::qaoa::{energy, QaoaObjective};
    use approx::assert_relative_eq;

    const TOL: Real = if cfg!(feature = "f32") { 1e-4 } else { 1e-10 };

    fn ring_cost(n: usize) -> Diagonals {
        let values: Vec<Real> = (0..1usize << n)
            .map(|x| {
                let cut = (0..n)
                    .filter(|&i| ((x >> i) & 1) != ((x >> ((i + 1) % n)) & 1))
                    .count();
                -(cut as Real)
            })
            .collect();
        Diagonals::from_values(&values).unwrap()
    }

    #[test]
    fn test_grid_axis_excludes_endpoint() {
        let axis = grid_axis((0.0, 1.0), 4);
        assert_eq!(axis, vec![0.0, 0.25, 0.5, 0.75]);
    }

    #[test]
    fn test_grid_search_returns_best_point() {
        let cost = ring_cost(4);
        let config = SimulatorConfig::default();
        let extent = (0.0, std::f64::consts::PI as Real);
        let result = grid_search(&config, &cost, &cost, 1, 8, extent, extent).unwrap();

        // The reported value belongs to the reported schedule
        let direct = energy(&cost, &cost, &result.schedule).unwrap();
        assert_relative_eq!(result.value, direct, epsilon = TOL);
        assert_relative_eq!(result.schedule.betas()[0], result.beta_scale);

        // and nothing on the grid beats it
        for b in grid_axis(extent, 8) {
            for g in grid_axis(extent, 8) {
                let schedule = Schedule::new(vec![b], vec![g]).unwrap();
                assert!(energy(&cost, &cost, &schedule).unwrap() >= result.value - TOL);
            }
        }
    }

    #[test]
    fn test_grid_search_deeper_scales_linear_ramp() {
        let cost = ring_cost(3);
        let config = SimulatorConfig::reference();
        let result = grid_search(&config, &cost, &cost, 3, 5, (0.0, 1.0), (0.0, 2.0)).unwrap();

        let expected = Schedule::linear(3).scaled(result.beta_scale, result.gamma_scale);
        assert_eq!(result.schedule, expected);
    }

    #[test]
    fn test_grid_search_rejects_empty_grid() {
        let cost = ring_cost(2);
        let config = SimulatorConfig::default();
        assert!(grid_search(&config, &cost, &cost, 1, 0, (0.0, 1.0), (0.0, 1.0)).is_err());
        assert!(grid_search(&config, &cost, &cost, 0, 4, (0.0, 1.0), (0.0, 1.0)).is_err());
    }

    #[test]
    fn test_optimize_interpolated_visits_every_depth() {
        let cost = ring_cost(4);
        let config = SimulatorConfig::default();
        let mut objective = QaoaObjective::new(&cost, &cost, &config).unwrap();
        let optimizer = AdamOptimizer::new(
            AdamConfig::default()
                .with_learning_rate(0.05)
                .with_max_iterations(50),
        );

        let results =
            optimize_interpolated(&mut objective, &optimizer, &[1, 2, 3], &Schedule::constant(1))
                .unwrap();

        assert_eq!(results.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        for (depth, result) in &results {
            assert_eq!(result.schedule.depth(), *depth);
        }
        let start = energy(&cost, &cost, &Schedule::constant(1)).unwrap();
        assert!(results[&3].value < start);
    }
}
