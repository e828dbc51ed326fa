//! Layer-wise angle schedules
//!
//! A [`Schedule`] carries one mixer angle β and one phase angle γ per layer.
//! Besides validated construction it offers the standard initializations
//! (constant, linear ramp, seeded Gaussian) and the resampling used when warm-starting a
//! deeper circuit from a shallower optimum.

use crate::error::{Result, SimulatorError};
use fastqaoa_state::Real;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Mixer and phase angles of a layered circuit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    betas: Vec<Real>,
    gammas: Vec<Real>,
}

impl Schedule {
    /// Create a schedule from per-layer angles
    ///
    /// # Errors
    /// Returns [`SimulatorError::DepthMismatch`] if the two lists differ in length
    pub fn new(betas: Vec<Real>, gammas: Vec<Real>) -> Result<Self> {
        if betas.len() != gammas.len() {
            return Err(SimulatorError::DepthMismatch {
                betas: betas.len(),
                gammas: gammas.len(),
            });
        }
        Ok(Self { betas, gammas })
    }

    /// Every angle set to `1/depth`
    pub fn constant(depth: usize) -> Self {
        let value = 1.0 / depth as Real;
        Self {
            betas: vec![value; depth],
            gammas: vec![value; depth],
        }
    }

    /// Linear ramp: β decreases and γ increases across the layers
    ///
    /// `β_p = 1 − (p + ½)/depth` and `γ_p = (p + ½)/depth`.
    pub fn linear(depth: usize) -> Self {
        let gammas: Vec<Real> = (0..depth)
            .map(|p| (p as Real + 0.5) / depth as Real)
            .collect();
        let betas = gammas.iter().map(|g| 1.0 - g).collect();
        Self { betas, gammas }
    }

    /// Every angle drawn independently from a standard normal distribution
    ///
    /// All betas are drawn before the gammas, so a seeded generator always
    /// yields the same schedule.
    pub fn random<R: Rng + ?Sized>(depth: usize, rng: &mut R) -> Self {
        let betas = (0..depth).map(|_| rng.sample::<Real, _>(StandardNormal)).collect();
        let gammas = (0..depth).map(|_| rng.sample::<Real, _>(StandardNormal)).collect();
        Self { betas, gammas }
    }

    /// Rebuild a schedule from the flat layout of [`Schedule::to_vec`]
    pub fn from_flat(params: &[Real]) -> Result<Self> {
        if params.len() % 2 != 0 {
            return Err(SimulatorError::DepthMismatch {
                betas: params.len() - params.len() / 2,
                gammas: params.len() / 2,
            });
        }
        let (betas, gammas) = params.split_at(params.len() / 2);
        Ok(Self {
            betas: betas.to_vec(),
            gammas: gammas.to_vec(),
        })
    }

    /// Number of layers
    #[inline]
    pub fn depth(&self) -> usize {
        self.betas.len()
    }

    #[inline]
    pub fn betas(&self) -> &[Real] {
        &self.betas
    }

    #[inline]
    pub fn gammas(&self) -> &[Real] {
        &self.gammas
    }

    /// Iterate over `(β_p, γ_p)` pairs in layer order
    pub fn layers(&self) -> impl DoubleEndedIterator<Item = (Real, Real)> + ExactSizeIterator + '_ {
        self.betas.iter().copied().zip(self.gammas.iter().copied())
    }

    /// All betas followed by all gammas
    pub fn to_vec(&self) -> Vec<Real> {
        let mut flat = Vec::with_capacity(2 * self.depth());
        flat.extend_from_slice(&self.betas);
        flat.extend_from_slice(&self.gammas);
        flat
    }

    /// Multiply every β by `beta_scale` and every γ by `gamma_scale`
    pub fn scaled(&self, beta_scale: Real, gamma_scale: Real) -> Self {
        Self {
            betas: self.betas.iter().map(|b| b * beta_scale).collect(),
            gammas: self.gammas.iter().map(|g| g * gamma_scale).collect(),
        }
    }

    /// Resample onto `depth` layers
    ///
    /// Both angle sequences are read as piecewise-linear functions on [0, 1]
    /// and sampled at `depth` evenly spaced points. The result is scaled by
    /// `old_depth / depth` so the total rotation stays roughly the same.
    pub fn interpolate(&self, depth: usize) -> Self {
        let ratio = self.depth() as Real / depth as Real;
        Self {
            betas: resample(&self.betas, depth, ratio),
            gammas: resample(&self.gammas, depth, ratio),
        }
    }
}

fn grid_point(index: usize, points: usize) -> Real {
    if points < 2 {
        0.0
    } else {
        index as Real / (points - 1) as Real
    }
}

fn resample(values: &[Real], depth: usize, scale: Real) -> Vec<Real> {
    let old = values.len();
    (0..depth)
        .map(|p| {
            let value = match old {
                0 => 0.0,
                1 => values[0],
                _ => {
                    let x = grid_point(p, depth) * (old - 1) as Real;
                    let lower = (x.floor() as usize).min(old - 2);
                    let t = x - lower as Real;
                    values[lower] * (1.0 - t) + values[lower + 1] * t
                }
            };
            value * scale
        })
        .collect()
}
