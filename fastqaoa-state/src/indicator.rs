//! Smooth constraint indicators from quantum phase estimation
//!
//! A QPE-based constraint check estimates the phase `e^{iπ g}` of a
//! constraint operator with `M` ancilla bits and flips a sign depending on the
//! most significant bit of the estimate. The resulting amplitude is not a hard
//! ±1 step: it follows a smooth, `2`-periodic response of `g` that sits at `+1`
//! for `g` in `[0, 1)`, at `−1` for `g` in `[1, 2)`, and ramps between them
//! over a window of width `2 / 2^M` just below each threshold.
//!
//! [`QpeIndicator`] samples that response on a grid `2^subdivisions` times
//! finer than the phase register resolution and interpolates it with a
//! periodic cubic spline. [`QpeIndicator::apply`] maps a constraint operator
//! through it, producing the `k` values consumed by the QPE phase layer.
//!
//! # Example
//!
//! ```
//! use fastqaoa_state::{Diagonals, QpeIndicator};
//!
//! let indicator = QpeIndicator::new(4, 3).unwrap();
//! let weight = Diagonals::from_values(&[0.25, 0.5, 1.25, 1.5]).unwrap();
//! let constraint = indicator.apply(&weight);
//!
//! assert!((constraint[0] - 1.0).abs() < 1e-4);
//! assert!((constraint[3] + 1.0).abs() < 1e-4);
//! ```

use crate::diagonals::Diagonals;
use crate::error::{Result, StateError};
use crate::precision::{Complex, Real};
use rustfft::FftPlanner;
use tracing::debug;

/// Largest `precision_bits + subdivisions` accepted when sampling the response
pub const MAX_INDICATOR_BITS: usize = 24;

const TAU: Real = 2.0 * std::f64::consts::PI as Real;

/// QPE response of a `precision_bits`-bit phase register, sampled at
/// `2^(precision_bits + subdivisions)` equidistant phases over one period
///
/// Entry `m · 2^subdivisions + j` is the response at `g = 2 (m + j / 2^subdivisions) / 2^precision_bits`.
/// Each row of `2^subdivisions` sub-grid offsets is one inverse FFT over the
/// odd Fourier modes of the register.
///
/// # Errors
/// Returns [`StateError::InvalidIndicator`] if `precision_bits` is zero or the
/// total grid exponent exceeds [`MAX_INDICATOR_BITS`].
pub fn indicator_base(precision_bits: usize, subdivisions: usize) -> Result<Vec<Real>> {
    check_resolution(precision_bits, subdivisions)?;

    let register = 1usize << precision_bits;
    let rows = 1usize << subdivisions;
    let total = register * rows;
    let scale = register as Real;

    let mut planner = FftPlanner::<Real>::new();
    let ifft = planner.plan_fft_inverse(register);

    // Fourier weights of the odd modes, shared by every row
    let weights: Vec<(usize, Complex)> = (1..register)
        .step_by(2)
        .map(|k| {
            let kr = k as Real;
            let numerator = Complex::new(8.0 * (1.0 - kr / scale), 0.0);
            let denominator = Complex::new(1.0, 0.0) - Complex::from_polar(1.0, -TAU * kr / scale);
            (k, numerator / denominator)
        })
        .collect();

    let mut base = vec![0.0; total];
    let mut row = vec![Complex::new(0.0, 0.0); register];
    for j in 0..rows {
        let offset = TAU * j as Real / total as Real;
        row.fill(Complex::new(0.0, 0.0));
        for &(k, weight) in &weights {
            row[k] = weight * Complex::from_polar(1.0, offset * k as Real);
        }
        ifft.process(&mut row);
        for (m, z) in row.iter().enumerate() {
            base[m * rows + j] = z.re / scale;
        }
    }

    Ok(base)
}

fn check_resolution(precision_bits: usize, subdivisions: usize) -> Result<()> {
    if precision_bits == 0 {
        return Err(StateError::InvalidIndicator(
            "phase register needs at least one bit".to_string(),
        ));
    }
    if precision_bits + subdivisions > MAX_INDICATOR_BITS {
        return Err(StateError::InvalidIndicator(format!(
            "grid of 2^{} samples exceeds 2^{}",
            precision_bits + subdivisions,
            MAX_INDICATOR_BITS
        )));
    }
    Ok(())
}

/// Second derivatives of the periodic cubic spline through `values` on a
/// uniform grid with spacing `step`
///
/// The continuity conditions form a circulant system with stencil
/// `[1, 4, 1]`, which is diagonal in Fourier space.
fn periodic_curvature(values: &[Real], step: Real) -> Vec<Real> {
    let n = values.len();
    let factor = 6.0 / (step * step);

    let mut rhs: Vec<Complex> = (0..n)
        .map(|i| {
            let prev = values[(i + n - 1) % n];
            let next = values[(i + 1) % n];
            Complex::new(factor * (next - 2.0 * values[i] + prev), 0.0)
        })
        .collect();

    let mut planner = FftPlanner::<Real>::new();
    planner.plan_fft_forward(n).process(&mut rhs);
    for (k, z) in rhs.iter_mut().enumerate() {
        let eigenvalue = 4.0 + 2.0 * (TAU * k as Real / n as Real).cos();
        *z /= eigenvalue;
    }
    planner.plan_fft_inverse(n).process(&mut rhs);

    rhs.iter().map(|z| z.re / n as Real).collect()
}

/// Periodic cubic-spline interpolant of the QPE constraint response
#[derive(Debug, Clone, PartialEq)]
pub struct QpeIndicator {
    precision_bits: usize,
    subdivisions: usize,
    origin: Real,
    step: Real,
    samples: Vec<Real>,
    curvature: Vec<Real>,
}

impl QpeIndicator {
    /// Indicator over the natural period `[0, 2)` with no shift
    pub fn new(precision_bits: usize, subdivisions: usize) -> Result<Self> {
        Self::with_range(precision_bits, subdivisions, 0.0, 2.0, 0.0)
    }

    /// Indicator whose period is stretched onto `[low, high)`
    ///
    /// The knots are additionally moved by `shift / 2^precision_bits`, which
    /// slides the feasibility threshold by `shift` register steps. Inputs
    /// outside the period wrap around.
    ///
    /// # Errors
    /// Returns [`StateError::InvalidIndicator`] for an empty or non-finite
    /// range, a non-finite shift, or an unsupported resolution.
    pub fn with_range(
        precision_bits: usize,
        subdivisions: usize,
        low: Real,
        high: Real,
        shift: Real,
    ) -> Result<Self> {
        if !(low.is_finite() && high.is_finite() && high > low) {
            return Err(StateError::InvalidIndicator(format!(
                "empty range [{low}, {high})"
            )));
        }
        if !shift.is_finite() {
            return Err(StateError::InvalidIndicator(format!("shift {shift}")));
        }

        let samples = indicator_base(precision_bits, subdivisions)?;
        let step = (high - low) / samples.len() as Real;
        let curvature = periodic_curvature(&samples, step);
        let origin = low + shift / (1usize << precision_bits) as Real;

        debug!(
            precision_bits,
            subdivisions,
            knots = samples.len(),
            origin,
            "built QPE indicator"
        );

        Ok(Self {
            precision_bits,
            subdivisions,
            origin,
            step,
            samples,
            curvature,
        })
    }

    /// Number of phase-register bits
    #[inline]
    pub fn precision_bits(&self) -> usize {
        self.precision_bits
    }

    /// Sub-grid refinement exponent
    #[inline]
    pub fn subdivisions(&self) -> usize {
        self.subdivisions
    }

    /// Response at the spline knots over one period
    #[inline]
    pub fn samples(&self) -> &[Real] {
        &self.samples
    }

    /// Length of one period
    #[inline]
    pub fn period(&self) -> Real {
        self.step * self.samples.len() as Real
    }

    /// Interpolated response at `x`
    pub fn evaluate(&self, x: Real) -> Real {
        let n = self.samples.len();
        let u = ((x - self.origin) / self.step).rem_euclid(n as Real);
        let i = (u.floor() as usize).min(n - 1);
        let j = (i + 1) % n;
        let t = u - i as Real;
        let s = 1.0 - t;

        s * self.samples[i]
            + t * self.samples[j]
            + self.step * self.step / 6.0
                * ((s * s * s - s) * self.curvature[i] + (t * t * t - t) * self.curvature[j])
    }

    /// Map every entry of a constraint operator through the response
    pub fn apply(&self, constraint: &Diagonals) -> Diagonals {
        let values = constraint.values().iter().map(|&v| self.evaluate(v)).collect();
        Diagonals::from_vec(constraint.num_qubits(), values)
    }
}
