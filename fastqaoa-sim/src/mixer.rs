//! Transverse-field mixer as a butterfly network
//!
//! The mixer applies `exp(−iβX)` to every qubit. Rotations on distinct qubits
//! commute, so the plan groups qubits into blocks of 1, 2 or 3 and applies the
//! tensor-product rotation of a whole block in a single pass over the state.
//! Each stage reads the blocks as contiguous runs of 2, 4 or 8 amplitudes and
//! scatters the results with a stride, which cyclically rotates the index
//! bits by the block width. After all stages every qubit has been rotated
//! exactly once and the bit order is back where it started.
//!
//! Stages never write into the buffer they read. The plan owns a scratch
//! buffer of the state's size, writes into it, and exchanges it with the
//! state's buffer after each stage.

use crate::error::{Result, SimulatorError};
use fastqaoa_state::{Complex, Real, StateError, StateVector, MAX_QUBITS};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Width of a fused butterfly block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Radix {
    /// One qubit, pairs of amplitudes
    Two,
    /// Two qubits, quadruples of amplitudes
    Four,
    /// Three qubits, octets of amplitudes
    Eight,
}

impl Radix {
    const BY_QUBITS: [Radix; 3] = [Radix::Two, Radix::Four, Radix::Eight];

    /// Number of qubits covered by one block
    #[inline]
    pub fn qubits(self) -> usize {
        match self {
            Radix::Two => 1,
            Radix::Four => 2,
            Radix::Eight => 3,
        }
    }

    /// Number of amplitudes combined per block
    #[inline]
    pub fn width(self) -> usize {
        1 << self.qubits()
    }
}

/// Split `num_qubits` into butterfly stages no wider than `max_radix`
///
/// As many maximal blocks as fit come first. The remainder is covered
/// greedily by narrower blocks, widest first, each used at most once.
pub fn decompose(num_qubits: usize, max_radix: Radix) -> Vec<Radix> {
    let block = max_radix.qubits();
    let mut stages = vec![max_radix; num_qubits / block];

    let mut remaining = num_qubits % block;
    let mut width = block - 1;
    while width > 0 && remaining > 0 {
        if remaining >= width {
            stages.push(Radix::BY_QUBITS[width - 1]);
            remaining -= width;
        }
        width -= 1;
    }
    stages
}

/// Multiply by −i
#[inline(always)]
fn mix(z: Complex) -> Complex {
    Complex::new(z.im, -z.re)
}

/// Trigonometric products for one rotation angle
#[derive(Debug, Clone, Copy, Default)]
struct Coefficients {
    s: Real,
    c: Real,
    ss: Real,
    cc: Real,
    sc: Real,
    ssc: Real,
    scc: Real,
    sss: Real,
    ccc: Real,
}

impl Coefficients {
    fn new(beta: Real, max_radix: Radix) -> Self {
        let (s, c) = beta.sin_cos();
        let mut k = Self {
            s,
            c,
            ..Default::default()
        };
        if max_radix >= Radix::Four {
            k.ss = s * s;
            k.cc = 1.0 - k.ss;
            k.sc = s * c;
        }
        if max_radix >= Radix::Eight {
            k.ssc = k.ss * c;
            k.scc = k.cc * s;
            k.sss = k.ss * s;
            k.ccc = k.cc * c;
        }
        k
    }
}

fn butterfly2(src: &[Complex], dst: &mut [Complex], k: &Coefficients) {
    let (lo, hi) = dst.split_at_mut(src.len() / 2);
    for ((a, out0), out1) in src.chunks_exact(2).zip(lo).zip(hi) {
        *out0 = k.c * a[0] + k.s * mix(a[1]);
        *out1 = k.c * a[1] + k.s * mix(a[0]);
    }
}

fn butterfly4(src: &[Complex], dst: &mut [Complex], k: &Coefficients) {
    let m = src.len() / 4;
    for (i, d) in src.chunks_exact(4).enumerate() {
        let buf = mix(d[1] + d[2]);
        dst[i] = k.cc * d[0] - k.ss * d[3] + k.sc * buf;
        dst[3 * m + i] = k.cc * d[3] - k.ss * d[0] + k.sc * buf;

        let buf = mix(d[0] + d[3]);
        dst[m + i] = k.cc * d[1] - k.ss * d[2] + k.sc * buf;
        dst[2 * m + i] = k.cc * d[2] - k.ss * d[1] + k.sc * buf;
    }
}

fn butterfly8(src: &[Complex], dst: &mut [Complex], k: &Coefficients) {
    let m = src.len() / 8;
    for (i, d) in src.chunks_exact(8).enumerate() {
        // bufa and bufb hold the single- and double-flip neighbours of the
        // output pair being written, in either order.
        let mut bufa = d[1] + d[2] + d[4];
        let mut bufb = d[3] + d[5] + d[6];

        dst[i] = k.ccc * d[0] + k.scc * mix(bufa) - k.ssc * bufb - k.sss * mix(d[7]);
        dst[7 * m + i] = k.ccc * d[7] + k.scc * mix(bufb) - k.ssc * bufa - k.sss * mix(d[0]);

        bufa += d[7] - d[1];
        bufb += d[0] - d[6];
        dst[m + i] = k.ccc * d[1] + k.scc * mix(bufb) - k.ssc * bufa - k.sss * mix(d[6]);
        dst[6 * m + i] = k.ccc * d[6] + k.scc * mix(bufa) - k.ssc * bufb - k.sss * mix(d[1]);

        bufa += d[1] - d[2];
        bufb += d[6] - d[5];
        dst[2 * m + i] = k.ccc * d[2] + k.scc * mix(bufb) - k.ssc * bufa - k.sss * mix(d[5]);
        dst[5 * m + i] = k.ccc * d[5] + k.scc * mix(bufa) - k.ssc * bufb - k.sss * mix(d[2]);

        bufa += d[2] - d[4];
        bufb += d[5] - d[3];
        dst[3 * m + i] = k.ccc * d[3] + k.scc * mix(bufa) - k.ssc * bufb - k.sss * mix(d[4]);
        dst[4 * m + i] = k.ccc * d[4] + k.scc * mix(bufb) - k.ssc * bufa - k.sss * mix(d[3]);
    }
}

/// Reusable execution plan for the mixer on a fixed qubit count
///
/// # Example
///
/// ```
/// use fastqaoa_sim::{MixerPlan, Radix};
/// use fastqaoa_state::StateVector;
///
/// let mut plan = MixerPlan::new(5, Radix::Four).unwrap();
/// assert_eq!(plan.stages(), &[Radix::Four, Radix::Four, Radix::Two]);
///
/// let mut state = StateVector::new(5).unwrap();
/// plan.apply(&mut state, 0.3).unwrap();
/// plan.apply(&mut state, -0.3).unwrap();
/// assert!((state.amplitudes()[0].re - 1.0).abs() < 1e-5);
/// ```
#[derive(Debug, Clone)]
pub struct MixerPlan {
    num_qubits: usize,
    max_radix: Radix,
    stages: Vec<Radix>,
    scratch: Vec<Complex>,
}

impl MixerPlan {
    /// Build a plan for `num_qubits` qubits using blocks up to `max_radix`
    ///
    /// # Errors
    /// Returns error if `num_qubits` is too large for a dense register
    pub fn new(num_qubits: usize, max_radix: Radix) -> Result<Self> {
        if num_qubits > MAX_QUBITS {
            return Err(StateError::TooManyQubits {
                num_qubits,
                max_qubits: MAX_QUBITS,
            }
            .into());
        }
        let stages = decompose(num_qubits, max_radix);
        debug!(num_qubits, ?max_radix, ?stages, "built mixer plan");
        Ok(Self {
            num_qubits,
            max_radix,
            stages,
            scratch: vec![Complex::new(0.0, 0.0); 1 << num_qubits],
        })
    }

    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    #[inline]
    pub fn max_radix(&self) -> Radix {
        self.max_radix
    }

    /// Block radixes in the order they are applied
    #[inline]
    pub fn stages(&self) -> &[Radix] {
        &self.stages
    }

    /// Apply `exp(−iβX)` to every qubit of `state`
    pub fn apply(&mut self, state: &mut StateVector, beta: Real) -> Result<()> {
        if state.num_qubits() != self.num_qubits {
            return Err(SimulatorError::QubitMismatch {
                expected: self.num_qubits,
                actual: state.num_qubits(),
            });
        }

        let k = Coefficients::new(beta, self.max_radix);
        for &radix in &self.stages {
            let src = state.amplitudes();
            match radix {
                Radix::Two => butterfly2(src, &mut self.scratch, &k),
                Radix::Four => butterfly4(src, &mut self.scratch, &k),
                Radix::Eight => butterfly8(src, &mut self.scratch, &k),
            }
            state.exchange_buffer(&mut self.scratch);
        }
        Ok(())
    }
}

/// One-shot mixer application with a temporary plan
pub fn apply_mixer(state: &mut StateVector, beta: Real, max_radix: Radix) -> Result<()> {
    MixerPlan::new(state.num_qubits(), max_radix)?.apply(state, beta)
}
