//! Build-wide floating point precision
//!
//! All amplitudes, diagonal entries and accumulations use [`Real`]. The
//! `f32` cargo feature switches the whole build to single precision; mixing
//! precisions inside one build is not possible.

#[cfg(not(feature = "f32"))]
pub type Real = f64;

#[cfg(feature = "f32")]
pub type Real = f32;

/// Complex amplitude type matching [`Real`]
pub type Complex = num_complex::Complex<Real>;

/// Absolute tolerance used by the `=` and `≠` comparators
pub const CMP_TOLERANCE: Real = 1e-8;

/// Largest qubit count a dense register may be allocated for
pub const MAX_QUBITS: usize = 30;

/// Shorthand for a complex number with the given real part
#[inline]
pub fn real(re: Real) -> Complex {
    Complex::new(re, 0.0)
}
