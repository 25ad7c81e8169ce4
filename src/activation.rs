//! Activation functions for decoded networks.
//!
//! Each function is a stateless elementwise transform selected once per
//! network at decode time. Every function has a scalar form and batch forms
//! over contiguous buffers; with the `simd` feature the piecewise-linear
//! family additionally has a genuinely vector-parallel body, applied four
//! lanes at a time. The vector forms are numerically equivalent to the
//! scalar forms for every input, including values on the threshold
//! boundaries; that equivalence is a tested property, not an assumption.

use serde::{Deserialize, Serialize};

#[cfg(feature = "simd")]
use wide::{f64x4, CmpGt, CmpLt};

/// Leak coefficient for the rectifier family.
const LEAK: f64 = 0.001;
/// X-axis shift used by the shifted rectifiers, so that x=0 gives y=0.5 in
/// keeping with the logistic sigmoid.
const SHIFT: f64 = 0.5;
/// S-shaped rectifier thresholds and outer-segment slope.
const SRELU_TL: f64 = 0.001;
const SRELU_TR: f64 = 0.999;
const SRELU_A: f64 = 0.00001;

/// Activation function catalogue.
///
/// The function applies to a node's accumulated weighted input; the choice
/// is a per-network configuration decision, not a per-node one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Activation {
    /// f(x) = x
    Identity,
    /// Logistic sigmoid: f(x) = 1 / (1 + e^(-x))
    Logistic,
    /// Steepened logistic sigmoid: f(x) = 1 / (1 + e^(-4.9x))
    #[default]
    LogisticSteep,
    /// Hyperbolic tangent: f(x) = tanh(x)
    Tanh,
    /// Steepened soft-sign, rescaled into [0, 1].
    SoftSignSteep,
    /// Rectified linear unit: f(x) = max(0, x)
    ReLU,
    /// Leaky rectifier: f(x) = x if x > 0, else 0.001x
    LeakyReLU,
    /// Leaky rectifier shifted on the x-axis so that x=0 gives y=0.5.
    LeakyReLUShifted,
    /// S-shaped rectified linear unit.
    SReLU,
    /// S-shaped rectified linear unit, shifted like [`Self::LeakyReLUShifted`].
    SReLUShifted,
    /// Gaussian: f(x) = e^(-x^2)
    Gaussian,
    /// Sine: f(x) = sin(x)
    Sine,
}

impl Activation {
    /// All catalogue entries.
    pub const ALL: [Self; 12] = [
        Self::Identity,
        Self::Logistic,
        Self::LogisticSteep,
        Self::Tanh,
        Self::SoftSignSteep,
        Self::ReLU,
        Self::LeakyReLU,
        Self::LeakyReLUShifted,
        Self::SReLU,
        Self::SReLUShifted,
        Self::Gaussian,
        Self::Sine,
    ];

    /// Apply this activation function to a single pre-activation value.
    #[inline]
    #[must_use]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Self::Identity => x,
            Self::Logistic => 1.0 / (1.0 + (-x).exp()),
            Self::LogisticSteep => 1.0 / (1.0 + (-4.9 * x).exp()),
            Self::Tanh => x.tanh(),
            Self::SoftSignSteep => 0.5 + x / (2.0 * (0.2 + x.abs())),
            Self::ReLU => x.max(0.0),
            Self::LeakyReLU => {
                if x > 0.0 {
                    x
                } else {
                    x * LEAK
                }
            }
            Self::LeakyReLUShifted => {
                let y = x + SHIFT;
                if y < 0.0 {
                    y * LEAK
                } else {
                    y
                }
            }
            Self::SReLU => srelu(x),
            Self::SReLUShifted => srelu(x + SHIFT),
            Self::Gaussian => (-x * x).exp(),
            Self::Sine => x.sin(),
        }
    }

    /// Apply the function to every element of `v` in place.
    pub fn apply_slice(self, v: &mut [f64]) {
        for x in v {
            *x = self.apply(*x);
        }
    }

    /// Apply the function to every element of `v`, writing results to `w`.
    ///
    /// # Panics
    ///
    /// Panics if `v` and `w` have different lengths.
    pub fn apply_slice_to(self, v: &[f64], w: &mut [f64]) {
        assert_eq!(
            v.len(),
            w.len(),
            "Buffer length mismatch: {} vs {}",
            v.len(),
            w.len()
        );
        for (x, y) in v.iter().zip(w.iter_mut()) {
            *y = self.apply(*x);
        }
    }

    /// Whether this function has a genuinely vectorized body.
    ///
    /// Only the piecewise-linear family vectorizes profitably; the
    /// transcendental functions delegate to the scalar loop in the vector
    /// path and remain numerically identical by construction.
    #[must_use]
    pub const fn has_vector_form(self) -> bool {
        matches!(
            self,
            Self::Identity
                | Self::ReLU
                | Self::LeakyReLU
                | Self::LeakyReLUShifted
                | Self::SReLU
                | Self::SReLUShifted
        )
    }
}

#[inline]
fn srelu(x: f64) -> f64 {
    if x > SRELU_TL && x < SRELU_TR {
        x
    } else if x <= SRELU_TL {
        SRELU_TL + (x - SRELU_TL) * SRELU_A
    } else {
        SRELU_TR + (x - SRELU_TR) * SRELU_A
    }
}

#[cfg(feature = "simd")]
impl Activation {
    const LANES: usize = 4;

    /// Vector-parallel form of [`Self::apply_slice`].
    ///
    /// Processes four lanes at a time, with a scalar loop over the tail when
    /// the buffer length is not a multiple of the vector width.
    pub fn apply_slice_vec(self, v: &mut [f64]) {
        if !self.has_vector_form() {
            self.apply_slice(v);
            return;
        }

        let simd_end = v.len() - (v.len() % Self::LANES);
        for i in (0..simd_end).step_by(Self::LANES) {
            let x = f64x4::from([v[i], v[i + 1], v[i + 2], v[i + 3]]);
            let y = self.apply_lanes(x).to_array();
            v[i..i + Self::LANES].copy_from_slice(&y);
        }
        for x in &mut v[simd_end..] {
            *x = self.apply(*x);
        }
    }

    /// Vector-parallel form of [`Self::apply_slice_to`].
    ///
    /// # Panics
    ///
    /// Panics if `v` and `w` have different lengths.
    pub fn apply_slice_to_vec(self, v: &[f64], w: &mut [f64]) {
        assert_eq!(
            v.len(),
            w.len(),
            "Buffer length mismatch: {} vs {}",
            v.len(),
            w.len()
        );
        if !self.has_vector_form() {
            self.apply_slice_to(v, w);
            return;
        }

        let simd_end = v.len() - (v.len() % Self::LANES);
        for i in (0..simd_end).step_by(Self::LANES) {
            let x = f64x4::from([v[i], v[i + 1], v[i + 2], v[i + 3]]);
            let y = self.apply_lanes(x).to_array();
            w[i..i + Self::LANES].copy_from_slice(&y);
        }
        for (x, y) in v[simd_end..].iter().zip(w[simd_end..].iter_mut()) {
            *y = self.apply(*x);
        }
    }

    /// Four-lane kernel for the vectorizable functions.
    #[inline]
    fn apply_lanes(self, x: f64x4) -> f64x4 {
        let zero = f64x4::splat(0.0);
        match self {
            Self::Identity => x,
            Self::ReLU => x.max(zero),
            // max(x,0) + min(x,0)*a selects the leaked segment without a branch.
            Self::LeakyReLU => x.max(zero) + x.min(zero) * f64x4::splat(LEAK),
            Self::LeakyReLUShifted => {
                let y = x + f64x4::splat(SHIFT);
                y.max(zero) + y.min(zero) * f64x4::splat(LEAK)
            }
            Self::SReLU => srelu_lanes(x),
            Self::SReLUShifted => srelu_lanes(x + f64x4::splat(SHIFT)),
            _ => unreachable!("no vector form"),
        }
    }
}

#[cfg(feature = "simd")]
#[inline]
fn srelu_lanes(x: f64x4) -> f64x4 {
    let tl = f64x4::splat(SRELU_TL);
    let tr = f64x4::splat(SRELU_TR);
    let a = f64x4::splat(SRELU_A);

    let left = tl + (x - tl) * a;
    let right = tr + (x - tr) * a;

    // Lane selection mirrors the scalar branch structure exactly: lanes at
    // or beyond a threshold take that threshold's outer segment.
    let y = x.cmp_lt(tr).blend(x, right);
    x.cmp_gt(tl).blend(y, left)
}

/// Apply `act` to a contiguous segment using the path resolved at decode
/// time.
#[cfg(feature = "simd")]
#[inline]
pub(crate) fn apply_segment(act: Activation, vectorized: bool, seg: &mut [f64]) {
    if vectorized {
        act.apply_slice_vec(seg);
    } else {
        act.apply_slice(seg);
    }
}

#[cfg(not(feature = "simd"))]
#[inline]
pub(crate) fn apply_segment(act: Activation, _vectorized: bool, seg: &mut [f64]) {
    act.apply_slice(seg);
}

/// Apply `act` from `src` into `dst` using the path resolved at decode time.
#[cfg(feature = "simd")]
#[inline]
pub(crate) fn apply_segment_to(act: Activation, vectorized: bool, src: &[f64], dst: &mut [f64]) {
    if vectorized {
        act.apply_slice_to_vec(src, dst);
    } else {
        act.apply_slice_to(src, dst);
    }
}

#[cfg(not(feature = "simd"))]
#[inline]
pub(crate) fn apply_segment_to(act: Activation, _vectorized: bool, src: &[f64], dst: &mut [f64]) {
    act.apply_slice_to(src, dst);
}
