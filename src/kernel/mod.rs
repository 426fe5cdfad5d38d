//! Square, radius-indexed convolution kernels (point-spread functions).
//!
//! A kernel of radius `r` addresses coefficients by offset `(i, j)` with
//! `|i|, |j| <= r`; `i` runs along x (columns) and `j` along y (rows).
//! Anything outside the radius is implicitly zero. Coefficients live in a
//! `(2r+1) × (2r+1)` [`DMatrix`] indexed as `(j + r, i + r)`.
//!
//! Kernels compose algebraically: [`ConvKernel::convolve`] builds the kernel
//! of two successive blurs, so a defocus ⊗ Gaussian ⊗ motion model is
//! applied to the image in a single pass.

pub mod blur;

use log::warn;
use nalgebra::DMatrix;

use crate::error::{try_buffer, RefocusError, Result};

pub use blur::BlurModel;

/// Sums with a smaller magnitude are treated as zero by [`ConvKernel::normalize`].
const ZERO_SUM_EPS: f64 = 1e-12;

#[derive(Clone, Debug, PartialEq)]
pub struct ConvKernel {
    radius: usize,
    coef: DMatrix<f64>,
}

impl ConvKernel {
    /// All-zero kernel of the given radius.
    pub fn new(radius: usize) -> Result<Self> {
        let side = radius
            .checked_mul(2)
            .and_then(|d| d.checked_add(1))
            .ok_or(RefocusError::AllocationFailure {
                what: "convolution kernel",
                elements: usize::MAX,
            })?;
        let len = side
            .checked_mul(side)
            .ok_or(RefocusError::AllocationFailure {
                what: "convolution kernel",
                elements: usize::MAX,
            })?;
        let data = try_buffer("convolution kernel", len, 0.0)?;
        Ok(Self {
            radius,
            coef: DMatrix::from_vec(side, side, data),
        })
    }

    /// Radius-0 kernel with a single unit coefficient.
    pub fn identity() -> Self {
        Self {
            radius: 0,
            coef: DMatrix::from_element(1, 1, 1.0),
        }
    }

    #[inline]
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Edge length `2r + 1`.
    #[inline]
    pub fn side(&self) -> usize {
        2 * self.radius + 1
    }

    /// True when `(i, j)` lies inside the stored support.
    #[inline]
    pub fn contains(&self, i: isize, j: isize) -> bool {
        let r = self.radius as isize;
        i.abs() <= r && j.abs() <= r
    }

    #[inline]
    fn cell(&self, i: isize, j: isize) -> (usize, usize) {
        let r = self.radius as isize;
        ((j + r) as usize, (i + r) as usize)
    }

    /// Coefficient at offset `(i, j)`; zero outside the radius.
    #[inline]
    pub fn get(&self, i: isize, j: isize) -> f64 {
        if self.contains(i, j) {
            self.coef[self.cell(i, j)]
        } else {
            0.0
        }
    }

    /// Overwrite the coefficient at `(i, j)`.
    ///
    /// Panics when the offset is outside the radius.
    pub fn set(&mut self, i: isize, j: isize, value: f64) {
        assert!(
            self.contains(i, j),
            "offset ({i}, {j}) outside kernel radius {}",
            self.radius
        );
        let cell = self.cell(i, j);
        self.coef[cell] = value;
    }

    /// Accumulate into `(i, j)`; contributions outside the radius are dropped.
    pub fn add(&mut self, i: isize, j: isize, value: f64) {
        if self.contains(i, j) {
            let cell = self.cell(i, j);
            self.coef[cell] += value;
        }
    }

    /// Write `value` at all eight offsets `(±i, ±j)` and `(±j, ±i)`.
    pub fn set_circle(&mut self, i: isize, j: isize, value: f64) {
        for (a, b) in [(i, j), (j, i)] {
            self.set(a, b, value);
            self.set(-a, b, value);
            self.set(a, -b, value);
            self.set(-a, -b, value);
        }
    }

    /// Sum of all coefficients.
    pub fn sum(&self) -> f64 {
        self.coef.sum()
    }

    /// Sum of squared coefficients, the auto-correlation at zero offset.
    pub fn self_energy(&self) -> f64 {
        self.coef.norm_squared()
    }

    /// Scale coefficients to unit mass.
    ///
    /// A kernel whose sum is within `1e-12` of zero is left unchanged.
    pub fn normalize(&mut self) -> &mut Self {
        let sum = self.sum();
        if sum.abs() < ZERO_SUM_EPS {
            warn!(
                "ConvKernel::normalize: coefficient sum {sum:e} is ~0 (radius {}), leaving kernel unnormalized",
                self.radius
            );
            return self;
        }
        self.coef /= sum;
        self
    }

    /// Non-zero coefficients as `(i, j, value)` in row-major order.
    pub fn nonzero(&self) -> impl Iterator<Item = (isize, isize, f64)> + '_ {
        let r = self.radius as isize;
        (-r..=r).flat_map(move |j| {
            (-r..=r).filter_map(move |i| {
                let v = self.coef[self.cell(i, j)];
                (v != 0.0).then_some((i, j, v))
            })
        })
    }

    /// Number of non-zero coefficients.
    pub fn nonzero_count(&self) -> usize {
        self.coef.iter().filter(|&&v| v != 0.0).count()
    }

    /// Compose two blurs: `c[i,j] = Σ a[p,q]·b[i-p, j-q]`, then normalize.
    ///
    /// The result has radius `radius(a) + radius(b)`.
    pub fn convolve(&self, other: &ConvKernel) -> Result<ConvKernel> {
        let radius = self
            .radius
            .checked_add(other.radius)
            .ok_or(RefocusError::AllocationFailure {
                what: "convolution kernel",
                elements: usize::MAX,
            })?;
        let mut out = ConvKernel::new(radius)?;
        let rhs: Vec<(isize, isize, f64)> = other.nonzero().collect();
        for (p, q, a) in self.nonzero() {
            for &(s, t, b) in &rhs {
                out.add(p + s, q + t, a * b);
            }
        }
        out.normalize();
        Ok(out)
    }
}
