//! Owned single-channel f64 plane in row-major layout (stride == width).
//!
//! One plane holds one colour channel of the image being restored, with
//! samples normalized to `[0, 1]`. Besides plain indexed access it offers
//! boundary-aware reads at signed coordinates, used by every neighbourhood
//! operation in the crate.
use crate::boundary::{Boundary, BoundaryAccess};
use crate::error::{area, try_buffer, RefocusError, Result};

use super::traits::ImageView;

#[derive(Clone, Debug, PartialEq)]
pub struct ImageF64 {
    /// Image width in pixels
    pub w: usize,
    /// Image height in pixels
    pub h: usize,
    /// Number of samples between consecutive rows (equals `w`)
    pub stride: usize,
    /// Backing storage in row-major order
    pub data: Vec<f64>,
}

impl ImageF64 {
    /// Construct a zero-initialized plane of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            stride: w,
            data: vec![0.0; w * h],
        }
    }

    /// Fallible counterpart of [`ImageF64::new`] that reports exhausted
    /// memory instead of aborting.
    pub fn try_new(w: usize, h: usize) -> Result<Self> {
        let len = area("image plane", w, h)?;
        Ok(Self {
            w,
            h,
            stride: w,
            data: try_buffer("image plane", len, 0.0)?,
        })
    }

    /// Wrap existing samples; `data.len()` must equal `w * h`.
    pub fn from_vec(w: usize, h: usize, data: Vec<f64>) -> Result<Self> {
        if w.checked_mul(h) != Some(data.len()) {
            return Err(RefocusError::InvalidInput(format!(
                "plane of {w}x{h} needs {} samples, got {}",
                w.saturating_mul(h),
                data.len()
            )));
        }
        Ok(Self {
            w,
            h,
            stride: w,
            data,
        })
    }

    /// Plane with every sample set to `value`.
    pub fn filled(w: usize, h: usize, value: f64) -> Self {
        Self {
            w,
            h,
            stride: w,
            data: vec![value; w * h],
        }
    }

    /// Mutable row iterator.
    pub fn rows_mut(&mut self) -> std::slice::ChunksMut<'_, f64> {
        self.data.chunks_mut(self.stride.max(1))
    }
}

impl ImageView for ImageF64 {
    type Pixel = f64;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn stride(&self) -> usize {
        self.stride
    }
    #[inline]
    fn row(&self, y: usize) -> &[f64] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }
    #[inline]
    fn as_slice(&self) -> Option<&[f64]> {
        (self.stride == self.w).then_some(&self.data[..self.w * self.h])
    }
}
