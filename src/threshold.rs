//! Data-fidelity bias of the relaxation network.
//!
//! The threshold at a pixel is the observed (blurred) image convolved with
//! the blur kernel, on the same unscaled footing as
//! [`crate::weights::WeightTable`]. It depends only on the observation, so it
//! is computed once per channel and stays read-only while iterating.
use crate::boundary::Boundary;
use crate::error::Result;
use crate::image::{convolve, ImageF64};
use crate::kernel::ConvKernel;

#[derive(Clone, Debug)]
pub struct ThresholdField {
    field: ImageF64,
}

impl ThresholdField {
    /// Build the field for `observed` under the given boundary mode.
    pub fn new(kernel: &ConvKernel, observed: &ImageF64, boundary: Boundary) -> Result<Self> {
        let field = convolve(observed, kernel, boundary)?;
        Ok(Self { field })
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.field.get(x, y)
    }

    pub fn as_image(&self) -> &ImageF64 {
        &self.field
    }
}
