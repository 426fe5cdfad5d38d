//! Full-image convolution against a [`ConvKernel`] with boundary extension.
//!
//! `dst(x, y) = Σ k(i, j) · src(x - i, y - j)` over the non-zero kernel
//! taps, reading outside the plane through the selected boundary policy.
//! With the `parallel` feature the row loop runs on rayon.
use crate::boundary::{Boundary, BoundaryAccess, Mirror, Periodic};
use crate::error::{RefocusError, Result};
use crate::kernel::ConvKernel;

use super::ImageF64;

/// Convolve `src` with `kernel` into a newly allocated plane.
pub fn convolve(src: &ImageF64, kernel: &ConvKernel, boundary: Boundary) -> Result<ImageF64> {
    let mut dst = ImageF64::try_new(src.w, src.h)?;
    convolve_into(src, kernel, boundary, &mut dst)?;
    Ok(dst)
}

/// Convolve `src` with `kernel` into `dst`, which must have the same shape.
pub fn convolve_into(
    src: &ImageF64,
    kernel: &ConvKernel,
    boundary: Boundary,
    dst: &mut ImageF64,
) -> Result<()> {
    if !src.same_shape(dst) {
        return Err(RefocusError::InvalidInput(format!(
            "convolution target {}x{} does not match source {}x{}",
            dst.w, dst.h, src.w, src.h
        )));
    }
    if src.w == 0 || src.h == 0 {
        return Ok(());
    }
    let taps: Vec<(isize, isize, f64)> = kernel.nonzero().collect();
    match boundary {
        Boundary::Mirror => convolve_rows::<Mirror>(src, &taps, dst),
        Boundary::Periodic => convolve_rows::<Periodic>(src, &taps, dst),
    }
    Ok(())
}

#[inline]
fn convolve_row<B: BoundaryAccess>(
    src: &ImageF64,
    taps: &[(isize, isize, f64)],
    y: usize,
    row: &mut [f64],
) {
    let y = y as isize;
    for (x, out) in row.iter_mut().enumerate() {
        let x = x as isize;
        *out = taps
            .iter()
            .map(|&(i, j, c)| c * src.get_at::<B>(x - i, y - j))
            .sum();
    }
}

#[cfg(not(feature = "parallel"))]
fn convolve_rows<B: BoundaryAccess>(
    src: &ImageF64,
    taps: &[(isize, isize, f64)],
    dst: &mut ImageF64,
) {
    for (y, row) in dst.rows_mut().enumerate() {
        convolve_row::<B>(src, taps, y, row);
    }
}

#[cfg(feature = "parallel")]
fn convolve_rows<B: BoundaryAccess>(
    src: &ImageF64,
    taps: &[(isize, isize, f64)],
    dst: &mut ImageF64,
) {
    use rayon::prelude::*;

    let stride = dst.stride;
    dst.data
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| convolve_row::<B>(src, taps, y, row));
}
