#![allow(dead_code)]

use hopfield_refocus::image::convolve;
use hopfield_refocus::{Boundary, ConvKernel, ImageF64};

/// Snap every sample onto the 8-bit grid, as a host image would be.
pub fn quantize(img: &ImageF64) -> ImageF64 {
    let mut out = img.clone();
    for v in out.data.iter_mut() {
        *v = (*v * 255.0).round().clamp(0.0, 255.0) / 255.0;
    }
    out
}

/// Dark background with a bright vertical bar over the middle half.
pub fn step_bar(width: usize, height: usize) -> ImageF64 {
    assert!(width >= 4 && height > 0, "image too small for a bar");
    let mut img = ImageF64::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let v = if (width / 4..3 * width / 4).contains(&x) {
                200.0
            } else {
                40.0
            };
            img.set(x, y, v / 255.0);
        }
    }
    img
}

/// Image whose rows and columns read the same in both directions.
///
/// Mirror and periodic extension coincide for such images.
pub fn palindromic(width: usize, height: usize) -> ImageF64 {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    let mut img = ImageF64::new(width, height);
    for y in 0..height {
        let fy = y.min(height - 1 - y) as f64;
        for x in 0..width {
            let fx = x.min(width - 1 - x) as f64;
            let v = 0.15 + 0.1 * fx + 0.07 * fy + 0.05 * ((fx * fy) % 3.0);
            img.set(x, y, (v.min(1.0) * 255.0).round() / 255.0);
        }
    }
    img
}

/// `sharp` blurred by `kernel` and quantized to 8 bits.
pub fn blurred(sharp: &ImageF64, kernel: &ConvKernel, boundary: Boundary) -> ImageF64 {
    let out = convolve(sharp, kernel, boundary).expect("convolution of a test image");
    quantize(&out)
}

/// Interleave planes with an optional constant alpha channel.
pub fn interleave(planes: &[ImageF64], alpha: Option<f64>) -> Vec<f64> {
    let n = planes[0].data.len();
    let mut out = Vec::with_capacity(n * (planes.len() + 1));
    for i in 0..n {
        for p in planes {
            out.push(p.data[i]);
        }
        if let Some(a) = alpha {
            out.push(a);
        }
    }
    out
}

/// Squared distance between `H·x` and `y` under periodic extension.
pub fn data_residual(x: &ImageF64, kernel: &ConvKernel, y: &ImageF64) -> f64 {
    let hx = convolve(x, kernel, Boundary::Periodic).expect("convolution of a test image");
    hx.data
        .iter()
        .zip(&y.data)
        .map(|(a, b)| (a - b) * (a - b))
        .sum()
}
