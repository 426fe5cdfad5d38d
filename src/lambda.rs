//! Spatially varying regularization weights.
//!
//! The lambda field scales the smoothness penalty per pixel from local
//! variance statistics:
//!
//! 1. Optionally pre-smooth the plane with a small filter kernel so that
//!    noise does not masquerade as structure.
//! 2. Compute the variance `E[x²] - E[x]²` over a `(2·window+1)²` square
//!    around every pixel, reading past the border through the boundary mode.
//! 3. Map variance to lambda with a [`LambdaLaw`] that sends the variance
//!    range `[minvar, maxvar]` onto `[min_lambda, 1]`.
//!
//! Every value is clamped into `[min_lambda, 1]`. A flat plane (no variance
//! spread) maps every pixel to the law's minimum-variance output.
use log::debug;
use serde::{Deserialize, Serialize};

use crate::boundary::{Boundary, BoundaryAccess, Mirror, Periodic};
use crate::error::{area, try_buffer, RefocusError, Result};
use crate::image::{convolve, ImageF64};
use crate::kernel::ConvKernel;

/// Variance spreads at or below this are treated as a flat image.
const FLAT_SPAN_EPS: f64 = 1e-12;

/// Mapping from local variance to lambda.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LambdaLaw {
    /// `lambda = a + b·var`: `min_lambda` at `minvar`, 1 at `maxvar`.
    Linear,
    /// `lambda = 1 / (1 + α·(var - minvar))`: 1 at `minvar`, `min_lambda` at `maxvar`.
    #[default]
    Reciprocal,
}

impl LambdaLaw {
    /// Output assigned at the minimum variance (and to flat planes).
    pub fn at_min_variance(self, min_lambda: f64) -> f64 {
        match self {
            LambdaLaw::Linear => min_lambda,
            LambdaLaw::Reciprocal => 1.0,
        }
    }
}

/// Extremes of the local variance over a plane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct VarianceRange {
    pub min: f64,
    pub max: f64,
}

impl VarianceRange {
    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Largest accepted variance window half-size.
pub const MAX_WINDOW: usize = 16;

#[derive(Clone, Debug)]
pub struct LambdaField<'f> {
    w: usize,
    h: usize,
    min_lambda: f64,
    window: usize,
    filter: Option<&'f ConvKernel>,
    boundary: Boundary,
    law: LambdaLaw,
    values: Vec<f64>,
    variance: ImageF64,
}

impl<'f> LambdaField<'f> {
    /// Allocate a field for `w × h` planes. Values start at 1 until the
    /// first [`LambdaField::compute`].
    ///
    /// `min_lambda` must lie in `(0, 1]` and `window` in `1..=MAX_WINDOW`.
    pub fn new(
        w: usize,
        h: usize,
        min_lambda: f64,
        window: usize,
        filter: Option<&'f ConvKernel>,
        boundary: Boundary,
        law: LambdaLaw,
    ) -> Result<Self> {
        if !(min_lambda > 0.0 && min_lambda <= 1.0) {
            return Err(RefocusError::InvalidInput(format!(
                "min_lambda must lie in (0, 1], got {min_lambda}"
            )));
        }
        if !(1..=MAX_WINDOW).contains(&window) {
            return Err(RefocusError::InvalidInput(format!(
                "variance window must lie in 1..={MAX_WINDOW}, got {window}"
            )));
        }
        let len = area("lambda field", w, h)?;
        Ok(Self {
            w,
            h,
            min_lambda,
            window,
            filter,
            boundary,
            law,
            values: try_buffer("lambda field", len, 1.0)?,
            variance: ImageF64::try_new(w, h)?,
        })
    }

    /// Recompute every lambda from `image`.
    pub fn compute(&mut self, image: &ImageF64) -> Result<VarianceRange> {
        if image.w != self.w || image.h != self.h {
            return Err(RefocusError::InvalidInput(format!(
                "lambda field is {}x{} but image is {}x{}",
                self.w, self.h, image.w, image.h
            )));
        }
        if self.w == 0 || self.h == 0 {
            return Ok(VarianceRange { min: 0.0, max: 0.0 });
        }

        let smoothed;
        let src = match self.filter {
            Some(filter) => {
                smoothed = convolve(image, filter, self.boundary)?;
                &smoothed
            }
            None => image,
        };

        let range = match self.boundary {
            Boundary::Mirror => local_variance::<Mirror>(src, self.window, &mut self.variance),
            Boundary::Periodic => local_variance::<Periodic>(src, self.window, &mut self.variance),
        };
        self.map_variance(range);
        Ok(range)
    }

    fn map_variance(&mut self, range: VarianceRange) {
        let m = self.min_lambda;
        let span = range.span();
        if span <= FLAT_SPAN_EPS {
            let v = self.law.at_min_variance(m);
            debug!(
                "LambdaField: flat variance (span {span:e}), every lambda set to {v}"
            );
            self.values.fill(v);
            return;
        }

        let variance = &self.variance.data;
        match self.law {
            LambdaLaw::Linear => {
                let b = (1.0 - m) / span;
                let a = m - range.min * b;
                for (dst, &var) in self.values.iter_mut().zip(variance) {
                    *dst = (a + b * var).clamp(m, 1.0);
                }
                debug!(
                    "LambdaField(linear): minvar={:.4e} maxvar={:.4e} a={a:.4e} b={b:.4e}",
                    range.min, range.max
                );
            }
            LambdaLaw::Reciprocal => {
                let alpha = (1.0 - m) / (m * span);
                for (dst, &var) in self.values.iter_mut().zip(variance) {
                    *dst = (1.0 / (1.0 + alpha * (var - range.min))).clamp(m, 1.0);
                }
                debug!(
                    "LambdaField(reciprocal): minvar={:.4e} maxvar={:.4e} alpha={alpha:.4e}",
                    range.min, range.max
                );
            }
        }
    }

    /// Lambda at an in-range pixel.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.values[y * self.w + x]
    }

    /// Lambda at a possibly out-of-range pixel, folded by policy `B`.
    #[inline]
    pub fn get_at<B: BoundaryAccess>(&self, x: isize, y: isize) -> f64 {
        self.values[B::wrap(y, self.h) * self.w + B::wrap(x, self.w)]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Local variance plane from the last [`LambdaField::compute`].
    pub fn variance(&self) -> &ImageF64 {
        &self.variance
    }

    pub fn min_lambda(&self) -> f64 {
        self.min_lambda
    }

    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.w, self.h)
    }
}

/// Local variance over a `(2·window+1)²` box, written into `out`.
fn local_variance<B: BoundaryAccess>(
    img: &ImageF64,
    window: usize,
    out: &mut ImageF64,
) -> VarianceRange {
    let win = window as isize;
    let points = ((2 * window + 1) * (2 * window + 1)) as f64;
    let mut range = VarianceRange {
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
    };
    for y in 0..img.h {
        for x in 0..img.w {
            let (cx, cy) = (x as isize, y as isize);
            let (mut sum, mut sum2) = (0.0, 0.0);
            for l in -win..=win {
                for k in -win..=win {
                    let c = img.get_at::<B>(cx + k, cy + l);
                    sum += c;
                    sum2 += c * c;
                }
            }
            let mean = sum / points;
            let var = (sum2 / points - mean * mean).max(0.0);
            out.set(x, y, var);
            range.min = range.min.min(var);
            range.max = range.max.max(var);
        }
    }
    range
}
