//! Discrete Hopfield relaxation of one colour channel.
//!
//! Every pixel is a neuron holding an 8-bit level. One sweep visits the
//! pixels in row-major order and, for each, evaluates the local field
//!
//! `s = 255 · (Σ w(d)·x(p+d) - λ·z(p) + t(p))`
//!
//! from the weight table, the smoothness stencil `z` and the threshold `t`.
//! With `pom = w(0,0) - λ·c(p)` (the negative quadratic self-coupling, `c`
//! the stencil centre) a move is attempted only when
//! `dE = -2·|s| - pom < 0`. The pixel then takes a uniformly random number
//! of 8-bit steps in `1..=k` towards the sign of `s`, where
//! `k = sign(s) - trunc(s/pom)` is clamped to stay inside `0..=255`. The
//! realized energy change `(-2s - pom·dk)·dk` of every move is summed and
//! returned; it is never positive.
//!
//! Updates are applied in place, so later pixels of a sweep already see
//! the new values of earlier ones.
//!
//! The boundary policy and the presence of a lambda field select one of
//! four monomorphized sweeps.
mod stencil;

use log::debug;
use rand::Rng;

use crate::boundary::{Boundary, BoundaryAccess, Mirror, Periodic};
use crate::error::{RefocusError, Result};
use crate::image::ImageF64;
use crate::kernel::ConvKernel;
use crate::lambda::LambdaField;
use crate::threshold::ThresholdField;
use crate::weights::WeightTable;

use self::stencil::{Regularizer, Uniform, Weighted};

/// The lambda-field stencil is used only above this global strength.
pub const LAMBDA_EPS: f64 = 1e-8;

#[derive(Clone, Debug)]
pub struct HopfieldEngine {
    weights: WeightTable,
    threshold: ThresholdField,
    lambda: f64,
    boundary: Boundary,
    w: usize,
    h: usize,
}

impl HopfieldEngine {
    /// Build the weight table and threshold field for `observed`.
    ///
    /// `lambda` is the global regularization strength and must be finite
    /// and non-negative.
    pub fn new(
        kernel: &ConvKernel,
        observed: &ImageF64,
        lambda: f64,
        boundary: Boundary,
    ) -> Result<Self> {
        if !lambda.is_finite() || lambda < 0.0 {
            return Err(RefocusError::InvalidInput(format!(
                "regularization strength must be finite and non-negative, got {lambda}"
            )));
        }
        let weights = WeightTable::from_kernel(kernel)?;
        let threshold = ThresholdField::new(kernel, observed, boundary)?;
        Ok(Self {
            weights,
            threshold,
            lambda,
            boundary,
            w: observed.w,
            h: observed.h,
        })
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    pub fn threshold(&self) -> &ThresholdField {
        &self.threshold
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    /// Run one full sweep over `image`, updating it in place.
    ///
    /// Returns the accumulated energy change of all accepted moves.
    pub fn iterate<R: Rng + ?Sized>(
        &self,
        image: &mut ImageF64,
        field: Option<&LambdaField<'_>>,
        rng: &mut R,
    ) -> Result<f64> {
        if image.w != self.w || image.h != self.h {
            return Err(RefocusError::InvalidInput(format!(
                "engine built for {}x{} but image is {}x{}",
                self.w, self.h, image.w, image.h
            )));
        }
        if let Some(f) = field {
            if f.dimensions() != (self.w, self.h) {
                let (fw, fh) = f.dimensions();
                return Err(RefocusError::InvalidInput(format!(
                    "lambda field is {fw}x{fh} but image is {}x{}",
                    self.w, self.h
                )));
            }
        }
        if self.w == 0 || self.h == 0 {
            return Ok(0.0);
        }

        let field = field.filter(|_| self.lambda > LAMBDA_EPS);
        let energy = match (self.boundary, field) {
            (Boundary::Mirror, None) => self.sweep::<Mirror, _, _>(image, &Uniform, rng),
            (Boundary::Mirror, Some(f)) => self.sweep::<Mirror, _, _>(image, &Weighted(f), rng),
            (Boundary::Periodic, None) => self.sweep::<Periodic, _, _>(image, &Uniform, rng),
            (Boundary::Periodic, Some(f)) => {
                self.sweep::<Periodic, _, _>(image, &Weighted(f), rng)
            }
        };
        debug!(
            "HopfieldEngine::iterate {:?} lambda_field={} dE={energy:.4e}",
            self.boundary,
            field.is_some()
        );
        Ok(energy)
    }

    fn sweep<B, S, R>(&self, image: &mut ImageF64, stencil: &S, rng: &mut R) -> f64
    where
        B: BoundaryAccess,
        S: Regularizer,
        R: Rng + ?Sized,
    {
        let mut total = 0.0;
        for y in 0..image.h {
            for x in 0..image.w {
                let (s, pom) = self.local_field::<B, S>(image, stencil, x, y);
                if let Some((value, de)) = relax_pixel(image.get(x, y), s, pom, rng) {
                    image.set(x, y, value);
                    total += de;
                }
            }
        }
        total
    }

    /// 8-bit field `s` and gain `pom` of pixel `(x, y)` in the current image.
    #[inline]
    fn local_field<B, S>(&self, image: &ImageF64, stencil: &S, x: usize, y: usize) -> (f64, f64)
    where
        B: BoundaryAccess,
        S: Regularizer,
    {
        let (cx, cy) = (x as isize, y as isize);
        let mut s = 0.0;
        for tap in self.weights.taps() {
            s += tap.weight * image.get_at::<B>(cx + tap.dx, cy + tap.dy);
        }
        let (z, centre) = stencil.apply::<B>(image, cx, cy);
        s -= self.lambda * z;
        s += self.threshold.get(x, y);
        (255.0 * s, self.weights.centre() - self.lambda * centre)
    }
}

/// Hard limiter: `+1` for `s >= 0`, `-1` otherwise.
#[inline]
fn hardlim(s: f64) -> f64 {
    if s >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Decide the move of one neuron with 8-bit field `s` and gain `pom < 0`.
///
/// Returns the new normalized value and the realized energy change, or
/// `None` when the pixel stays put.
#[inline]
pub(crate) fn relax_pixel<R: Rng + ?Sized>(
    value: f64,
    s: f64,
    pom: f64,
    rng: &mut R,
) -> Option<(f64, f64)> {
    let de = -2.0 * s * hardlim(s) - pom;
    if !(de < 0.0) {
        return None;
    }
    let level = (255.0 * value + 0.5) as i64;
    let k = (hardlim(s) as i64).saturating_sub((s / pom) as i64);
    let dk = if k > 0 && level < 255 {
        rng.gen_range(1..=k.min(255 - level))
    } else if k < 0 && level > 0 {
        -rng.gen_range(1..=k.saturating_neg().min(level))
    } else {
        return None;
    };
    let dk_f = dk as f64;
    Some((
        (level + dk) as f64 / 255.0,
        (-2.0 * s - pom * dk_f) * dk_f,
    ))
}
