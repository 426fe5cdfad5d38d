//! Smoothness stencils of the relaxation energy.
//!
//! Both stencils span the 13-point neighbourhood `|dx| + |dy| <= 2` and sum
//! to zero, so a locally flat image contributes no smoothness pull. Each
//! returns the stencil response `z` together with its centre coefficient,
//! which enters the per-pixel gain.
use crate::boundary::BoundaryAccess;
use crate::image::ImageF64;
use crate::lambda::LambdaField;

pub(crate) trait Regularizer {
    /// `(z, centre)` at pixel `(x, y)`.
    fn apply<B: BoundaryAccess>(&self, img: &ImageF64, x: isize, y: isize) -> (f64, f64);
}

/// Constant-coefficient biharmonic stencil.
///
/// ```text
///           1
///       2  -8   2
///    1 -8  20  -8  1
///       2  -8   2
///           1
/// ```
pub(crate) struct Uniform;

impl Uniform {
    pub(crate) const CENTRE: f64 = 20.0;
}

impl Regularizer for Uniform {
    #[inline]
    fn apply<B: BoundaryAccess>(&self, img: &ImageF64, x: isize, y: isize) -> (f64, f64) {
        let at = |dx: isize, dy: isize| img.get_at::<B>(x + dx, y + dy);
        let mut z = Self::CENTRE * at(0, 0);
        z += at(2, 0) + at(-2, 0) + at(0, 2) + at(0, -2);
        z += 2.0 * (at(1, -1) + at(-1, 1) + at(1, 1) + at(-1, -1));
        z -= 8.0 * (at(1, 0) + at(0, 1) + at(-1, 0) + at(0, -1));
        (z, Self::CENTRE)
    }
}

/// Stencil weighted by the lambda values at the pixel and its 4-neighbours.
///
/// With every lambda equal to one it reduces to [`Uniform`].
pub(crate) struct Weighted<'a, 'f>(pub &'a LambdaField<'f>);

impl Regularizer for Weighted<'_, '_> {
    #[inline]
    fn apply<B: BoundaryAccess>(&self, img: &ImageF64, x: isize, y: isize) -> (f64, f64) {
        let lambda = |dx: isize, dy: isize| self.0.get_at::<B>(x + dx, y + dy);
        let at = |dx: isize, dy: isize| img.get_at::<B>(x + dx, y + dy);

        let l00 = lambda(0, 0);
        let l_e = lambda(1, 0);
        let l_w = lambda(-1, 0);
        let l_s = lambda(0, 1);
        let l_n = lambda(0, -1);

        let centre = l_s + l_e + l_w + l_n + 16.0 * l00;
        let mut z = centre * at(0, 0);
        z += l_e * at(2, 0) + l_w * at(-2, 0);
        z += l_s * at(0, 2) + l_n * at(0, -2);
        z += (l_e + l_n) * at(1, -1);
        z += (l_s + l_w) * at(-1, 1);
        z += (l_e + l_s) * at(1, 1);
        z += (l_n + l_w) * at(-1, -1);
        z -= 4.0 * (l_e + l00) * at(1, 0);
        z -= 4.0 * (l00 + l_w) * at(-1, 0);
        z -= 4.0 * (l_s + l00) * at(0, 1);
        z -= 4.0 * (l00 + l_n) * at(0, -1);
        (z, centre)
    }
}
