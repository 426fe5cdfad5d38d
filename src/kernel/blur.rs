//! Standard point-spread functions and their composition.
//!
//! - [`disk`]: uniform defocus disk.
//! - [`gaussian`]: sampled isotropic Gaussian.
//! - [`motion_line`]: straight motion streak of given length and angle,
//!   rasterized by bilinear splatting of densely spaced samples so that short
//!   and axis-aligned streaks degenerate to the right discrete footprint.
//!
//! All builders return unit-mass kernels. Extents at or below
//! [`MIN_EXTENT`] yield the identity kernel.
use serde::{Deserialize, Serialize};

use super::ConvKernel;
use crate::error::Result;

/// Radii, sigmas and lengths at or below this value mean "no blur".
pub const MIN_EXTENT: f64 = 1e-6;
/// Gaussian support half-width in multiples of sigma.
pub const GAUSS_SUPPORT: f64 = 3.0;
/// Samples per pixel of streak length used by [`motion_line`].
const MOTION_SAMPLES_PER_PX: f64 = 16.0;
/// Sub-pixel positions closer than this to an integer are snapped onto it.
const SNAP_EPS: f64 = 1e-9;

/// Uniform disk of the given radius (defocus blur).
pub fn disk(radius: f64) -> Result<ConvKernel> {
    if !(radius > MIN_EXTENT) {
        return Ok(ConvKernel::identity());
    }
    let r = radius.floor() as usize;
    let limit = radius * radius + SNAP_EPS;
    let mut k = ConvKernel::new(r)?;
    for j in 0..=r {
        for i in j..=r {
            if (i * i + j * j) as f64 <= limit {
                k.set_circle(i as isize, j as isize, 1.0);
            }
        }
    }
    k.normalize();
    Ok(k)
}

/// Isotropic Gaussian with standard deviation `sigma`, truncated at
/// `ceil(GAUSS_SUPPORT · sigma)`.
pub fn gaussian(sigma: f64) -> Result<ConvKernel> {
    if !(sigma > MIN_EXTENT) {
        return Ok(ConvKernel::identity());
    }
    let r = (GAUSS_SUPPORT * sigma).ceil().max(1.0) as usize;
    let denom = 2.0 * sigma * sigma;
    let mut k = ConvKernel::new(r)?;
    for j in 0..=r {
        for i in j..=r {
            let d2 = (i * i + j * j) as f64;
            k.set_circle(i as isize, j as isize, (-d2 / denom).exp());
        }
    }
    k.normalize();
    Ok(k)
}

/// Straight streak of total `length` pixels centred on the origin.
///
/// `angle_deg` is measured counter-clockwise from the +x axis with y
/// pointing down the image, so 90° is a vertical streak.
pub fn motion_line(length: f64, angle_deg: f64) -> Result<ConvKernel> {
    if !(length > MIN_EXTENT) {
        return Ok(ConvKernel::identity());
    }
    let half = 0.5 * length;
    let r = half.ceil() as usize;
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let (dx, dy) = (snap(cos), snap(-sin));

    let mut k = ConvKernel::new(r)?;
    let n = ((length * MOTION_SAMPLES_PER_PX).ceil() as usize).max(1);
    for s in 0..=n {
        let t = -half + length * s as f64 / n as f64;
        splat(&mut k, snap(t * dx), snap(t * dy));
    }
    k.normalize();
    Ok(k)
}

#[inline]
fn snap(v: f64) -> f64 {
    let rounded = v.round();
    if (v - rounded).abs() < SNAP_EPS {
        rounded
    } else {
        v
    }
}

/// Distribute one unit sample at `(x, y)` over its four integer neighbours.
fn splat(k: &mut ConvKernel, x: f64, y: f64) {
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0, y - y0);
    let (i0, j0) = (x0 as isize, y0 as isize);
    for (di, wx) in [(0, 1.0 - fx), (1, fx)] {
        for (dj, wy) in [(0, 1.0 - fy), (1, fy)] {
            let w = wx * wy;
            if w > 0.0 {
                k.add(i0 + di, j0 + dj, w);
            }
        }
    }
}

/// Degradation model: defocus ⊗ Gaussian ⊗ motion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlurModel {
    /// Defocus disk radius in pixels.
    pub defocus_radius: f64,
    /// Gaussian standard deviation in pixels.
    pub gauss_sigma: f64,
    /// Motion streak length in pixels.
    pub motion_length: f64,
    /// Motion direction in degrees.
    pub motion_angle_deg: f64,
}

impl BlurModel {
    /// Build the composite kernel `normalize(normalize(defocus ⊗ gauss) ⊗ motion)`.
    pub fn compose(&self) -> Result<ConvKernel> {
        let defocus = disk(self.defocus_radius)?;
        let gauss = gaussian(self.gauss_sigma)?;
        let motion = motion_line(self.motion_length, self.motion_angle_deg)?;
        let blur = defocus.convolve(&gauss)?;
        blur.convolve(&motion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_unit_mass(k: &ConvKernel) {
        assert!(
            (k.sum() - 1.0).abs() < 1e-9,
            "kernel mass {} != 1",
            k.sum()
        );
    }

    fn assert_point_symmetric(k: &ConvKernel) {
        let r = k.radius() as isize;
        for j in -r..=r {
            for i in -r..=r {
                assert!(
                    (k.get(i, j) - k.get(-i, -j)).abs() < 1e-12,
                    "asymmetric at ({i}, {j})"
                );
            }
        }
    }

    #[test]
    fn degenerate_extents_give_identity() {
        for k in [
            disk(0.0).unwrap(),
            disk(-3.0).unwrap(),
            gaussian(0.0).unwrap(),
            motion_line(0.0, 45.0).unwrap(),
            BlurModel::default().compose().unwrap(),
        ] {
            assert_eq!(k, ConvKernel::identity());
        }
    }

    #[test]
    fn disk_is_flat_inside_footprint() {
        let k = disk(2.0).unwrap();
        assert_eq!(k.radius(), 2);
        // 13 lattice points satisfy i² + j² <= 4.
        assert_eq!(k.nonzero_count(), 13);
        assert!((k.get(0, 0) - 1.0 / 13.0).abs() < 1e-12);
        assert_eq!(k.get(0, 2), k.get(1, 1));
        assert_eq!(k.get(2, 1), 0.0);
        assert_unit_mass(&k);
    }

    #[test]
    fn sub_pixel_disk_collapses_to_identity_footprint() {
        let k = disk(0.7).unwrap();
        assert_eq!(k.radius(), 0);
        assert_eq!(k.get(0, 0), 1.0);
    }

    #[test]
    fn gaussian_decays_from_centre() {
        let k = gaussian(1.0).unwrap();
        assert_eq!(k.radius(), 3);
        assert!(k.get(0, 0) > k.get(1, 0));
        assert!(k.get(1, 0) > k.get(1, 1));
        assert!(k.get(1, 1) > k.get(3, 3));
        assert_unit_mass(&k);
        assert_point_symmetric(&k);
    }

    #[test]
    fn horizontal_motion_stays_on_the_centre_row() {
        let k = motion_line(4.0, 0.0).unwrap();
        assert_eq!(k.radius(), 2);
        for (i, j, _) in k.nonzero() {
            assert_eq!(j, 0, "coefficient off the streak at ({i}, {j})");
        }
        assert_unit_mass(&k);
        assert_point_symmetric(&k);
    }

    #[test]
    fn vertical_motion_stays_on_the_centre_column() {
        let k = motion_line(3.0, 90.0).unwrap();
        for (i, _, _) in k.nonzero() {
            assert_eq!(i, 0);
        }
        assert_unit_mass(&k);
        assert_point_symmetric(&k);
    }

    #[test]
    fn diagonal_motion_is_point_symmetric() {
        let k = motion_line(5.0, 30.0).unwrap();
        assert_unit_mass(&k);
        assert_point_symmetric(&k);
        assert!(k.get(2, -1) > 0.0, "streak should head up-right at 30°");
    }

    #[test]
    fn composed_model_has_summed_radius() {
        let model = BlurModel {
            defocus_radius: 2.0,
            gauss_sigma: 0.5,
            motion_length: 3.0,
            motion_angle_deg: 45.0,
        };
        let k = model.compose().unwrap();
        let expected = disk(2.0).unwrap().radius()
            + gaussian(0.5).unwrap().radius()
            + motion_line(3.0, 45.0).unwrap().radius();
        assert_eq!(k.radius(), expected);
        assert_unit_mass(&k);
        assert_point_symmetric(&k);
    }
}
