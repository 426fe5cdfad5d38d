//! Interconnection weights of the relaxation network.
//!
//! For a blur kernel `k` with self-energy `E = Σ k²` the weight between two
//! pixels at offset `(i, j)` is the negated auto-correlation
//!
//! `w(i, j) = -Σ_{p,q} k(p, q) · k(p + i, q + j)`
//!
//! so the self term is `w(0, 0) = -E`. The full support has radius
//! `2r`; the active box `rxnz × rynz` is trimmed to the coefficients whose
//! magnitude exceeds `TRIM_EPS · |w(0, 0)|`, which bounds the per-pixel cost
//! of a sweep (a horizontal motion streak, for instance, has `rynz == 0`).
use log::debug;

use crate::error::{try_buffer, RefocusError, Result};
use crate::kernel::ConvKernel;

/// Relative magnitude below which outer weights are trimmed.
const TRIM_EPS: f64 = 1e-9;

/// One active weight with its pixel offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tap {
    pub dx: isize,
    pub dy: isize,
    pub weight: f64,
}

#[derive(Clone, Debug)]
pub struct WeightTable {
    radius: usize,
    stride: usize,
    rxnz: usize,
    rynz: usize,
    self_energy: f64,
    w: Vec<f64>,
    taps: Vec<Tap>,
}

impl WeightTable {
    /// Derive the table from a blur kernel.
    pub fn from_kernel(kernel: &ConvKernel) -> Result<Self> {
        let self_energy = kernel.self_energy();
        if !(self_energy > 0.0) || !self_energy.is_finite() {
            return Err(RefocusError::InvalidInput(format!(
                "blur kernel has degenerate self-energy {self_energy}"
            )));
        }
        let radius = 2 * kernel.radius();
        let stride = 2 * radius + 1;
        let len = stride
            .checked_mul(stride)
            .ok_or(RefocusError::AllocationFailure {
                what: "weight table",
                elements: usize::MAX,
            })?;
        let mut w = try_buffer("weight table", len, 0.0)?;

        let r = radius as isize;
        let nz: Vec<(isize, isize, f64)> = kernel.nonzero().collect();
        for &(p, q, a) in &nz {
            for &(s, t, b) in &nz {
                let (i, j) = (s - p, t - q);
                w[((j + r) as usize) * stride + (i + r) as usize] -= a * b;
            }
        }

        let cutoff = TRIM_EPS * w[(r as usize) * stride + r as usize].abs();
        let (mut rxnz, mut rynz) = (0usize, 0usize);
        for j in -r..=r {
            for i in -r..=r {
                if w[((j + r) as usize) * stride + (i + r) as usize].abs() > cutoff {
                    rxnz = rxnz.max(i.unsigned_abs());
                    rynz = rynz.max(j.unsigned_abs());
                }
            }
        }

        let (bx, by) = (rxnz as isize, rynz as isize);
        let mut taps = Vec::new();
        taps.try_reserve_exact((2 * rxnz + 1) * (2 * rynz + 1))
            .map_err(|_| RefocusError::AllocationFailure {
                what: "weight taps",
                elements: (2 * rxnz + 1) * (2 * rynz + 1),
            })?;
        for dy in -by..=by {
            for dx in -bx..=bx {
                let weight = w[((dy + r) as usize) * stride + (dx + r) as usize];
                if weight != 0.0 {
                    taps.push(Tap { dx, dy, weight });
                }
            }
        }

        debug!(
            "WeightTable: kernel radius {} -> support {} trimmed to {}x{} ({} taps), E={self_energy:.6e}",
            kernel.radius(),
            radius,
            rxnz,
            rynz,
            taps.len()
        );

        Ok(Self {
            radius,
            stride,
            rxnz,
            rynz,
            self_energy,
            w,
            taps,
        })
    }

    /// Weight at offset `(i, j)`; zero outside the full support.
    pub fn get(&self, i: isize, j: isize) -> f64 {
        let r = self.radius as isize;
        if i.abs() > r || j.abs() > r {
            return 0.0;
        }
        self.w[((j + r) as usize) * self.stride + (i + r) as usize]
    }

    /// Self term `w(0, 0)`, the fixed per-pixel gain of the data term.
    #[inline]
    pub fn centre(&self) -> f64 {
        self.get(0, 0)
    }

    /// Full (untrimmed) support radius, twice the kernel radius.
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Half-width of the active box along x.
    pub fn rxnz(&self) -> usize {
        self.rxnz
    }

    /// Half-height of the active box along y.
    pub fn rynz(&self) -> usize {
        self.rynz
    }

    /// `Σ k²` of the source kernel, equal to `-w(0, 0)`.
    pub fn self_energy(&self) -> f64 {
        self.self_energy
    }

    /// Non-zero weights inside the active box, row-major.
    #[inline]
    pub fn taps(&self) -> &[Tap] {
        &self.taps
    }
}
