#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod boundary;
pub mod diagnostics;
pub mod error;
pub mod image;
pub mod kernel;
pub mod restore;

// Building blocks of the relaxation network. Public for tools and tests,
// but their signatures may still move.
pub mod config;
pub mod hopfield;
pub mod lambda;
pub mod threshold;
pub mod weights;

// --- High-level re-exports -------------------------------------------------

pub use crate::boundary::Boundary;
pub use crate::diagnostics::{Outcome, RestoreReport};
pub use crate::error::{RefocusError, Result};
pub use crate::image::{ImageF64, PixelLayout};
pub use crate::kernel::{BlurModel, ConvKernel};
pub use crate::restore::{CancelToken, NoProgress, Progress, RefocusParams, Refocuser};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use hopfield_refocus::prelude::*;
///
/// # fn main() -> Result<(), RefocusError> {
/// let (w, h) = (64usize, 48usize);
/// let mut gray = vec![ImageF64::filled(w, h, 0.5)];
///
/// let refocuser = Refocuser::new(RefocusParams {
///     radius: 2.0,
///     iterations: 10,
///     ..Default::default()
/// });
///
/// let report = refocuser.restore(&mut gray, &mut NoProgress, &CancelToken::new())?;
/// println!("outcome={:?} total_ms={:.3}", report.outcome, report.timings.total_ms);
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::ImageF64;
    pub use crate::{
        Boundary, CancelToken, NoProgress, Outcome, RefocusError, RefocusParams, Refocuser,
    };
}
