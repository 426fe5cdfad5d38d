//! Restoration driver.
//!
//! [`Refocuser`] ties the pieces together for one run:
//!
//! 1. Derive the regularization strength and lambda floor from the params
//!    and decide between no, static or adaptive area smoothing.
//! 2. Compose the blur kernel and build one [`HopfieldEngine`] per colour
//!    plane (weight table + threshold field).
//! 3. With smoothing, build one [`LambdaField`] per plane, pre-filtered with
//!    a unit Gaussian. Static fields are computed once up front.
//! 4. Run the outer iterations. Each iteration first recomputes every
//!    adaptive lambda field, then sweeps every plane once.
//!
//! Every per-plane sub-step advances the progress sink and is followed by a
//! poll of the cancel token. A cancelled run keeps the partially restored
//! planes and reports [`Outcome::Cancelled`].
//!
//! All intermediate state is owned by locals of [`Refocuser::restore`], so
//! an error at any stage releases everything built so far.
pub mod params;
pub mod progress;

use std::time::Instant;

use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::diagnostics::{
    KernelSummary, Outcome, Phase, RestoreReport, SweepRecord, TimingBreakdown,
};
use crate::error::{RefocusError, Result};
use crate::hopfield::HopfieldEngine;
use crate::image::{merge_interleaved, split_interleaved, ImageF64, PixelLayout};
use crate::kernel::{blur, ConvKernel};
use crate::lambda::{LambdaField, LambdaLaw};

pub use params::{RefocusParams, Regularization};
pub use progress::{CancelToken, NoProgress, Progress};

use progress::ProgressTracker;

/// Sigma of the pre-filter applied before local variance estimation.
const LAMBDA_FILTER_SIGMA: f64 = 1.0;

/// Per-plane state of a run.
struct ChannelState<'f> {
    engine: HopfieldEngine,
    field: Option<LambdaField<'f>>,
}

#[derive(Clone, Debug, Default)]
pub struct Refocuser {
    params: RefocusParams,
}

impl Refocuser {
    pub fn new(params: RefocusParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &RefocusParams {
        &self.params
    }

    /// Restore every plane in place.
    ///
    /// All planes must share one size. Progress is reported as the fraction
    /// of finished per-plane sub-steps and ends at exactly 1.0 on completion.
    pub fn restore(
        &self,
        planes: &mut [ImageF64],
        progress: &mut dyn Progress,
        cancel: &CancelToken,
    ) -> Result<RestoreReport> {
        let total_start = Instant::now();
        let params = &self.params;
        params.validate()?;
        let (w, h) = check_planes(planes)?;
        let reg = params.regularization();
        let channels = planes.len();

        let mut per_plane = params.iterations;
        if reg.adaptive {
            per_plane = per_plane.saturating_mul(2);
        } else if reg.smooth {
            per_plane = per_plane.saturating_add(1);
        }
        let mut tracker = ProgressTracker::new(per_plane.saturating_mul(channels));
        debug!(
            "Refocuser: {w}x{h}x{channels} lambda={:.4e} lambda_min={:.4e} smooth={} adaptive={} steps={}",
            reg.lambda,
            reg.lambda_min,
            reg.smooth,
            reg.adaptive,
            tracker.total()
        );

        let mut timings = TimingBreakdown::default();

        let stage = Instant::now();
        let kernel = params.blur_model().compose()?;
        let filter = if reg.smooth {
            Some(blur::gaussian(LAMBDA_FILTER_SIGMA)?)
        } else {
            None
        };
        timings.push(Phase::Kernel, ms_since(stage));

        let stage = Instant::now();
        let mut states = build_channels(&kernel, filter.as_ref(), planes, reg, params)?;
        let kernel_summary = summarize(&kernel, &states);
        timings.push(Phase::Setup, ms_since(stage));

        let mut report = RestoreReport {
            outcome: Outcome::Completed,
            width: w,
            height: h,
            channels,
            boundary: params.boundary,
            regularization: reg,
            kernel: kernel_summary,
            sweeps: Vec::new(),
            timings: TimingBreakdown::default(),
        };

        let mut lambda_ms = 0.0;
        if reg.smooth && !reg.adaptive {
            let stage = Instant::now();
            for (state, plane) in states.iter_mut().zip(planes.iter()) {
                if let Some(field) = state.field.as_mut() {
                    field.compute(plane)?;
                }
                tracker.step(progress);
                if cancel.is_cancelled() {
                    report.outcome = Outcome::Cancelled { iterations_done: 0 };
                    break;
                }
            }
            lambda_ms += ms_since(stage);
        }

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut sweep_ms = 0.0;
        if report.outcome.is_completed() {
            'outer: for iteration in 0..params.iterations {
                if reg.adaptive {
                    let stage = Instant::now();
                    for (state, plane) in states.iter_mut().zip(planes.iter()) {
                        if let Some(field) = state.field.as_mut() {
                            field.compute(plane)?;
                        }
                        tracker.step(progress);
                        if cancel.is_cancelled() {
                            report.outcome = Outcome::Cancelled {
                                iterations_done: iteration,
                            };
                            lambda_ms += ms_since(stage);
                            break 'outer;
                        }
                    }
                    lambda_ms += ms_since(stage);
                }

                let stage = Instant::now();
                for (channel, (state, plane)) in states.iter().zip(planes.iter_mut()).enumerate() {
                    let energy = state.engine.iterate(plane, state.field.as_ref(), &mut rng)?;
                    report.sweeps.push(SweepRecord {
                        iteration,
                        channel,
                        energy,
                    });
                    tracker.step(progress);
                    if cancel.is_cancelled() {
                        // The iteration counts as done only if every plane was swept.
                        let done = if channel + 1 == channels {
                            iteration + 1
                        } else {
                            iteration
                        };
                        report.outcome = Outcome::Cancelled {
                            iterations_done: done,
                        };
                        sweep_ms += ms_since(stage);
                        break 'outer;
                    }
                }
                sweep_ms += ms_since(stage);
            }
        }

        if reg.smooth {
            timings.push(Phase::Lambda, lambda_ms);
        }
        timings.push(Phase::Sweeps, sweep_ms);
        timings.total_ms = ms_since(total_start);
        report.timings = timings;

        match report.outcome {
            Outcome::Completed => tracker.finish(progress),
            Outcome::Cancelled { iterations_done } => {
                debug!("Refocuser: cancelled after {iterations_done} iterations")
            }
        }
        debug!(
            "Refocuser: finished in {:.3} ms ({} sweeps)",
            report.timings.total_ms,
            report.sweeps.len()
        );
        Ok(report)
    }

    /// Restore interleaved host pixels (`channels` samples per pixel, values
    /// in `[0, 1]`) in place. Alpha is left untouched.
    pub fn restore_interleaved(
        &self,
        pixels: &mut [f64],
        width: usize,
        height: usize,
        channels: usize,
        progress: &mut dyn Progress,
        cancel: &CancelToken,
    ) -> Result<RestoreReport> {
        let layout = PixelLayout::from_channel_count(channels)?;
        let mut planes = split_interleaved(pixels, width, height, layout)?;
        let report = self.restore(&mut planes, progress, cancel)?;
        merge_interleaved(&planes, pixels, layout)?;
        Ok(report)
    }
}

fn check_planes(planes: &[ImageF64]) -> Result<(usize, usize)> {
    let first = planes
        .first()
        .ok_or_else(|| RefocusError::InvalidInput("no planes to restore".to_string()))?;
    if first.w == 0 || first.h == 0 {
        return Err(RefocusError::InvalidInput(format!(
            "empty image {}x{}",
            first.w, first.h
        )));
    }
    if let Some(other) = planes.iter().find(|p| !p.same_shape(first)) {
        return Err(RefocusError::InvalidInput(format!(
            "planes differ in size: {}x{} vs {}x{}",
            first.w, first.h, other.w, other.h
        )));
    }
    Ok((first.w, first.h))
}

fn build_channels<'f>(
    kernel: &ConvKernel,
    filter: Option<&'f ConvKernel>,
    planes: &[ImageF64],
    reg: Regularization,
    params: &RefocusParams,
) -> Result<Vec<ChannelState<'f>>> {
    let mut states = Vec::new();
    states
        .try_reserve_exact(planes.len())
        .map_err(|_| RefocusError::AllocationFailure {
            what: "channel states",
            elements: planes.len(),
        })?;
    for plane in planes {
        let field = if reg.smooth {
            Some(LambdaField::new(
                plane.w,
                plane.h,
                reg.lambda_min,
                params.window,
                filter,
                params.boundary,
                LambdaLaw::Reciprocal,
            )?)
        } else {
            None
        };
        let engine = HopfieldEngine::new(kernel, plane, reg.lambda, params.boundary)?;
        states.push(ChannelState { engine, field });
    }
    Ok(states)
}

fn summarize(kernel: &ConvKernel, states: &[ChannelState<'_>]) -> KernelSummary {
    let (self_energy, rxnz, rynz) = states
        .first()
        .map(|s| {
            let t = s.engine.weights();
            (t.self_energy(), t.rxnz(), t.rynz())
        })
        .unwrap_or((kernel.self_energy(), 0, 0));
    KernelSummary {
        radius: kernel.radius(),
        nonzero: kernel.nonzero_count(),
        self_energy,
        rxnz,
        rynz,
    }
}

#[inline]
fn ms_since(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
