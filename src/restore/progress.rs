//! Progress reporting and cooperative cancellation.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Receives the completed fraction of a run, in `[0, 1]`.
pub trait Progress {
    fn report(&mut self, fraction: f32);
}

impl<F: FnMut(f32)> Progress for F {
    fn report(&mut self, fraction: f32) {
        self(fraction)
    }
}

/// Discards progress updates.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn report(&mut self, _fraction: f32) {}
}

/// Shared cancellation flag, polled after every per-channel sub-step.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Counts sub-steps and turns them into monotone fractions.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    total: usize,
    done: usize,
    last: f32,
}

impl ProgressTracker {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            total,
            done: 0,
            last: 0.0,
        }
    }

    /// Record one finished sub-step and report `done / total`.
    pub(crate) fn step(&mut self, sink: &mut dyn Progress) {
        self.done = (self.done + 1).min(self.total);
        let fraction = if self.total == 0 {
            1.0
        } else {
            self.done as f32 / self.total as f32
        };
        self.emit(sink, fraction);
    }

    /// Report exactly 1.0 unless it was already reported.
    pub(crate) fn finish(&mut self, sink: &mut dyn Progress) {
        if self.last < 1.0 {
            self.emit(sink, 1.0);
        }
    }

    fn emit(&mut self, sink: &mut dyn Progress, fraction: f32) {
        let fraction = fraction.clamp(self.last, 1.0);
        self.last = fraction;
        sink.report(fraction);
    }

    pub(crate) fn total(&self) -> usize {
        self.total
    }
}
