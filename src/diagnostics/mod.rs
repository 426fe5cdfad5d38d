//! Serializable record of a restoration run.
//!
//! [`RestoreReport`] is returned by every successful
//! [`Refocuser::restore`](crate::Refocuser::restore) call, completed or
//! cancelled. It carries the derived regularization decisions, a summary of
//! the blur kernel and weight table, the energy change of every sweep and the
//! phase timings.

pub mod report;
pub mod timing;

pub use report::{KernelSummary, Outcome, RestoreReport, SweepRecord};
pub use timing::{Phase, PhaseTiming, TimingBreakdown};
