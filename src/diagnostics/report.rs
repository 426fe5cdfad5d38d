use serde::Serialize;

use crate::boundary::Boundary;
use crate::diagnostics::TimingBreakdown;
use crate::restore::Regularization;

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Outcome {
    Completed,
    /// Stopped by the cancel token; the planes hold the partial result.
    #[serde(rename_all = "camelCase")]
    Cancelled { iterations_done: usize },
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed)
    }
}

/// Shape of the composite blur kernel and of the derived weight table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KernelSummary {
    pub radius: usize,
    pub nonzero: usize,
    pub self_energy: f64,
    /// Trimmed half-extent of the weight table along x.
    pub rxnz: usize,
    /// Trimmed half-extent of the weight table along y.
    pub rynz: usize,
}

/// Energy change of one sweep over one channel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepRecord {
    /// Zero-based outer iteration.
    pub iteration: usize,
    pub channel: usize,
    pub energy: f64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreReport {
    pub outcome: Outcome,
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub boundary: Boundary,
    pub regularization: Regularization,
    pub kernel: KernelSummary,
    pub sweeps: Vec<SweepRecord>,
    pub timings: TimingBreakdown,
}

impl RestoreReport {
    /// Sum of all sweep energies of one channel.
    pub fn channel_energy(&self, channel: usize) -> f64 {
        self.sweeps
            .iter()
            .filter(|s| s.channel == channel)
            .map(|s| s.energy)
            .sum()
    }

    /// Number of fully completed outer iterations.
    pub fn iterations_done(&self) -> usize {
        match self.outcome {
            Outcome::Cancelled { iterations_done } => iterations_done,
            Outcome::Completed => {
                if self.channels == 0 {
                    0
                } else {
                    self.sweeps.len() / self.channels
                }
            }
        }
    }
}
