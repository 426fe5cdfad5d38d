use serde::Serialize;

/// Phases of a restoration run, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Blur kernel composition and lambda pre-filter construction.
    Kernel,
    /// Weight tables, threshold fields and lambda field allocation.
    Setup,
    /// Every lambda field computation, static or adaptive.
    Lambda,
    /// Every relaxation sweep.
    Sweeps,
}

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseTiming {
    pub phase: Phase,
    pub elapsed_ms: f64,
}

/// Wall-clock breakdown of one run.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub total_ms: f64,
    pub phases: Vec<PhaseTiming>,
}

impl TimingBreakdown {
    pub fn push(&mut self, phase: Phase, elapsed_ms: f64) {
        self.phases.push(PhaseTiming { phase, elapsed_ms });
    }

    /// Time spent in `phase`, if it ran.
    pub fn phase_ms(&self, phase: Phase) -> Option<f64> {
        self.phases
            .iter()
            .find(|t| t.phase == phase)
            .map(|t| t.elapsed_ms)
    }
}
