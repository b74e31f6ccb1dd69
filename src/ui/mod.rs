//! Progress reporting and final summary output.
mod progress;
mod summary;


pub use progress::{LogProgress, TerminalProgress};
pub use summary::{banner_line, print_banner, print_summary, summary_json, summary_lines};

use crate::metrics::{ProgressSnapshot, RunPlan, RunSummary};

/// Receives run observations. Purely presentational: nothing a reporter does
/// feeds back into pacing or counting.
pub trait ProgressReporter: Send + Sync {
    fn on_start(&self, _plan: &RunPlan) {}

    fn on_tick(&self, snapshot: &ProgressSnapshot);

    fn on_finish(&self, _summary: &RunSummary) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn on_tick(&self, _snapshot: &ProgressSnapshot) {}
}
