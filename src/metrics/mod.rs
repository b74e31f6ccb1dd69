//! Run counters and the values they are reported through.
mod counters;
mod types;


pub use counters::Counters;
pub use types::{ProgressSnapshot, RequestOutcome, RunPlan, RunSummary};
