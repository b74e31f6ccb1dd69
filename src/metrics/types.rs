use std::time::Duration;

use serde::Serialize;

/// Characters of the response body kept on a successful outcome.
pub(crate) const BODY_PREFIX_CHARS: usize = 50;

/// Result of one dispatched request.
///
/// Any response that arrived is a success, whatever its status code; only a
/// request that never produced a response is a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    Success {
        id: u64,
        status: u16,
        body_prefix: String,
    },
    Failure {
        id: u64,
        error: String,
    },
}

impl RequestOutcome {
    #[must_use]
    pub fn success(id: u64, status: u16, body: &[u8]) -> Self {
        Self::Success {
            id,
            status,
            body_prefix: body_prefix(body),
        }
    }

    #[must_use]
    pub fn failure(id: u64, error: impl Into<String>) -> Self {
        Self::Failure {
            id,
            error: error.into(),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

fn body_prefix(body: &[u8]) -> String {
    String::from_utf8_lossy(body)
        .chars()
        .take(BODY_PREFIX_CHARS)
        .collect()
}

/// What a run is about to do, announced to reporters before the first tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub url: String,
    pub rate: u64,
    pub duration_secs: u64,
    pub concurrency: usize,
    pub total_requests: u64,
    pub total_ticks: u64,
}

/// Observation emitted after each tick's batch has been awaited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub ticks_done: u64,
    pub total_ticks: u64,
    pub issued: u64,
    pub total_requests: u64,
    pub success: u64,
    pub failure: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: u64,
    pub success: u64,
    pub failure: u64,
    /// The run was stopped by a shutdown signal before its deadline.
    pub interrupted: bool,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

fn serialize_millis<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
    serializer.serialize_u64(millis)
}
