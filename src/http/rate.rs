use std::ops::Range;
use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Requests that should have been issued after `elapsed` at `rate` per second,
/// rounded down and capped at `total`.
pub(crate) fn expected_requests(elapsed: Duration, rate: u64, total: u64) -> u64 {
    let scaled = elapsed
        .as_nanos()
        .saturating_mul(u128::from(rate))
        .checked_div(NANOS_PER_SEC)
        .unwrap_or(0);
    u64::try_from(scaled).unwrap_or(u64::MAX).min(total)
}

/// Issued-so-far bookkeeping for the control loop.
///
/// Hands out dispatch ids as contiguous ranges, so every id in `[0, total)` is
/// issued exactly once across all batches.
#[derive(Debug, Clone)]
pub(crate) struct Schedule {
    rate: u64,
    total: u64,
    issued: u64,
}

impl Schedule {
    pub(crate) const fn new(rate: u64, total: u64) -> Self {
        Self {
            rate,
            total,
            issued: 0,
        }
    }

    pub(crate) const fn issued(&self) -> u64 {
        self.issued
    }

    /// Ids to dispatch so the run catches up with wall-clock time.
    pub(crate) fn advance_to(&mut self, elapsed: Duration) -> Range<u64> {
        let expected = expected_requests(elapsed, self.rate, self.total);
        self.take_until(expected)
    }

    /// Ids still owed once the deadline has passed.
    pub(crate) fn finish(&mut self) -> Range<u64> {
        self.take_until(self.total)
    }

    fn take_until(&mut self, expected: u64) -> Range<u64> {
        let start = self.issued;
        let end = expected.max(start);
        self.issued = end;
        start..end
    }
}
