use std::any::Any;
use std::ops::Range;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::{Semaphore, broadcast::error::RecvError};
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::{debug, error, info};
use url::Url;

use crate::config::RunConfig;
use crate::metrics::{Counters, ProgressSnapshot, RequestOutcome, RunPlan, RunSummary};
use crate::shutdown::ShutdownReceiver;
use crate::ui::{NoProgress, ProgressReporter};

use super::rate::Schedule;
use super::transport::HttpTransport;

enum TickWait {
    Tick,
    Shutdown,
}

/// Drives one fixed-rate run.
///
/// Each tick the dispatcher works out how many requests wall-clock time
/// calls for, submits them to a worker pool bounded by the concurrency limit,
/// and awaits the whole batch before the next tick. Once the deadline passes
/// it flushes whatever the schedule still owes, so a completed run always
/// issues exactly `rate * duration` requests.
pub struct Dispatcher<T: ?Sized> {
    transport: Arc<T>,
    reporter: Arc<dyn ProgressReporter>,
    counters: Arc<Counters>,
    shutdown_rx: Option<ShutdownReceiver>,
}

impl<T> Dispatcher<T>
where
    T: HttpTransport + ?Sized + 'static,
{
    #[must_use]
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            reporter: Arc::new(NoProgress),
            counters: Arc::new(Counters::new()),
            shutdown_rx: None,
        }
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Stops the run early, after the current batch, when a shutdown is broadcast.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown_rx: ShutdownReceiver) -> Self {
        self.shutdown_rx = Some(shutdown_rx);
        self
    }

    #[must_use]
    pub fn counters(&self) -> Arc<Counters> {
        Arc::clone(&self.counters)
    }

    pub async fn run(mut self, config: &RunConfig) -> RunSummary {
        let plan = RunPlan {
            url: config.url().to_string(),
            rate: config.rate(),
            duration_secs: config.duration_secs(),
            concurrency: config.concurrency(),
            total_requests: config.total_requests(),
            total_ticks: config.total_ticks(),
        };
        info!(
            "Starting run: {} req/s for {}s against {} (concurrency {})",
            plan.rate, plan.duration_secs, plan.url, plan.concurrency
        );
        self.reporter.on_start(&plan);

        let permits = Arc::new(Semaphore::new(
            config.concurrency().min(Semaphore::MAX_PERMITS),
        ));
        let url = Arc::new(config.url().clone());
        let mut schedule = Schedule::new(config.rate(), config.total_requests());
        let mut ticker = interval(config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let start = Instant::now();
        let deadline = deadline_after(start, config.duration());
        let mut ticks_done: u64 = 0;
        let mut interrupted = false;

        loop {
            if matches!(self.wait_for_tick(&mut ticker).await, TickWait::Shutdown) {
                interrupted = true;
                break;
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }

            let batch = schedule.advance_to(now.saturating_duration_since(start));
            debug!("Tick {}: dispatching {} requests", ticks_done, range_len(&batch));
            self.dispatch_batch(batch, &permits, &url).await;
            ticks_done = ticks_done.saturating_add(1);
            self.report(ticks_done, &plan, schedule.issued());
        }

        if interrupted {
            info!(
                "Shutdown requested; stopping after {} of {} requests",
                schedule.issued(),
                plan.total_requests
            );
        } else {
            let batch = schedule.finish();
            debug!("Final reconciliation: dispatching {} requests", range_len(&batch));
            self.dispatch_batch(batch, &permits, &url).await;
            self.report(ticks_done.max(plan.total_ticks), &plan, schedule.issued());
        }

        let summary = RunSummary {
            total: if interrupted {
                schedule.issued()
            } else {
                plan.total_requests
            },
            success: self.counters.success(),
            failure: self.counters.failure(),
            interrupted,
            elapsed: start.elapsed(),
        };
        info!(
            "Run finished: {} total, {} succeeded, {} failed",
            summary.total, summary.success, summary.failure
        );
        self.reporter.on_finish(&summary);
        summary
    }

    async fn wait_for_tick(&mut self, ticker: &mut tokio::time::Interval) -> TickWait {
        let Some(shutdown_rx) = self.shutdown_rx.as_mut() else {
            ticker.tick().await;
            return TickWait::Tick;
        };
        let received = tokio::select! {
            _ = ticker.tick() => None,
            result = shutdown_rx.recv() => Some(result),
        };
        match received {
            None => TickWait::Tick,
            Some(Ok(()) | Err(RecvError::Lagged(_))) => TickWait::Shutdown,
            Some(Err(RecvError::Closed)) => {
                // Every sender is gone; nothing can ask us to stop any more.
                self.shutdown_rx = None;
                ticker.tick().await;
                TickWait::Tick
            }
        }
    }

    async fn dispatch_batch(&self, ids: Range<u64>, permits: &Arc<Semaphore>, url: &Arc<Url>) {
        if ids.is_empty() {
            return;
        }

        let mut tasks = JoinSet::new();
        for id in ids {
            // Blocks submission while the pool is saturated.
            let permit = match Arc::clone(permits).acquire_owned().await {
                Ok(permit) => permit,
                Err(err) => {
                    error!("Worker pool closed before request {}: {}", id, err);
                    self.counters
                        .record(&RequestOutcome::failure(id, "worker pool closed"));
                    continue;
                }
            };
            let transport = Arc::clone(&self.transport);
            let url = Arc::clone(url);
            tasks.spawn(async move {
                let outcome = execute_request(transport.as_ref(), id, &url).await;
                drop(permit);
                outcome
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => self.counters.record(&outcome),
                Err(err) => {
                    error!("Request task did not complete: {}", err);
                    self.counters.record_failure();
                }
            }
        }
    }

    fn report(&self, ticks_done: u64, plan: &RunPlan, issued: u64) {
        self.reporter.on_tick(&ProgressSnapshot {
            ticks_done,
            total_ticks: plan.total_ticks,
            issued,
            total_requests: plan.total_requests,
            success: self.counters.success(),
            failure: self.counters.failure(),
        });
    }
}

/// Runs one GET and classifies it.
///
/// A panic inside the transport is caught here and becomes a failure, so a
/// faulty request cannot take the control loop down or lose its id.
pub(crate) async fn execute_request<T>(transport: &T, id: u64, url: &Url) -> RequestOutcome
where
    T: HttpTransport + ?Sized,
{
    let outcome = match AssertUnwindSafe(transport.get(url)).catch_unwind().await {
        Ok(Ok(response)) => RequestOutcome::success(id, response.status, &response.body),
        Ok(Err(err)) => RequestOutcome::failure(id, err.to_string()),
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!("Request {} panicked: {}", id, message);
            RequestOutcome::failure(id, format!("request task panicked: {}", message))
        }
    };

    match &outcome {
        RequestOutcome::Success {
            status,
            body_prefix,
            ..
        } => debug!("Request {}: {} - {}", id, status, body_prefix),
        RequestOutcome::Failure { error, .. } => debug!("Request {}: Failed - {}", id, error),
    }
    outcome
}

/// `start + duration`, or the latest representable instant short of it when
/// the sum overflows the clock.
pub(crate) fn deadline_after(start: Instant, duration: Duration) -> Instant {
    let mut span = duration;
    loop {
        if let Some(deadline) = start.checked_add(span) {
            return deadline;
        }
        span = span.checked_div(2).unwrap_or_default();
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        return (*message).to_owned();
    }
    if let Some(message) = panic.downcast_ref::<String>() {
        return message.clone();
    }
    "unknown panic payload".to_owned()
}

fn range_len(range: &Range<u64>) -> u64 {
    range.end.saturating_sub(range.start)
}
