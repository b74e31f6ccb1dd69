use std::collections::BTreeSet;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use url::Url;

use super::dispatcher::{deadline_after, execute_request};
use super::rate::{Schedule, expected_requests};
use super::{Dispatcher, HttpResponse, HttpTransport};
use crate::config::RunConfig;
use crate::error::TransportError;
use crate::metrics::{ProgressSnapshot, RequestOutcome, RunPlan, RunSummary};
use crate::shutdown::shutdown_channel;
use crate::ui::ProgressReporter;

const TEST_URL: &str = "http://127.0.0.1:9/";
const FAST_TICK: Duration = Duration::from_millis(100);

fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

fn run_config(rate: u64, duration_secs: u64, concurrency: usize) -> Result<RunConfig, String> {
    RunConfig::new(TEST_URL, rate, duration_secs, concurrency)
        .and_then(|config| config.with_tick_interval(FAST_TICK))
        .map_err(|err| err.to_string())
}

struct StaticTransport {
    status: u16,
    body: String,
}

impl StaticTransport {
    fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_owned(),
        }
    }
}

#[async_trait]
impl HttpTransport for StaticTransport {
    async fn get(&self, _url: &Url) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status: self.status,
            body: self.body.clone().into_bytes(),
        })
    }
}

struct FailingTransport;

#[async_trait]
impl HttpTransport for FailingTransport {
    async fn get(&self, _url: &Url) -> Result<HttpResponse, TransportError> {
        Err(TransportError::Connect {
            message: "connection refused".to_owned(),
        })
    }
}

/// Fails the first `fail_first` calls, then succeeds.
struct FlakyTransport {
    fail_first: u64,
    calls: AtomicU64,
}

#[async_trait]
impl HttpTransport for FlakyTransport {
    async fn get(&self, _url: &Url) -> Result<HttpResponse, TransportError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_first {
            return Err(TransportError::Timeout {
                message: "request timed out".to_owned(),
            });
        }
        Ok(HttpResponse {
            status: 200,
            body: b"ok".to_vec(),
        })
    }
}

struct PanickingTransport;

#[async_trait]
impl HttpTransport for PanickingTransport {
    async fn get(&self, _url: &Url) -> Result<HttpResponse, TransportError> {
        std::panic::resume_unwind(Box::new("transport exploded"))
    }
}

/// Tracks how many calls overlap.
#[derive(Default)]
struct SlowTransport {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[async_trait]
impl HttpTransport for SlowTransport {
    async fn get(&self, _url: &Url) -> Result<HttpResponse, TransportError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(HttpResponse {
            status: 204,
            body: Vec::new(),
        })
    }
}

/// Keeps every snapshot together with the time since `on_start`.
#[derive(Default)]
struct RecordingReporter {
    started: Mutex<Option<Instant>>,
    plans: Mutex<Vec<RunPlan>>,
    ticks: Mutex<Vec<(Duration, ProgressSnapshot)>>,
    finished: Mutex<Option<RunSummary>>,
}

impl ProgressReporter for RecordingReporter {
    fn on_start(&self, plan: &RunPlan) {
        if let Ok(mut started) = self.started.lock() {
            *started = Some(Instant::now());
        }
        if let Ok(mut plans) = self.plans.lock() {
            plans.push(plan.clone());
        }
    }

    fn on_tick(&self, snapshot: &ProgressSnapshot) {
        let elapsed = self
            .started
            .lock()
            .ok()
            .and_then(|started| started.map(|start| start.elapsed()))
            .unwrap_or_default();
        if let Ok(mut ticks) = self.ticks.lock() {
            ticks.push((elapsed, *snapshot));
        }
    }

    fn on_finish(&self, summary: &RunSummary) {
        if let Ok(mut finished) = self.finished.lock() {
            *finished = Some(*summary);
        }
    }
}

fn check_totals(summary: &RunSummary, success: u64, failure: u64) -> Result<(), String> {
    if summary.success != success || summary.failure != failure {
        return Err(format!(
            "Expected {} success / {} failure, got {:?}",
            success, failure, summary
        ));
    }
    if summary.success.saturating_add(summary.failure) != summary.total {
        return Err(format!("Counts do not add up to total: {:?}", summary));
    }
    Ok(())
}

#[test]
fn expected_requests_floors_and_caps() -> Result<(), String> {
    if expected_requests(Duration::from_millis(999), 10, 100) != 9 {
        return Err("Expected floor of 9.99".to_owned());
    }
    if expected_requests(Duration::from_secs(1), 10, 100) != 10 {
        return Err("Expected 10 after one second".to_owned());
    }
    if expected_requests(Duration::from_secs(60), 10, 100) != 100 {
        return Err("Expected cap at total".to_owned());
    }
    if expected_requests(Duration::ZERO, 10, 100) != 0 {
        return Err("Expected nothing at t=0".to_owned());
    }
    Ok(())
}

#[test]
fn schedule_issues_each_id_once() -> Result<(), String> {
    let mut schedule = Schedule::new(7, 21);
    let mut seen = BTreeSet::new();
    let mut count: u64 = 0;
    for elapsed_ms in [0_u64, 130, 130, 900, 1_450, 2_020, 2_999] {
        for id in schedule.advance_to(Duration::from_millis(elapsed_ms)) {
            seen.insert(id);
            count = count.saturating_add(1);
        }
    }
    // Elapsed going backwards must not re-issue anything.
    if !schedule.advance_to(Duration::from_millis(500)).is_empty() {
        return Err("Expected empty range for earlier elapsed".to_owned());
    }
    for id in schedule.finish() {
        seen.insert(id);
        count = count.saturating_add(1);
    }
    if count != 21 || seen.len() != 21 || seen.iter().next_back() != Some(&20) {
        return Err(format!("Unexpected ids: count {} seen {:?}", count, seen));
    }
    if !schedule.finish().is_empty() {
        return Err("Expected finish to be idempotent".to_owned());
    }
    Ok(())
}

#[test]
fn deadline_after_never_collapses_to_start() -> Result<(), String> {
    let start = tokio::time::Instant::now();
    let one_second = deadline_after(start, Duration::from_secs(1));
    if one_second.saturating_duration_since(start) != Duration::from_secs(1) {
        return Err("Expected exact deadline for a short run".to_owned());
    }
    let huge = deadline_after(start, Duration::MAX);
    if huge.saturating_duration_since(start) < Duration::from_secs(31_536_000) {
        return Err(format!(
            "Overflowing run got a deadline only {:?} away",
            huge.saturating_duration_since(start)
        ));
    }
    Ok(())
}

#[test]
fn execute_request_truncates_body_prefix() -> Result<(), String> {
    run_async_test(async {
        let transport = StaticTransport::new(200, &"x".repeat(120));
        let url = Url::parse(TEST_URL).map_err(|err| err.to_string())?;
        match execute_request(&transport, 3, &url).await {
            RequestOutcome::Success {
                id: 3,
                status: 200,
                body_prefix,
            } if body_prefix.chars().count() == 50 => Ok(()),
            other => Err(format!("Unexpected outcome: {:?}", other)),
        }
    })
}

#[test]
fn execute_request_turns_panic_into_failure() -> Result<(), String> {
    run_async_test(async {
        let url = Url::parse(TEST_URL).map_err(|err| err.to_string())?;
        match execute_request(&PanickingTransport, 8, &url).await {
            RequestOutcome::Failure { id: 8, error } if error.contains("transport exploded") => {
                Ok(())
            }
            other => Err(format!("Unexpected outcome: {:?}", other)),
        }
    })
}

#[test]
fn always_succeeding_transport_hits_exact_total() -> Result<(), String> {
    run_async_test(async {
        let config = run_config(10, 2, 5)?;
        let summary = Dispatcher::new(Arc::new(StaticTransport::new(200, "hello")))
            .run(&config)
            .await;
        if summary.total != 20 || summary.interrupted {
            return Err(format!("Unexpected summary: {:?}", summary));
        }
        check_totals(&summary, 20, 0)
    })
}

#[test]
fn always_failing_transport_counts_failures() -> Result<(), String> {
    run_async_test(async {
        let config = run_config(15, 1, 4)?;
        let summary = Dispatcher::new(Arc::new(FailingTransport)).run(&config).await;
        check_totals(&summary, 0, 15)
    })
}

#[test]
fn first_failures_are_counted_exactly() -> Result<(), String> {
    run_async_test(async {
        let config = run_config(12, 1, 3)?;
        let transport = Arc::new(FlakyTransport {
            fail_first: 5,
            calls: AtomicU64::new(0),
        });
        let summary = Dispatcher::new(Arc::clone(&transport)).run(&config).await;
        if transport.calls.load(Ordering::SeqCst) != 12 {
            return Err("Expected one transport call per request".to_owned());
        }
        check_totals(&summary, 7, 5)
    })
}

#[test]
fn error_statuses_count_as_success() -> Result<(), String> {
    run_async_test(async {
        for status in [404_u16, 500, 503] {
            let config = run_config(5, 1, 5)?;
            let summary = Dispatcher::new(Arc::new(StaticTransport::new(status, "nope")))
                .run(&config)
                .await;
            check_totals(&summary, 5, 0)?;
        }
        Ok(())
    })
}

#[test]
fn panicking_transport_counts_failures() -> Result<(), String> {
    run_async_test(async {
        let config = run_config(6, 1, 2)?;
        let summary = Dispatcher::new(Arc::new(PanickingTransport)).run(&config).await;
        check_totals(&summary, 0, 6)
    })
}

#[test]
fn in_flight_requests_stay_within_concurrency() -> Result<(), String> {
    run_async_test(async {
        let config = run_config(60, 1, 3)?;
        let transport = Arc::new(SlowTransport::default());
        let summary = Dispatcher::new(Arc::clone(&transport)).run(&config).await;
        check_totals(&summary, 60, 0)?;
        let max = transport.max_in_flight.load(Ordering::SeqCst);
        if max == 0 || max > 3 {
            return Err(format!("Unexpected max in flight: {}", max));
        }
        Ok(())
    })
}

#[test]
fn shutdown_interrupts_run_without_losing_requests() -> Result<(), String> {
    run_async_test(async {
        let config = run_config(20, 10, 5)?;
        let (shutdown_tx, shutdown_rx) = shutdown_channel();
        let dispatcher =
            Dispatcher::new(Arc::new(StaticTransport::new(200, "ok"))).with_shutdown(shutdown_rx);
        let counters = dispatcher.counters();

        let trigger = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(450)).await;
            drop(shutdown_tx.send(()));
        });
        let summary = tokio::time::timeout(Duration::from_secs(5), dispatcher.run(&config))
            .await
            .map_err(|err| format!("Run did not stop after shutdown: {}", err))?;
        trigger
            .await
            .map_err(|err| format!("Trigger task failed: {}", err))?;

        if !summary.interrupted {
            return Err("Expected interrupted run".to_owned());
        }
        if summary.total == 0 || summary.total >= 200 {
            return Err(format!("Unexpected interrupted total: {}", summary.total));
        }
        if counters.completed() != summary.total {
            return Err("Counters disagree with summary".to_owned());
        }
        check_totals(&summary, summary.total, 0)
    })
}

#[test]
fn reporter_sees_start_ticks_and_finish() -> Result<(), String> {
    run_async_test(async {
        let config = run_config(10, 1, 10)?;
        let reporter = Arc::new(RecordingReporter::default());
        let summary = Dispatcher::new(Arc::new(StaticTransport::new(200, "ok")))
            .with_reporter(Arc::clone(&reporter) as Arc<dyn ProgressReporter>)
            .run(&config)
            .await;

        let plans = reporter.plans.lock().map_err(|err| err.to_string())?;
        match plans.as_slice() {
            [plan] if plan.total_requests == 10 && plan.total_ticks == 10 => {}
            other => return Err(format!("Unexpected plans: {:?}", other)),
        }

        let ticks = reporter.ticks.lock().map_err(|err| err.to_string())?;
        let mut previous: u64 = 0;
        for (_, snapshot) in ticks.iter() {
            let done = snapshot.success.saturating_add(snapshot.failure);
            if done < previous || done != snapshot.issued {
                return Err(format!("Snapshot out of order: {:?}", snapshot));
            }
            previous = done;
        }
        let (_, last) = ticks
            .last()
            .ok_or_else(|| "Expected at least one snapshot".to_owned())?;
        if last.issued != 10 || last.success != 10 {
            return Err(format!("Unexpected final snapshot: {:?}", last));
        }

        let finished = reporter.finished.lock().map_err(|err| err.to_string())?;
        if *finished != Some(summary) {
            return Err(format!("Unexpected finish summary: {:?}", *finished));
        }
        Ok(())
    })
}

#[test]
fn issued_requests_track_wall_clock() -> Result<(), String> {
    run_async_test(async {
        let config = run_config(10, 1, 10)?;
        let reporter = Arc::new(RecordingReporter::default());
        let summary = Dispatcher::new(Arc::new(StaticTransport::new(200, "ok")))
            .with_reporter(Arc::clone(&reporter) as Arc<dyn ProgressReporter>)
            .run(&config)
            .await;

        if summary.elapsed < config.duration() {
            return Err(format!("Run ended early: {:?}", summary.elapsed));
        }

        let ticks = reporter.ticks.lock().map_err(|err| err.to_string())?;
        let mut previous: u64 = 0;
        let mut partial_ticks: usize = 0;
        for (elapsed, snapshot) in ticks.iter() {
            if snapshot.issued < previous {
                return Err(format!("Issued went backwards: {:?}", snapshot));
            }
            // The reporter clock starts before the dispatcher clock, so this
            // bound can only be looser than the one the schedule applies.
            let allowed = expected_requests(*elapsed, config.rate(), config.total_requests());
            if snapshot.issued > allowed {
                return Err(format!(
                    "Issued {} after {:?}, ahead of the {} allowed",
                    snapshot.issued, elapsed, allowed
                ));
            }
            if snapshot.issued > 0 && snapshot.issued < config.total_requests() {
                partial_ticks = partial_ticks.saturating_add(1);
            }
            previous = snapshot.issued;
        }
        if partial_ticks < 3 {
            return Err(format!(
                "Expected requests spread across ticks, saw {} partial ticks",
                partial_ticks
            ));
        }
        Ok(())
    })
}
