use std::time::Duration;

use url::Url;

use crate::args::PacerArgs;
use crate::error::ConfigError;

/// Reference tick length for the control loop.
pub(crate) const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Validated, immutable parameters of a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    url: Url,
    rate: u64,
    duration_secs: u64,
    concurrency: usize,
    tick_interval: Duration,
    total_requests: u64,
}

impl RunConfig {
    /// Validates raw run parameters.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the URL is not an absolute http(s) URL with a
    /// host, when rate, duration, or concurrency is zero, or when
    /// `rate * duration` does not fit in a `u64`.
    pub fn new(
        url: &str,
        rate: u64,
        duration_secs: u64,
        concurrency: usize,
    ) -> Result<Self, ConfigError> {
        let url = parse_target_url(url)?;
        if rate == 0 {
            return Err(ConfigError::RateZero);
        }
        if duration_secs == 0 {
            return Err(ConfigError::DurationZero);
        }
        if concurrency == 0 {
            return Err(ConfigError::ConcurrencyZero);
        }
        let total_requests = rate
            .checked_mul(duration_secs)
            .ok_or(ConfigError::TotalOverflow {
                rate,
                duration_secs,
            })?;
        Ok(Self {
            url,
            rate,
            duration_secs,
            concurrency,
            tick_interval: DEFAULT_TICK_INTERVAL,
            total_requests,
        })
    }

    /// Overrides the control loop tick interval.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::TickIntervalZero` for a zero interval.
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Result<Self, ConfigError> {
        if tick_interval.is_zero() {
            return Err(ConfigError::TickIntervalZero);
        }
        self.tick_interval = tick_interval;
        Ok(self)
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub const fn rate(&self) -> u64 {
        self.rate
    }

    #[must_use]
    pub const fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// `rate * duration`, the exact number of requests a completed run issues.
    #[must_use]
    pub const fn total_requests(&self) -> u64 {
        self.total_requests
    }

    /// Number of ticks the control loop is expected to run, rounded up.
    #[must_use]
    pub fn total_ticks(&self) -> u64 {
        let tick_nanos = self.tick_interval.as_nanos().max(1);
        let run_nanos = self.duration().as_nanos();
        let ticks = run_nanos
            .saturating_add(tick_nanos.saturating_sub(1))
            .checked_div(tick_nanos)
            .unwrap_or(0);
        u64::try_from(ticks).unwrap_or(u64::MAX)
    }
}

/// Builds the run configuration from merged CLI/config values.
///
/// An unset concurrency limit falls back to the rate, one worker per request
/// of a one-second tick.
///
/// # Errors
///
/// Returns `ConfigError` when any merged value fails validation.
pub fn build_run_config(args: &PacerArgs) -> Result<RunConfig, ConfigError> {
    let concurrency = args
        .concurrency
        .unwrap_or_else(|| usize::try_from(args.rate).unwrap_or(usize::MAX));
    RunConfig::new(&args.url, args.rate, args.duration, concurrency)?
        .with_tick_interval(args.tick_interval)
}

fn parse_target_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|err| ConfigError::InvalidUrl {
        url: raw.to_owned(),
        source: err,
    })?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ConfigError::UnsupportedScheme {
                scheme: other.to_owned(),
            });
        }
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::UrlMissingHost {
            url: raw.to_owned(),
        });
    }
    Ok(url)
}
