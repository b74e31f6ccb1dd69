use clap::Parser;
use std::time::Duration;

use super::defaults::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_DURATION_SECS, DEFAULT_RATE, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_TICK_INTERVAL, DEFAULT_URL,
};
use super::parsers::{parse_bool_env, parse_duration_arg};
use super::types::OutputFormat;

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Fixed-rate HTTP load generator - paces GET requests at a steady rate for a fixed duration.",
    next_help_heading = "Advanced Options"
)]
pub struct PacerArgs {
    /// Target URL to send GET requests to
    #[arg(
        long,
        short,
        env = "PACER_URL",
        default_value = DEFAULT_URL,
        help_heading = "Common Options"
    )]
    pub url: String,

    /// Requests per second
    #[arg(
        long,
        short,
        env = "PACER_RATE",
        default_value = DEFAULT_RATE,
        help_heading = "Common Options"
    )]
    pub rate: u64,

    /// Duration of the run (seconds)
    #[arg(
        long = "duration",
        short = 't',
        env = "PACER_DURATION",
        default_value = DEFAULT_DURATION_SECS,
        help_heading = "Common Options"
    )]
    pub duration: u64,

    /// Maximum in-flight requests (defaults to the rate)
    #[arg(long, short, env = "PACER_CONCURRENCY", help_heading = "Common Options")]
    pub concurrency: Option<usize>,

    /// Control loop tick interval (supports ms/s/m/h)
    #[arg(
        long = "tick-interval",
        env = "PACER_TICK_INTERVAL",
        default_value = DEFAULT_TICK_INTERVAL,
        value_parser = parse_duration_arg
    )]
    pub tick_interval: Duration,

    /// Request timeout (supports ms/s/m/h)
    #[arg(
        long = "timeout",
        env = "PACER_TIMEOUT",
        default_value = DEFAULT_REQUEST_TIMEOUT,
        value_parser = parse_duration_arg
    )]
    pub request_timeout: Duration,

    /// Timeout for establishing a new connection (supports ms/s/m/h)
    #[arg(
        long = "connect-timeout",
        env = "PACER_CONNECT_TIMEOUT",
        default_value = DEFAULT_CONNECT_TIMEOUT,
        value_parser = parse_duration_arg
    )]
    pub connect_timeout: Duration,

    /// Path to config file (TOML or JSON)
    #[arg(long, env = "PACER_CONFIG")]
    pub config: Option<String>,

    /// Summary output format
    #[arg(
        long = "output-format",
        env = "PACER_OUTPUT_FORMAT",
        default_value = "text",
        value_enum
    )]
    pub output_format: OutputFormat,

    /// Disable the live progress line (log one line per tick instead)
    #[arg(long = "no-progress", env = "PACER_NO_PROGRESS", value_parser = parse_bool_env)]
    pub no_progress: bool,

    /// Disable color output
    #[arg(long = "no-color", env = "NO_COLOR", value_parser = parse_bool_env)]
    pub no_color: bool,

    /// Enable verbose logging (sets log level to debug unless overridden by PACER_LOG/RUST_LOG)
    #[arg(long, short = 'v', alias = "debug", help_heading = "Common Options")]
    pub verbose: bool,
}
