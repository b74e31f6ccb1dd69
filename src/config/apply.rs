use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::PacerArgs;
use crate::error::ConfigError;

use super::types::{ConfigFile, DurationValue};

/// Applies configuration values to CLI arguments.
///
/// Values supplied on the command line or through the environment are kept.
///
/// # Errors
///
/// Returns an error when a duration value in the config is invalid.
pub fn apply_config(
    args: &mut PacerArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> Result<(), ConfigError> {
    if !is_explicit(matches, "url")
        && let Some(url) = config.url.clone()
    {
        args.url = url;
    }

    if !is_explicit(matches, "rate")
        && let Some(rate) = config.rate
    {
        args.rate = rate;
    }

    if !is_explicit(matches, "duration")
        && let Some(duration) = config.duration
    {
        args.duration = duration;
    }

    if !is_explicit(matches, "concurrency")
        && let Some(concurrency) = config.concurrency
    {
        args.concurrency = Some(concurrency);
    }

    if !is_explicit(matches, "tick_interval")
        && let Some(tick) = config.tick_interval.as_ref()
    {
        args.tick_interval = config_duration(tick, "tick_interval")?;
    }

    if !is_explicit(matches, "request_timeout")
        && let Some(timeout) = config.timeout.as_ref()
    {
        args.request_timeout = config_duration(timeout, "timeout")?;
    }

    if !is_explicit(matches, "connect_timeout")
        && let Some(timeout) = config.connect_timeout.as_ref()
    {
        args.connect_timeout = config_duration(timeout, "connect_timeout")?;
    }

    if !is_explicit(matches, "output_format")
        && let Some(format) = config.output_format
    {
        args.output_format = format;
    }

    if !is_explicit(matches, "no_progress")
        && let Some(no_progress) = config.no_progress
    {
        args.no_progress = no_progress;
    }

    if !is_explicit(matches, "no_color")
        && let Some(no_color) = config.no_color
    {
        args.no_color = no_color;
    }

    Ok(())
}

fn is_explicit(matches: &ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(ValueSource::CommandLine | ValueSource::EnvVariable)
    )
}

fn config_duration(
    value: &DurationValue,
    field: &str,
) -> Result<std::time::Duration, ConfigError> {
    value
        .to_duration()
        .map_err(|err| ConfigError::InvalidDuration {
            field: field.to_owned(),
            source: err,
        })
}
