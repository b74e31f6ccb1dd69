use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::args::OutputFormat;
use crate::args::parsers::parse_duration_value;
use crate::error::ValidationError;

/// On-disk configuration. Every key is optional; CLI and environment win.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub url: Option<String>,
    pub rate: Option<u64>,
    pub duration: Option<u64>,
    #[serde(alias = "max_tasks", alias = "workers")]
    pub concurrency: Option<usize>,
    pub tick_interval: Option<DurationValue>,
    pub timeout: Option<DurationValue>,
    pub connect_timeout: Option<DurationValue>,
    pub output_format: Option<OutputFormat>,
    pub no_progress: Option<bool>,
    pub no_color: Option<bool>,
}

/// A parsed config file and where it was read from.
#[derive(Debug)]
pub struct LoadedConfig {
    pub path: PathBuf,
    pub file: ConfigFile,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(secs) => {
                if *secs == 0 {
                    Err(ValidationError::DurationZero)
                } else {
                    Ok(Duration::from_secs(*secs))
                }
            }
            DurationValue::Text(text) => parse_duration_value(text),
        }
    }
}
