use super::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to parse JSON config '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unsupported config extension '{ext}'. Use .toml or .json.")]
    UnsupportedExtension { ext: String },
    #[error("Config file must have .toml or .json extension.")]
    MissingExtension,
    #[error("Invalid '{field}' duration: {source}")]
    InvalidDuration {
        field: String,
        #[source]
        source: ValidationError,
    },
    #[error("Rate must be >= 1 request per second.")]
    RateZero,
    #[error("Duration must be >= 1 second.")]
    DurationZero,
    #[error("Concurrency must be >= 1.")]
    ConcurrencyZero,
    #[error("Tick interval must be > 0.")]
    TickIntervalZero,
    #[error("Run of {rate} req/s for {duration_secs}s exceeds the request counter range.")]
    TotalOverflow { rate: u64, duration_secs: u64 },
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Unsupported URL scheme '{scheme}'. Use http or https.")]
    UnsupportedScheme { scheme: String },
    #[error("URL '{url}' is missing host.")]
    UrlMissingHost { url: String },
}
