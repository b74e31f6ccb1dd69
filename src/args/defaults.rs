pub(crate) const DEFAULT_USER_AGENT: &str = concat!("pacer/", env!("CARGO_PKG_VERSION"));

/// Target used when neither the CLI nor a config file names one.
pub(crate) const DEFAULT_URL: &str = "http://localhost:8080";
pub(crate) const DEFAULT_RATE: &str = "100";
pub(crate) const DEFAULT_DURATION_SECS: &str = "10";
pub(crate) const DEFAULT_TICK_INTERVAL: &str = "1s";
pub(crate) const DEFAULT_REQUEST_TIMEOUT: &str = "10s";
pub(crate) const DEFAULT_CONNECT_TIMEOUT: &str = "5s";

/// Config files picked up from the working directory when `--config` is absent.
pub(crate) const DEFAULT_CONFIG_FILES: [&str; 2] = ["pacer.toml", "pacer.json"];
