use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Checked in order; the first one set wins.
const LOG_ENV_VARS: [&str; 2] = ["PACER_LOG", "RUST_LOG"];

/// Installs the global subscriber on stderr, leaving stdout to the banner and
/// the summary.
pub fn init_logging(verbose: bool, no_color: bool) {
    let env_value = LOG_ENV_VARS
        .iter()
        .find_map(|name| std::env::var(name).ok());

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(build_filter(env_value.as_deref(), verbose))
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set global default subscriber: {}", err);
    }
}

/// An unparsable env value falls back to the default directive.
fn build_filter(env_value: Option<&str>, verbose: bool) -> EnvFilter {
    env_value
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive(verbose)))
}

/// `-v` enables the per-request `Request {id}: ...` lines and the per-tick
/// batch sizes. Dependencies stay at warn either way.
const fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "pacer=debug,warn"
    } else {
        "pacer=info,warn"
    }
}
