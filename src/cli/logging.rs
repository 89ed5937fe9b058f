//! Tracing subscriber initialization

use tracing_subscriber::{fmt, EnvFilter};

use crate::domain::config::DEFAULT_LOG_LEVEL;

/// Filter used when RUST_LOG is unset
pub fn default_directive(verbose: bool, configured: Option<&str>) -> String {
    if verbose {
        return "debug".to_string();
    }
    configured
        .map(str::trim)
        .filter(|level| !level.is_empty())
        .unwrap_or(DEFAULT_LOG_LEVEL)
        .to_string()
}

/// Install the global subscriber. Logs go to stderr; stdout carries
/// command output only.
pub fn init_logging(verbose: bool, configured: Option<&str>) {
    let directive = default_directive(verbose, configured);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&directive))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}
