//! Diagnostics for the wrapper itself
//!
//! Events go to stderr so stdout stays the collaborator's. The filter comes
//! from `TSD_S3CMD_LOG`, then the config file's `log` key, then `warn`.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "TSD_S3CMD_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Build the filter from the environment and an optional configured default
pub fn filter(configured: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(configured.unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber; later calls are no-ops
pub fn init(configured: Option<&str>) {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter(configured))
        .with_target(false)
        .without_time()
        .try_init();
}
