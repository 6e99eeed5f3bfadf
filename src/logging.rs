//! Logging setup
//!
//! Cache activity ("Using cache" / "Fetching") is reported through `tracing`.
//! Events go to stderr so they never interleave with piped console output.
//! Configurable via the RUST_LOG environment variable (default `info`).

use std::io;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber
///
/// Returns an error if a subscriber has already been installed.
pub fn init_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
}
