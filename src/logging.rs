//! Logging configuration.
//!
//! Logs go to stderr; verbosity follows `RUST_LOG` and defaults to `info`.

use tracing_subscriber::EnvFilter;

/// Initializes logging to stderr.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .with_writer(std::io::stderr)
        .init();
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
