//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive, e.g. `ngextract=debug`.
pub const LOG_ENV: &str = "NGEXTRACT_LOG";

/// Install a stderr subscriber. `verbosity` raises the default level when the filter
/// variable is unset: 0 warns, 1 adds info, 2 and above add debug.
pub fn init(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    // A subscriber may already be installed when embedded in a host or under test.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
