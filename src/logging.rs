//! Diagnostics on the standard error stream

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding the log filter (`EnvFilter` syntax)
pub const LOG_ENV: &str = "AAC_ENC_LOG";

/// Filter used when `AAC_ENC_LOG` is unset or invalid
pub const DEFAULT_FILTER: &str = "warn";

static INIT: Once = Once::new();

/// Install a stderr subscriber for `tracing` events
///
/// Runs once per process. A subscriber already installed by the host is
/// left in place.
pub fn init() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}
