//! Diagnostic logging to stderr
//!
//! Operator output goes through the reporter on stdout; tracing is for
//! debugging. `D0TB00T_LOG` takes a full filter directive, `D0TB00T_DEBUG`
//! (any value) switches the default to debug.

use tracing_subscriber::EnvFilter;

pub fn init() {
    let default = if std::env::var_os("D0TB00T_DEBUG").is_some() {
        "debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_env("D0TB00T_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    // Ignore the error: a subscriber may already be installed in tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
