//! Log setup. Everything goes to stderr through the stderr buffer so log
//! lines never land on top of the TUI.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::stderr_buffer::BufferedStderr;

/// Default filter: warnings only, or debug for this crate with `--verbose`.
/// `RUST_LOG` wins when set.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "warn,cmwmc_calc=debug"
    } else {
        "warn"
    }
}

/// Install the global subscriber. Safe to call once per process.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(|| BufferedStderr)
                .with_ansi(false)
                .with_target(false)
                .without_time(),
        )
        .try_init();
}
