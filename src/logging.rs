//! Logging setup.
//!
//! Writes to stdout. `RUST_LOG` overrides the default filter; `--verbose`
//! turns on debug output for this crate.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

pub fn init(verbose: bool) {
    let filter_directive = if verbose {
        "info,intervalTimer=debug"
    } else {
        "info"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directive));

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(filter)
        .init();

    tracing::debug!(verbose, "Logging initialized");
}
