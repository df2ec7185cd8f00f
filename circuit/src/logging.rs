//! Diagnostic tracing for level tooling.
//!
//! Tool output (check results, run traces) goes to stdout/stderr directly;
//! this module only wires `tracing` events from the library to stderr.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used by `--verbose`: builder and loader decisions, quiet dependencies.
pub const VERBOSE_FILTER: &str = "warn,circuit=debug,mapcheck=debug";

fn default_filter(verbose: bool) -> &'static str {
    if verbose { VERBOSE_FILTER } else { "warn" }
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbose` picks between
/// [`VERBOSE_FILTER`] and `warn`. Event targets are only shown when verbose,
/// since a rejected level's `warn!` already names its file.
///
/// # Example
/// ```bash
/// RUST_LOG=circuit::core::builder=debug mapcheck check --tileset schema.tsj level.json
/// ```
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .compact(),
        )
        .init();
}
