// src/telemetry.rs
// =============================================================================
// Logging setup.
//
// Logs go to stderr through tracing-subscriber so that stdout carries nothing
// but result lines. The level comes from RUST_LOG; by default only warnings
// from this crate are shown, e.g. RUST_LOG=title_sweep=debug prints every
// fetch as it happens.
// =============================================================================

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "title_sweep=warn";

pub fn init_telemetry() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
