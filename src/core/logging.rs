// Start of file: /src/core/logging.rs

use tracing_subscriber::{fmt, EnvFilter};
use tracing_subscriber::fmt::format::FmtSpan;

const DEFAULT_FILTER: &str = "recipe_api=info,tower_http=debug,axum=trace";

// Initialize the tracing subscriber. Every event is written straight to stdout.
pub fn init_tracing(ansi: bool) {
    let env_filter: EnvFilter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    fmt()
        .with_env_filter(env_filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(ansi)
        .with_writer(std::io::stdout)
        .init();
}

// End of file: /src/core/logging.rs
