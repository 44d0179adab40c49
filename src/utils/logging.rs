// src/utils/logging.rs
use tracing_subscriber::{fmt, EnvFilter};

/// Default directives when `RUST_LOG` is unset: our own progress at info,
/// HTTP and HTML parser internals only when they warn.
const DEFAULT_FILTER: &str = "apd_extractor=info,reqwest=warn,html5ever=warn";

/// Sets up the tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn setup_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    tracing::debug!("Logging setup complete.");
}
