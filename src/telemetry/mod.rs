//! Telemetry initialization: structured logging

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Log output shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Initialise the logging stack.
///
/// Honors `RUST_LOG` when set; defaults to info-level output for this crate.
pub fn init(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "opshub_access=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => {
            // Flatten event fields so `message` is consistently top-level.
            let fmt_layer = tracing_subscriber::fmt::layer().json().flatten_event(true);
            registry.with(fmt_layer).init();
        }
        LogFormat::Text => {
            let fmt_layer = tracing_subscriber::fmt::layer();
            registry.with(fmt_layer).init();
        }
    }
}
