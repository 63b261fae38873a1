use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogConfig;

const DEFAULT_FILTER: &str = "info,tool_agents=debug";

/// Initialize structured logging.
///
/// `RUST_LOG` wins over `log.filter`, which wins over the built-in default.
/// `log.format = "json"` switches to one JSON object per line. Calling this
/// twice is harmless; the first subscriber stays installed.
pub fn init(log: &LogConfig) {
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(log.filter.as_deref().unwrap_or(DEFAULT_FILTER))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    });

    let registry = tracing_subscriber::registry().with(filter_layer);

    let result = if log.format.eq_ignore_ascii_case("json") {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "Tracing subscriber already installed");
    }
}
