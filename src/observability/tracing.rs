use tracing::Span;
use tracing_subscriber::EnvFilter;
use crate::config::LoggingConfig;
use crate::error::{Error, Result};
use crate::types::PairRequest;

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| Error::ConfigError(format!("invalid log level '{}': {}", config.level, e)))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| Error::ConfigError(format!("tracing already initialised: {}", e)))
}

pub fn trace_fan_out(pair: &PairRequest) -> Span {
    tracing::info_span!(
        "fan_out",
        pair = %pair,
    )
}

pub fn trace_adapter_fetch(source: &str) -> Span {
    tracing::debug_span!(
        "adapter_fetch",
        source = source,
    )
}
