use serde::{Deserialize, Serialize};

pub mod loader;

pub use loader::AppConfig;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub cache_ttl_secs: u64,
    pub adapter_timeout_ms: u64,
    /// Ceiling on simultaneous upstream calls, shared by all pairs.
    pub max_concurrency: usize,
    pub cache_capacity: usize,
    pub serve_stale_on_failure: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            cache_ttl_secs: 5,
            adapter_timeout_ms: 4_000,
            max_concurrency: 8,
            cache_capacity: 256,
            serve_stale_on_failure: true,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` wins when set.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            json: false,
        }
    }
}
