use crate::config::*;
use crate::error::{Error, Result};
use crate::price_infra::connectors::{default_registry, SourceConfig};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    /// Adapter registry. Empty means the built-in presets.
    pub sources: Vec<SourceConfig>,
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("QUOTEINFRA")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        Self::finish(config)
    }

    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        Self::finish(config)
    }

    fn finish(config: Config) -> Result<Self> {
        let mut app: AppConfig = config
            .try_deserialize()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        if app.sources.is_empty() {
            app.sources = default_registry();
        }
        app.validate()?;
        Ok(app)
    }

    pub fn validate(&self) -> Result<()> {
        let engine = &self.engine;
        if engine.cache_ttl_secs == 0 {
            return Err(Error::ConfigError("engine.cache_ttl_secs must be positive".to_string()));
        }
        if engine.adapter_timeout_ms == 0 {
            return Err(Error::ConfigError("engine.adapter_timeout_ms must be positive".to_string()));
        }
        if engine.max_concurrency == 0 {
            return Err(Error::ConfigError("engine.max_concurrency must be positive".to_string()));
        }
        if engine.cache_capacity == 0 {
            return Err(Error::ConfigError("engine.cache_capacity must be positive".to_string()));
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            source.validate()?;
            if !seen.insert(source.name.as_str()) {
                return Err(Error::ConfigError(format!("duplicate source name '{}'", source.name)));
            }
        }
        Ok(())
    }
}
