pub mod binance;
pub mod bybit;
pub mod coinbase;
pub mod coingecko;
pub mod criptoya;
pub mod dolarapi;
pub mod kraken;
pub mod okx;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use crate::error::{AdapterError, Error, Result};
use crate::price_infra::normalize::{extract_price, FieldPath};
use crate::price_infra::symbols::{SymbolMapper, SymbolRules};
use crate::types::Price;

/// Uniform capability over one upstream price source.
///
/// Implementations are immutable once registered and must not retry
/// internally; one call to `fetch_last_price` is one upstream request.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn name(&self) -> &str;
    fn symbol_rules(&self) -> &SymbolRules;
    async fn fetch_last_price(&self, symbol: &str) -> std::result::Result<Price, AdapterError>;
}

/// Registry entry: everything needed to talk to one source.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SourceConfig {
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// URL template. `{symbol}` is the mapped source symbol; `{base}` and
    /// `{quote}` are its base code and quote code as the symbol spells them.
    pub endpoint: String,
    /// Field paths tried in order, e.g. `result.list.0.lastPrice`.
    pub price_fields: Vec<String>,
    /// Field that, when truthy, carries an upstream error code.
    #[serde(default)]
    pub error_field: Option<String>,
    /// Error codes that mean "unknown symbol" and may be retried with the
    /// next candidate. Any other truthy code is a rejection.
    #[serde(default)]
    pub unsupported_codes: Vec<String>,
    #[serde(default = "default_unsupported_statuses")]
    pub unsupported_statuses: Vec<u16>,
    pub symbols: SymbolRules,
}

fn default_enabled() -> bool {
    true
}

fn default_unsupported_statuses() -> Vec<u16> {
    vec![400, 404]
}

impl SourceConfig {
    pub fn new(name: &str, endpoint: &str, price_fields: &[&str], symbols: SymbolRules) -> Self {
        SourceConfig {
            name: name.to_string(),
            enabled: true,
            endpoint: endpoint.to_string(),
            price_fields: price_fields.iter().map(|f| f.to_string()).collect(),
            error_field: None,
            unsupported_codes: Vec::new(),
            unsupported_statuses: default_unsupported_statuses(),
            symbols,
        }
    }

    pub fn with_error_field(mut self, field: &str) -> Self {
        self.error_field = Some(field.to_string());
        self
    }

    pub fn with_unsupported_codes(mut self, codes: &[&str]) -> Self {
        self.unsupported_codes = codes.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::ConfigError("source with empty name".to_string()));
        }
        if self.endpoint.trim().is_empty() {
            return Err(Error::ConfigError(format!("source '{}' has no endpoint", self.name)));
        }
        let per_part = self.endpoint.contains("{base}") && self.endpoint.contains("{quote}");
        if !self.endpoint.contains("{symbol}") && !per_part {
            return Err(Error::ConfigError(format!(
                "source '{}' endpoint needs {{symbol}} or both {{base}} and {{quote}}",
                self.name
            )));
        }
        if self.price_fields.is_empty() {
            return Err(Error::ConfigError(format!("source '{}' has no price_fields", self.name)));
        }
        self.symbols.validate()
    }
}

/// Adapter driven entirely by a [`SourceConfig`]: sources differ only in
/// endpoint, symbol rules and where the price sits in the body.
pub struct HttpAdapter {
    name: String,
    endpoint: String,
    price_fields: Vec<FieldPath>,
    error_field: Option<FieldPath>,
    unsupported_codes: Vec<String>,
    unsupported_statuses: Vec<u16>,
    symbols: SymbolRules,
    client: reqwest::Client,
}

impl HttpAdapter {
    pub fn new(config: &SourceConfig, client: reqwest::Client) -> Self {
        HttpAdapter {
            name: config.name.clone(),
            endpoint: config.endpoint.clone(),
            price_fields: config.price_fields.iter().map(|f| FieldPath::parse(f)).collect(),
            error_field: config.error_field.as_deref().map(FieldPath::parse),
            unsupported_codes: config.unsupported_codes.clone(),
            unsupported_statuses: config.unsupported_statuses.clone(),
            symbols: config.symbols.clone(),
            client,
        }
    }

    fn url_for(&self, symbol: &str) -> std::result::Result<String, AdapterError> {
        let url = self.endpoint.replace("{symbol}", symbol);
        if !url.contains("{base}") && !url.contains("{quote}") {
            return Ok(url);
        }
        let (base, quote) = SymbolMapper::split(symbol, &self.symbols)
            .ok_or_else(|| AdapterError::UnsupportedSymbol(format!("{} does not fit the symbol template", symbol)))?;
        Ok(url
            .replace("{base}", base)
            .replace("{quote}", &SymbolMapper::quote_code(quote, &self.symbols)))
    }
}

#[async_trait]
impl SourceAdapter for HttpAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn symbol_rules(&self) -> &SymbolRules {
        &self.symbols
    }

    async fn fetch_last_price(&self, symbol: &str) -> std::result::Result<Price, AdapterError> {
        let url = self.url_for(symbol)?;
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AdapterError::Unreachable(e.to_string()))?;

        let status = response.status();
        if self.unsupported_statuses.contains(&status.as_u16()) {
            return Err(AdapterError::UnsupportedSymbol(format!("{} (HTTP {})", symbol, status.as_u16())));
        }
        if !status.is_success() {
            return Err(AdapterError::HttpStatus { status: status.as_u16() });
        }

        let body = response
            .text()
            .await
            .map_err(|e| AdapterError::Unreachable(format!("failed to read body: {}", e)))?;

        let json: Value = serde_json::from_str(&body)
            .map_err(|e| AdapterError::MalformedResponse(format!("invalid JSON: {}", e)))?;

        if let Some(marker) = self.error_field.as_ref().and_then(|p| p.resolve(&json)) {
            if is_truthy(marker) {
                if matches_code(marker, &self.unsupported_codes) {
                    return Err(AdapterError::UnsupportedSymbol(format!("{} ({})", symbol, marker)));
                }
                let code = marker.as_str().map(str::to_string).unwrap_or_else(|| marker.to_string());
                return Err(AdapterError::Rejected(code));
            }
        }

        extract_price(&json, &self.price_fields).map_err(AdapterError::MalformedResponse)
    }
}

/// `0`, `"0"`, `""`, `[]`, `{}`, `false` and `null` all mean "no error".
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Numbers compare by their decimal text; arrays match on any element.
fn matches_code(marker: &Value, codes: &[String]) -> bool {
    match marker {
        Value::Number(n) => codes.iter().any(|c| *c == n.to_string()),
        Value::String(s) => codes.iter().any(|c| c == s),
        Value::Array(items) => items.iter().any(|item| matches_code(item, codes)),
        _ => false,
    }
}

/// Built-in registry used when configuration supplies no sources.
pub fn default_registry() -> Vec<SourceConfig> {
    let mut sources = vec![
        binance::config(),
        bybit::config(),
        okx::config(),
        kraken::config(),
        coinbase::config(),
        coingecko::config(),
    ];
    sources.extend(criptoya::configs());
    sources.extend(dolarapi::configs());
    sources
}

/// Instantiate enabled sources as HTTP adapters sharing one client.
pub fn build_registry(configs: &[SourceConfig], client: reqwest::Client) -> Result<Vec<Arc<dyn SourceAdapter>>> {
    let mut adapters: Vec<Arc<dyn SourceAdapter>> = Vec::new();
    for config in configs.iter().filter(|c| c.enabled) {
        config.validate()?;
        adapters.push(Arc::new(HttpAdapter::new(config, client.clone())));
    }
    tracing::info!("Registered {} price sources", adapters.len());
    Ok(adapters)
}
