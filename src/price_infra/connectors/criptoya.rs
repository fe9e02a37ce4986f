use crate::price_infra::connectors::SourceConfig;
use crate::price_infra::symbols::SymbolRules;
use crate::types::QuoteAsset;

/// Argentine venues reachable through CriptoYa.
pub const EXCHANGES: [&str; 6] = ["binancep2p", "belo", "ripio", "lemoncash", "satoshitango", "tiendacrypto"];

/// Venues disagree on the field name, so these are tried in order.
const PRICE_FIELDS: [&str; 5] = ["last", "precio", "price", "venta", "ask"];

pub fn config(exchange: &str) -> SourceConfig {
    let endpoint = format!("https://criptoya.com/api/{}/{{symbol}}", exchange);
    let symbols = SymbolRules::new("{base_lower}/{quote_lower}").with_quotes(&[QuoteAsset::Ars]);

    SourceConfig::new(&format!("criptoya-{}", exchange), &endpoint, &PRICE_FIELDS, symbols)
}

pub fn configs() -> Vec<SourceConfig> {
    EXCHANGES.iter().map(|ex| config(ex)).collect()
}
