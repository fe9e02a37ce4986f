use crate::price_infra::connectors::SourceConfig;
use crate::price_infra::symbols::SymbolRules;
use crate::types::QuoteAsset;

/// DolarAPI "casas": each is a distinct USD/ARS market.
pub const CASAS: [&str; 5] = ["oficial", "blue", "bolsa", "contadoconliqui", "tarjeta"];

const PRICE_FIELDS: [&str; 4] = ["venta", "compra", "promedio", "valor"];

/// The casa is fixed in the endpoint; the symbol only gates the pair.
pub fn config(casa: &str) -> SourceConfig {
    let endpoint = format!("https://dolarapi.com/v1/dolares/{}", casa);
    let symbols = SymbolRules::new("{base}{quote}")
        .with_quotes(&[QuoteAsset::Ars])
        .with_bases(&["USD"]);

    SourceConfig::new(&format!("dolarapi-{}", casa), &endpoint, &PRICE_FIELDS, symbols)
}

pub fn configs() -> Vec<SourceConfig> {
    CASAS.iter().map(|casa| config(casa)).collect()
}
