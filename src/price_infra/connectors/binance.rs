use crate::price_infra::connectors::SourceConfig;
use crate::price_infra::symbols::SymbolRules;
use crate::types::QuoteAsset;

const TICKER_URL: &str = "https://api.binance.com/api/v3/ticker/price?symbol={symbol}";

/// Spot ticker. Unknown symbols come back as HTTP 400 `{"code":-1121}`.
pub fn config() -> SourceConfig {
    let symbols = SymbolRules::new("{base}{quote}").with_quotes(&[
        QuoteAsset::Usdt,
        QuoteAsset::Usdc,
        QuoteAsset::Btc,
        QuoteAsset::Eth,
        QuoteAsset::Eur,
        QuoteAsset::Brl,
        QuoteAsset::Ars,
    ]);

    SourceConfig::new("binance", TICKER_URL, &["price"], symbols)
}
