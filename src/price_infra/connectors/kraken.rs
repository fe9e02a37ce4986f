use crate::price_infra::connectors::SourceConfig;
use crate::price_infra::symbols::SymbolRules;
use crate::types::QuoteAsset;

const TICKER_URL: &str = "https://api.kraken.com/0/public/Ticker?pair={symbol}";

/// Kraken keys the result by its own pair name (`XXBTZUSD`), so the price
/// path goes through a wildcard. `c` is `[last, lot volume]`.
pub fn config() -> SourceConfig {
    let symbols = SymbolRules::new("{base}{quote}")
        .with_quotes(&[QuoteAsset::Usd, QuoteAsset::Usdt, QuoteAsset::Usdc, QuoteAsset::Eur])
        .with_substitution(QuoteAsset::Usdt, &[QuoteAsset::Usd])
        .with_alias("BTC", "XBT")
        .with_alias("DOGE", "XDG");

    SourceConfig::new("kraken", TICKER_URL, &["result.*.c.0"], symbols)
        .with_error_field("error")
        .with_unsupported_codes(&["EQuery:Unknown asset pair"])
}
