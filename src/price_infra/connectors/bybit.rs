use crate::price_infra::connectors::SourceConfig;
use crate::price_infra::symbols::SymbolRules;
use crate::types::QuoteAsset;

const TICKERS_URL: &str = "https://api.bybit.com/v5/market/tickers?category=linear&symbol={symbol}";

/// Linear perpetual tickers. Bybit answers 200 with a non-zero `retCode`;
/// 10001 is an unknown symbol, anything else (10006 rate limit) is not.
pub fn config() -> SourceConfig {
    let symbols = SymbolRules::new("{base}{quote}")
        .with_quotes(&[QuoteAsset::Usdt, QuoteAsset::Usdc])
        .with_substitution(QuoteAsset::Usd, &[QuoteAsset::Usdt]);

    SourceConfig::new("bybit", TICKERS_URL, &["result.list.0.lastPrice"], symbols)
        .with_error_field("retCode")
        .with_unsupported_codes(&["10001"])
}
