use crate::price_infra::connectors::SourceConfig;
use crate::price_infra::symbols::SymbolRules;
use crate::types::QuoteAsset;

const TICKER_URL: &str = "https://www.okx.com/api/v5/market/ticker?instId={symbol}";

pub fn config() -> SourceConfig {
    let symbols = SymbolRules::new("{base}-{quote}")
        .with_quotes(&[QuoteAsset::Usdt, QuoteAsset::Usdc, QuoteAsset::Eur, QuoteAsset::Btc])
        .with_substitution(QuoteAsset::Usd, &[QuoteAsset::Usdt, QuoteAsset::Usdc]);

    // `code` is "0" on success; "51001" is an unknown instrument, "50011" a rate limit.
    SourceConfig::new("okx", TICKER_URL, &["data.0.last"], symbols)
        .with_error_field("code")
        .with_unsupported_codes(&["51001"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price_infra::symbols::SymbolMapper;
    use crate::types::PairRequest;

    #[test]
    fn test_okx_usd_falls_back_to_stablecoins() {
        let pair = PairRequest::parse("BTC/USD").unwrap();
        assert_eq!(SymbolMapper::map(&pair, &config().symbols).candidates(), ["BTC-USDT", "BTC-USDC"]);
    }
}
