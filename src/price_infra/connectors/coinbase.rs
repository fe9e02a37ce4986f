use crate::price_infra::connectors::SourceConfig;
use crate::price_infra::symbols::SymbolRules;
use crate::types::QuoteAsset;

const SPOT_URL: &str = "https://api.coinbase.com/v2/prices/{symbol}/spot";

/// Coinbase prices against fiat; USDT requests are routed to USD, then USDC.
pub fn config() -> SourceConfig {
    let symbols = SymbolRules::new("{base}-{quote}")
        .with_quotes(&[QuoteAsset::Usd, QuoteAsset::Usdc, QuoteAsset::Eur, QuoteAsset::Ars, QuoteAsset::Brl])
        .with_substitution(QuoteAsset::Usdt, &[QuoteAsset::Usd, QuoteAsset::Usdc]);

    SourceConfig::new("coinbase", SPOT_URL, &["data.amount"], symbols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price_infra::symbols::{SymbolMapper, SymbolMapping};
    use crate::types::PairRequest;

    #[test]
    fn test_coinbase_quote_substitution() {
        let rules = config().symbols;
        let pair = PairRequest::parse("BTC/USDT").unwrap();
        assert_eq!(SymbolMapper::map(&pair, &rules).candidates(), ["BTC-USD", "BTC-USDC"]);

        let pair = PairRequest::parse("BTC/DAI").unwrap();
        assert_eq!(SymbolMapper::map(&pair, &rules), SymbolMapping::Unsupported);
    }
}
