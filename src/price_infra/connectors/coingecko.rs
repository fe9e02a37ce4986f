use crate::price_infra::connectors::SourceConfig;
use crate::price_infra::symbols::SymbolRules;
use crate::types::QuoteAsset;

const SIMPLE_PRICE_URL: &str = "https://api.coingecko.com/api/v3/simple/price?ids={base}&vs_currencies={quote}";

/// CoinGecko ids for the assets it is queried for.
const COIN_IDS: [(&str, &str); 13] = [
    ("BTC", "bitcoin"),
    ("ETH", "ethereum"),
    ("SOL", "solana"),
    ("BNB", "binancecoin"),
    ("ADA", "cardano"),
    ("XRP", "ripple"),
    ("DOGE", "dogecoin"),
    ("MATIC", "matic-network"),
    ("LINK", "chainlink"),
    ("TON", "the-open-network"),
    ("USDT", "tether"),
    ("USDC", "usd-coin"),
    ("DAI", "dai"),
];

/// Symbols read `<id>/<currency>`, e.g. `bitcoin/usd`. The response is
/// `{"<id>": {"<currency>": <price>}}` for the single id and currency asked
/// for, hence the double wildcard.
pub fn config() -> SourceConfig {
    let mut symbols = SymbolRules::new("{base}/{quote_lower}")
        .with_quotes(&[QuoteAsset::Usd, QuoteAsset::Eur, QuoteAsset::Ars, QuoteAsset::Brl, QuoteAsset::Btc, QuoteAsset::Eth])
        .with_substitution(QuoteAsset::Usdt, &[QuoteAsset::Usd])
        .with_substitution(QuoteAsset::Usdc, &[QuoteAsset::Usd])
        .alias_only();
    for (base, id) in COIN_IDS {
        symbols = symbols.with_alias(base, id);
    }

    SourceConfig::new("coingecko", SIMPLE_PRICE_URL, &["*.*"], symbols)
}
