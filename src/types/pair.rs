use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use crate::error::{Error, Result};

const MAX_BASE_LEN: usize = 16;

/// Quote assets a pair may be priced in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuoteAsset {
    Usdt,
    Usdc,
    Usd,
    Dai,
    Ars,
    Eur,
    Brl,
    Btc,
    Eth,
}

impl QuoteAsset {
    pub const ALL: [QuoteAsset; 9] = [
        QuoteAsset::Usdt,
        QuoteAsset::Usdc,
        QuoteAsset::Usd,
        QuoteAsset::Dai,
        QuoteAsset::Ars,
        QuoteAsset::Eur,
        QuoteAsset::Brl,
        QuoteAsset::Btc,
        QuoteAsset::Eth,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            QuoteAsset::Usdt => "USDT",
            QuoteAsset::Usdc => "USDC",
            QuoteAsset::Usd => "USD",
            QuoteAsset::Dai => "DAI",
            QuoteAsset::Ars => "ARS",
            QuoteAsset::Eur => "EUR",
            QuoteAsset::Brl => "BRL",
            QuoteAsset::Btc => "BTC",
            QuoteAsset::Eth => "ETH",
        }
    }
}

impl fmt::Display for QuoteAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for QuoteAsset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_uppercase();
        QuoteAsset::ALL
            .iter()
            .find(|q| q.code() == upper)
            .copied()
            .ok_or_else(|| Error::InvalidPair(format!("unknown quote asset '{}'", s)))
    }
}

// Case-insensitive so config files can spell quotes either way.
impl<'de> Deserialize<'de> for QuoteAsset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A canonical base/quote pair, e.g. BTC priced in USDT. Serialized in its
/// display form, `BTC/USDT`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PairRequest {
    base: String,
    quote: QuoteAsset,
}

impl PairRequest {
    pub fn new(base: &str, quote: QuoteAsset) -> Result<Self> {
        let base = base.trim().to_uppercase();
        if base.is_empty() {
            return Err(Error::InvalidPair("empty base asset".to_string()));
        }
        if base.len() > MAX_BASE_LEN || !base.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::InvalidPair(format!("invalid base asset '{}'", base)));
        }
        Ok(PairRequest { base, quote })
    }

    /// Accepts `BTC/USDT`, `btc-usdt`, `BTC_USDT` and `BTCUSDT`.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if let Some(idx) = trimmed.find(['/', '-', '_']) {
            let (base, rest) = trimmed.split_at(idx);
            let quote: QuoteAsset = rest[1..].parse()?;
            return PairRequest::new(base, quote);
        }

        let upper = trimmed.to_uppercase();
        let mut quotes = QuoteAsset::ALL.to_vec();
        quotes.sort_by_key(|q| std::cmp::Reverse(q.code().len()));
        for quote in quotes {
            if let Some(base) = upper.strip_suffix(quote.code()) {
                if !base.is_empty() {
                    return PairRequest::new(base, quote);
                }
            }
        }

        Err(Error::InvalidPair(format!("cannot split '{}' into base and quote", input)))
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> QuoteAsset {
        self.quote
    }
}

impl fmt::Display for PairRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

impl Serialize for PairRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for PairRequest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PairRequest::parse(s)
    }
}
