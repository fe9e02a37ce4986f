use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::error::{Error, Result};
use crate::types::{PairRequest, QuoteAsset};

const BASE_TOKENS: [&str; 2] = ["{base}", "{base_lower}"];
const QUOTE_TOKENS: [&str; 2] = ["{quote}", "{quote_lower}"];

/// Per-source symbol conventions, loaded with the adapter registry.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SymbolRules {
    /// e.g. `{base}{quote}`, `{base}-{quote}`, `{base_lower}/{quote_lower}`
    pub template: String,
    /// Quotes the source lists natively. Empty means any.
    #[serde(default)]
    pub quotes: Vec<QuoteAsset>,
    /// Requested quote -> alternatives to try, in preference order.
    #[serde(default)]
    pub quote_substitutions: HashMap<QuoteAsset, Vec<QuoteAsset>>,
    /// Canonical base -> source code (BTC -> XBT, BTC -> bitcoin).
    #[serde(default)]
    pub base_aliases: HashMap<String, String>,
    /// Bases the source serves. Empty means any.
    #[serde(default)]
    pub bases: Vec<String>,
    /// Base must have an alias (identifier-keyed sources).
    #[serde(default)]
    pub alias_only: bool,
}

impl SymbolRules {
    pub fn new(template: &str) -> Self {
        SymbolRules {
            template: template.to_string(),
            ..Default::default()
        }
    }

    pub fn with_quotes(mut self, quotes: &[QuoteAsset]) -> Self {
        self.quotes = quotes.to_vec();
        self
    }

    pub fn with_substitution(mut self, requested: QuoteAsset, alternatives: &[QuoteAsset]) -> Self {
        self.quote_substitutions.insert(requested, alternatives.to_vec());
        self
    }

    pub fn with_alias(mut self, base: &str, code: &str) -> Self {
        self.base_aliases.insert(base.to_uppercase(), code.to_string());
        self
    }

    pub fn with_bases(mut self, bases: &[&str]) -> Self {
        self.bases = bases.iter().map(|b| b.to_uppercase()).collect();
        self
    }

    pub fn alias_only(mut self) -> Self {
        self.alias_only = true;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let count = |tokens: &[&str]| tokens.iter().map(|t| self.template.matches(t).count()).sum::<usize>();
        if count(&BASE_TOKENS) != 1 || count(&QUOTE_TOKENS) != 1 {
            return Err(Error::ConfigError(format!(
                "symbol template '{}' needs exactly one base and one quote token",
                self.template
            )));
        }
        Ok(())
    }

    fn alias_for(&self, base: &str) -> Option<&str> {
        self.base_aliases
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(base))
            .map(|(_, v)| v.as_str())
    }

    fn lists_quote(&self, quote: QuoteAsset) -> bool {
        self.quotes.is_empty() || self.quotes.contains(&quote)
    }

    fn render(&self, base_code: &str, quote: QuoteAsset) -> String {
        self.template
            .replace("{base_lower}", &base_code.to_lowercase())
            .replace("{base}", base_code)
            .replace("{quote_lower}", &quote.code().to_lowercase())
            .replace("{quote}", quote.code())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SymbolMapping {
    /// Non-empty, most likely symbol first.
    Candidates(Vec<String>),
    Unsupported,
}

impl SymbolMapping {
    pub fn candidates(&self) -> &[String] {
        match self {
            SymbolMapping::Candidates(c) => c,
            SymbolMapping::Unsupported => &[],
        }
    }
}

pub struct SymbolMapper;

impl SymbolMapper {
    pub fn map(pair: &PairRequest, rules: &SymbolRules) -> SymbolMapping {
        let base = pair.base();

        if !rules.bases.is_empty() && !rules.bases.iter().any(|b| b.eq_ignore_ascii_case(base)) {
            return SymbolMapping::Unsupported;
        }

        let base_code = match rules.alias_for(base) {
            Some(code) => code.to_string(),
            None if rules.alias_only => return SymbolMapping::Unsupported,
            None => base.to_string(),
        };

        let requested = pair.quote();
        let mut quotes = Vec::new();
        if rules.lists_quote(requested) {
            quotes.push(requested);
        }
        if let Some(alternatives) = rules.quote_substitutions.get(&requested) {
            for alt in alternatives {
                if rules.lists_quote(*alt) && !quotes.contains(alt) {
                    quotes.push(*alt);
                }
            }
        }

        if quotes.is_empty() {
            return SymbolMapping::Unsupported;
        }

        let mut candidates: Vec<String> = Vec::with_capacity(quotes.len());
        for quote in quotes {
            let symbol = rules.render(&base_code, quote);
            if !candidates.contains(&symbol) {
                candidates.push(symbol);
            }
        }
        SymbolMapping::Candidates(candidates)
    }

    /// Recover the source-native base code and the quote asset from a symbol
    /// rendered with `rules`. Longer quote codes are tried first so `BTCUSDT`
    /// is not read as `BTCUSD` + `T`.
    pub fn split<'a>(symbol: &'a str, rules: &SymbolRules) -> Option<(&'a str, QuoteAsset)> {
        let mut quotes = QuoteAsset::ALL.to_vec();
        quotes.sort_by_key(|q| std::cmp::Reverse(q.code().len()));

        for quote in quotes {
            let pattern = rules
                .template
                .replace("{quote_lower}", &quote.code().to_lowercase())
                .replace("{quote}", quote.code());

            let (token, lower) = if pattern.contains("{base_lower}") {
                ("{base_lower}", true)
            } else {
                ("{base}", false)
            };
            let Some((prefix, suffix)) = pattern.split_once(token) else {
                continue;
            };

            if symbol.len() <= prefix.len() + suffix.len() {
                continue;
            }
            let end = symbol.len() - suffix.len();
            let (Some(head), Some(code), Some(tail)) =
                (symbol.get(..prefix.len()), symbol.get(prefix.len()..end), symbol.get(end..))
            else {
                continue;
            };

            let matches = if lower {
                head == prefix && tail == suffix
            } else {
                head.eq_ignore_ascii_case(prefix) && tail.eq_ignore_ascii_case(suffix)
            };
            if matches {
                return Some((code, quote));
            }
        }
        None
    }

    /// Reverse of [`SymbolMapper::map`]: the canonical pair a source symbol
    /// denotes.
    pub fn unmap(symbol: &str, rules: &SymbolRules) -> Option<PairRequest> {
        let (code, quote) = Self::split(symbol, rules)?;
        let base = rules
            .base_aliases
            .iter()
            .find(|(_, v)| v.eq_ignore_ascii_case(code))
            .map(|(k, _)| k.as_str())
            .unwrap_or(code);
        PairRequest::new(base, quote).ok()
    }

    /// Quote code as the template renders it.
    pub fn quote_code(quote: QuoteAsset, rules: &SymbolRules) -> String {
        if rules.template.contains("{quote_lower}") {
            quote.code().to_lowercase()
        } else {
            quote.code().to_string()
        }
    }
}
