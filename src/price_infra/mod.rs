pub mod aggregator;
pub mod cache;
pub mod connectors;
pub mod dispatcher;
pub mod engine;
pub mod normalize;
pub mod symbols;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::FailureKind;
use crate::types::{PairRequest, Price};

/// One source's contribution to a snapshot.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuoteRow {
    pub source: String,
    /// Source-specific symbol that was actually priced.
    pub symbol: String,
    pub last: Price,
    pub reference: Option<f64>,
    pub deviation_pct: Option<f64>,
}

impl QuoteRow {
    pub fn new(source: impl Into<String>, symbol: impl Into<String>, last: Price) -> Self {
        QuoteRow {
            source: source.into(),
            symbol: symbol.into(),
            last,
            reference: None,
            deviation_pct: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub symbol: Option<String>,
    pub kind: FailureKind,
    pub detail: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotStatus {
    Ok,
    NoSourcesAvailable,
    UnsupportedPair,
}

/// Result of one aggregation cycle for one pair. Never mutated once built.
#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub pair: PairRequest,
    pub as_of: DateTime<Utc>,
    pub reference_price: Option<f64>,
    pub rows: Vec<QuoteRow>,
    pub status: SnapshotStatus,
    pub failures: Vec<SourceFailure>,
    /// Last-known-good data served after a refresh found no sources.
    pub stale: bool,
}

impl Snapshot {
    pub fn is_ok(&self) -> bool {
        self.status == SnapshotStatus::Ok
    }
}
