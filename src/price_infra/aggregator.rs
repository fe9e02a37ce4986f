use chrono::{DateTime, Utc};
use crate::price_infra::{QuoteRow, Snapshot, SnapshotStatus, SourceFailure};
use crate::types::PairRequest;

/// Reduces per-source rows into a snapshot with a mean reference price.
pub struct Aggregator;

impl Aggregator {
    pub fn reduce(
        pair: &PairRequest,
        rows: Vec<QuoteRow>,
        failures: Vec<SourceFailure>,
        as_of: DateTime<Utc>,
    ) -> Snapshot {
        // Step 1: Keep only usable prices (Price already guarantees this;
        // re-checked so a bad row can never skew the mean)
        let mut rows: Vec<QuoteRow> = rows
            .into_iter()
            .filter(|r| r.last.to_f64().is_finite() && r.last.to_f64() > 0.0)
            .collect();

        // Step 2: Deterministic order regardless of completion order
        rows.sort_by(|a, b| a.source.cmp(&b.source).then_with(|| a.symbol.cmp(&b.symbol)));

        // Step 3: Reference price and per-row deviation
        let reference = Self::mean(&rows);
        if let Some(reference) = reference {
            for row in &mut rows {
                row.reference = Some(reference);
                row.deviation_pct = Some(Self::deviation_pct(row.last.to_f64(), reference));
            }
        }

        let status = if rows.is_empty() {
            SnapshotStatus::NoSourcesAvailable
        } else {
            SnapshotStatus::Ok
        };

        let mut failures = failures;
        failures.sort_by(|a, b| a.source.cmp(&b.source));

        Snapshot {
            pair: pair.clone(),
            as_of,
            reference_price: reference,
            rows,
            status,
            failures,
            stale: false,
        }
    }

    /// Snapshot for a pair no registered source can represent.
    pub fn unsupported(pair: &PairRequest, as_of: DateTime<Utc>) -> Snapshot {
        Snapshot {
            pair: pair.clone(),
            as_of,
            reference_price: None,
            rows: Vec::new(),
            status: SnapshotStatus::UnsupportedPair,
            failures: Vec::new(),
            stale: false,
        }
    }

    /// Each term is divided before summing so prices near `f64::MAX` cannot
    /// overflow the total.
    fn mean(rows: &[QuoteRow]) -> Option<f64> {
        if rows.is_empty() {
            return None;
        }
        let n = rows.len() as f64;
        let mean: f64 = rows.iter().map(|r| r.last.to_f64() / n).sum();
        (mean.is_finite() && mean > 0.0).then_some(mean)
    }

    /// `(last - reference) / reference * 100`, rounded to two decimals.
    pub fn deviation_pct(last: f64, reference: f64) -> f64 {
        let raw = (last - reference) / reference * 100.0;
        // + 0.0 folds -0.0 into 0.0
        (raw * 100.0).round() / 100.0 + 0.0
    }
}
