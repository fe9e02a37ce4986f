use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::Instrument;
use crate::error::AdapterError;
use crate::observability::metrics::{ADAPTER_FAILURES, ADAPTER_FETCH_LATENCY, FAN_OUTS};
use crate::observability::tracing::{trace_adapter_fetch, trace_fan_out};
use crate::price_infra::connectors::SourceAdapter;
use crate::price_infra::symbols::{SymbolMapper, SymbolMapping};
use crate::price_infra::{QuoteRow, SourceFailure};
use crate::types::{PairRequest, Price};

/// Primary symbol plus one retry on an upstream "unknown symbol".
pub const MAX_CANDIDATE_ATTEMPTS: usize = 2;

/// Outcome of one adapter within a fan-out.
#[derive(Clone, Debug)]
pub struct FetchOutcome {
    pub source: String,
    /// Symbol that produced the result (last one tried on failure).
    pub symbol: String,
    /// Time spent holding a permit; queueing is excluded.
    pub elapsed: Duration,
    pub result: Result<Price, AdapterError>,
}

#[derive(Clone, Debug, Default)]
pub struct DispatchReport {
    /// Adapters that had at least one candidate symbol for the pair.
    pub planned: usize,
    pub outcomes: Vec<FetchOutcome>,
}

impl DispatchReport {
    pub fn rows(&self) -> Vec<QuoteRow> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.result {
                Ok(price) => Some(QuoteRow::new(&o.source, &o.symbol, *price)),
                Err(_) => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<SourceFailure> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.result {
                Ok(_) => None,
                Err(e) => Some(SourceFailure {
                    source: o.source.clone(),
                    symbol: Some(o.symbol.clone()),
                    kind: e.kind(),
                    detail: e.to_string(),
                }),
            })
            .collect()
    }
}

/// Runs the adapter set concurrently under a shared concurrency ceiling and
/// a per-adapter wall-clock budget that starts when the adapter gets a
/// permit. Failures are recorded, never raised.
pub struct FetchDispatcher {
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl FetchDispatcher {
    pub fn new(max_concurrency: usize, timeout: Duration) -> Self {
        FetchDispatcher {
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve candidate symbols for every adapter. Adapters that cannot
    /// represent the pair are left out.
    pub fn plan(
        pair: &PairRequest,
        adapters: &[Arc<dyn SourceAdapter>],
    ) -> Vec<(Arc<dyn SourceAdapter>, Vec<String>)> {
        adapters
            .iter()
            .filter_map(|adapter| match SymbolMapper::map(pair, adapter.symbol_rules()) {
                SymbolMapping::Candidates(c) => Some((Arc::clone(adapter), c)),
                SymbolMapping::Unsupported => {
                    tracing::trace!(source = adapter.name(), %pair, "pair not mapped for source");
                    None
                }
            })
            .collect()
    }

    /// Successful rows only, in completion-independent order.
    pub async fn run(&self, pair: &PairRequest, adapters: &[Arc<dyn SourceAdapter>]) -> Vec<QuoteRow> {
        self.dispatch(pair, adapters).await.rows()
    }

    pub async fn dispatch(&self, pair: &PairRequest, adapters: &[Arc<dyn SourceAdapter>]) -> DispatchReport {
        let plan = Self::plan(pair, adapters);
        if plan.is_empty() {
            return DispatchReport::default();
        }

        FAN_OUTS.inc();
        let planned = plan.len();
        let started = Instant::now();

        let outcomes = join_all(plan.into_iter().map(|(adapter, candidates)| {
            let span = trace_adapter_fetch(adapter.name());
            self.fetch_one(adapter, candidates).instrument(span)
        }))
        .instrument(trace_fan_out(pair))
        .await;

        let succeeded = outcomes.iter().filter(|o| o.result.is_ok()).count();
        tracing::debug!(
            %pair,
            planned,
            succeeded,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fan-out complete"
        );

        DispatchReport { planned, outcomes }
    }

    async fn fetch_one(&self, adapter: Arc<dyn SourceAdapter>, candidates: Vec<String>) -> FetchOutcome {
        let primary = candidates.first().cloned().unwrap_or_default();

        // The budget starts once a permit is held, so time spent queued
        // behind slow siblings is never charged to this adapter.
        let (symbol, result, elapsed) = match self.permits.acquire().await {
            Ok(_permit) => {
                let started = Instant::now();
                let (symbol, result) =
                    match tokio::time::timeout(self.timeout, self.attempt(adapter.as_ref(), &candidates)).await {
                        Ok(Ok((symbol, price))) => (symbol, Ok(price)),
                        Ok(Err((symbol, e))) => (symbol, Err(e)),
                        Err(_) => (
                            primary,
                            Err(AdapterError::TimedOut { after_ms: self.timeout.as_millis() as u64 }),
                        ),
                    };
                (symbol, result, started.elapsed())
            }
            Err(_) => (
                primary,
                Err(AdapterError::Unreachable("dispatcher closed".to_string())),
                Duration::ZERO,
            ),
        };

        ADAPTER_FETCH_LATENCY
            .with_label_values(&[adapter.name()])
            .observe(elapsed.as_secs_f64());

        if let Err(e) = &result {
            ADAPTER_FAILURES
                .with_label_values(&[adapter.name(), e.kind().as_str()])
                .inc();
            tracing::warn!(source = adapter.name(), %symbol, error = %e, "Source fetch failed");
        }

        FetchOutcome {
            source: adapter.name().to_string(),
            symbol,
            elapsed,
            result,
        }
    }

    async fn attempt(
        &self,
        adapter: &dyn SourceAdapter,
        candidates: &[String],
    ) -> Result<(String, Price), (String, AdapterError)> {
        let mut last_failure = None;
        for symbol in candidates.iter().take(MAX_CANDIDATE_ATTEMPTS) {
            match adapter.fetch_last_price(symbol).await {
                Ok(price) => return Ok((symbol.clone(), price)),
                Err(AdapterError::UnsupportedSymbol(detail)) => {
                    tracing::debug!(source = adapter.name(), %symbol, %detail, "Symbol rejected upstream, trying next candidate");
                    last_failure = Some((symbol.clone(), AdapterError::UnsupportedSymbol(detail)));
                }
                Err(e) => return Err((symbol.clone(), e)),
            }
        }

        let primary = candidates.first().cloned().unwrap_or_default();
        Err(last_failure.unwrap_or_else(|| (primary, AdapterError::UnsupportedSymbol("no candidate symbols".to_string()))))
    }
}
