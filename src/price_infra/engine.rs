use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use std::sync::Arc;
use std::time::Duration;
use crate::config::EngineConfig;
use crate::observability::metrics::{CACHE_HITS, CACHE_MISSES, COALESCED_REQUESTS, STALE_SERVED};
use crate::price_infra::aggregator::Aggregator;
use crate::price_infra::cache::{CacheLookup, ResultCache};
use crate::price_infra::connectors::SourceAdapter;
use crate::price_infra::dispatcher::FetchDispatcher;
use crate::price_infra::Snapshot;
use crate::types::{Clock, PairRequest, SystemClock};

type SharedRefresh = Shared<BoxFuture<'static, Arc<Snapshot>>>;

/// Quote Aggregation Engine.
///
/// `get_snapshot` is the single entry point: cache lookup, then at most one
/// in-flight upstream fan-out per pair, shared by every concurrent caller.
#[derive(Clone)]
pub struct QuoteEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    dispatcher: FetchDispatcher,
    cache: ResultCache,
    clock: Arc<dyn Clock>,
    in_flight: DashMap<PairRequest, SharedRefresh>,
    serve_stale: bool,
}

impl QuoteEngine {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>, config: &EngineConfig) -> Self {
        Self::with_clock(adapters, config, Arc::new(SystemClock))
    }

    pub fn with_clock(adapters: Vec<Arc<dyn SourceAdapter>>, config: &EngineConfig, clock: Arc<dyn Clock>) -> Self {
        QuoteEngine {
            inner: Arc::new(EngineInner {
                adapters,
                dispatcher: FetchDispatcher::new(
                    config.max_concurrency,
                    Duration::from_millis(config.adapter_timeout_ms),
                ),
                cache: ResultCache::new(Duration::from_secs(config.cache_ttl_secs), config.cache_capacity),
                clock,
                in_flight: DashMap::new(),
                serve_stale: config.serve_stale_on_failure,
            }),
        }
    }

    pub fn source_names(&self) -> Vec<String> {
        self.inner.adapters.iter().map(|a| a.name().to_string()).collect()
    }

    pub async fn get_snapshot(&self, pair: &PairRequest) -> Arc<Snapshot> {
        let stale = match self.inner.cache.get(pair, self.inner.clock.now()) {
            CacheLookup::Fresh(snapshot) => {
                CACHE_HITS.inc();
                return snapshot;
            }
            CacheLookup::Stale(snapshot) => Some(snapshot),
            CacheLookup::Miss => None,
        };
        CACHE_MISSES.inc();

        let refresh = match self.inner.in_flight.entry(pair.clone()) {
            Entry::Occupied(entry) => {
                COALESCED_REQUESTS.inc();
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                // A refresh may have landed between the lookup above and
                // taking the entry.
                if let CacheLookup::Fresh(snapshot) = self.inner.cache.get(pair, self.inner.clock.now()) {
                    return snapshot;
                }
                let refresh = self.spawn_refresh(pair.clone(), stale);
                entry.insert(refresh.clone());
                refresh
            }
        };

        refresh.await
    }

    /// Batch lookup; each pair goes through the normal cache path.
    pub async fn get_snapshots(&self, pairs: &[PairRequest]) -> Vec<Arc<Snapshot>> {
        join_all(pairs.iter().map(|p| self.get_snapshot(p))).await
    }

    fn spawn_refresh(&self, pair: PairRequest, stale: Option<Arc<Snapshot>>) -> SharedRefresh {
        let inner = Arc::clone(&self.inner);
        async move {
            let fallback_pair = pair.clone();
            let clock = Arc::clone(&inner.clock);
            match tokio::spawn(EngineInner::refresh(inner, pair, stale)).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    tracing::error!(pair = %fallback_pair, error = %e, "Refresh task failed");
                    Arc::new(Aggregator::reduce(&fallback_pair, Vec::new(), Vec::new(), clock.wall()))
                }
            }
        }
        .boxed()
        .shared()
    }
}

impl EngineInner {
    async fn refresh(self: Arc<Self>, pair: PairRequest, stale: Option<Arc<Snapshot>>) -> Arc<Snapshot> {
        let _guard = InFlightGuard {
            inner: Arc::clone(&self),
            pair: pair.clone(),
        };

        let report = self.dispatcher.dispatch(&pair, &self.adapters).await;
        let as_of = self.clock.wall();

        if report.planned == 0 {
            tracing::info!(%pair, "No source maps this pair");
            return Arc::new(Aggregator::unsupported(&pair, as_of));
        }

        let snapshot = Arc::new(Aggregator::reduce(&pair, report.rows(), report.failures(), as_of));

        if snapshot.is_ok() {
            self.cache.put(pair, Arc::clone(&snapshot), self.clock.now());
            return snapshot;
        }

        match stale {
            Some(previous) if self.serve_stale => {
                STALE_SERVED.inc();
                tracing::warn!(%pair, "All sources failed, serving last known snapshot");
                Arc::new(Snapshot {
                    stale: true,
                    failures: snapshot.failures.clone(),
                    ..(*previous).clone()
                })
            }
            _ => {
                tracing::warn!(%pair, failures = snapshot.failures.len(), "No sources available");
                snapshot
            }
        }
    }
}

/// Clears the in-flight slot once the refresh finishes, including when the
/// task panics. Dropped after the cache write, so a caller that misses the
/// slot always finds the fresh entry.
struct InFlightGuard {
    inner: Arc<EngineInner>,
    pair: PairRequest,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.inner.in_flight.remove(&self.pair);
    }
}
