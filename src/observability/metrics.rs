use lazy_static::lazy_static;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Engine metrics
    pub static ref FAN_OUTS: IntCounter = IntCounter::new(
        "quote_fan_outs_total",
        "Upstream fan-outs started"
    ).unwrap();

    pub static ref CACHE_HITS: IntCounter = IntCounter::new(
        "quote_cache_hits_total",
        "Snapshot requests served from a fresh cache entry"
    ).unwrap();

    pub static ref CACHE_MISSES: IntCounter = IntCounter::new(
        "quote_cache_misses_total",
        "Snapshot requests that needed a refresh"
    ).unwrap();

    pub static ref COALESCED_REQUESTS: IntCounter = IntCounter::new(
        "quote_coalesced_requests_total",
        "Requests that joined an in-flight refresh"
    ).unwrap();

    pub static ref STALE_SERVED: IntCounter = IntCounter::new(
        "quote_stale_served_total",
        "Last-known snapshots served after a failed refresh"
    ).unwrap();

    // Adapter metrics
    pub static ref ADAPTER_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("adapter_failures_total", "Failed adapter fetches"),
        &["source", "kind"]
    ).unwrap();

    pub static ref ADAPTER_FETCH_LATENCY: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "adapter_fetch_latency_seconds",
            "Adapter fetch latency including retries"
        ).buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 4.0, 8.0]),
        &["source"]
    ).unwrap();
}

pub fn register_metrics() -> prometheus::Result<()> {
    REGISTRY.register(Box::new(FAN_OUTS.clone()))?;
    REGISTRY.register(Box::new(CACHE_HITS.clone()))?;
    REGISTRY.register(Box::new(CACHE_MISSES.clone()))?;
    REGISTRY.register(Box::new(COALESCED_REQUESTS.clone()))?;
    REGISTRY.register(Box::new(STALE_SERVED.clone()))?;
    REGISTRY.register(Box::new(ADAPTER_FAILURES.clone()))?;
    REGISTRY.register(Box::new(ADAPTER_FETCH_LATENCY.clone()))?;
    Ok(())
}

/// Text exposition of everything in [`REGISTRY`].
pub fn render() -> String {
    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8(buffer).unwrap_or_default()
}
