mod common;

use common::{registry, Behavior, FakeAdapter};
use futures::future::join_all;
use quote_infra::config::EngineConfig;
use quote_infra::{AdapterError, FailureKind, PairRequest, QuoteEngine, SnapshotStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn config() -> EngineConfig {
    EngineConfig {
        cache_ttl_secs: 5,
        adapter_timeout_ms: 500,
        max_concurrency: 8,
        cache_capacity: 16,
        serve_stale_on_failure: true,
    }
}

fn btc_usdt() -> PairRequest {
    PairRequest::parse("BTC/USDT").unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_partial_failure_scenario() {
    let a = FakeAdapter::new("A", Behavior::Price(50000.12));
    let b = FakeAdapter::new("B", Behavior::Hang);
    let c = FakeAdapter::new("C", Behavior::Malformed);
    let engine = QuoteEngine::new(registry(&[a, b, c]), &config());

    let snapshot = engine.get_snapshot(&btc_usdt()).await;

    assert_eq!(snapshot.status, SnapshotStatus::Ok);
    assert_eq!(snapshot.rows.len(), 1);
    assert_eq!(snapshot.rows[0].source, "A");
    assert_eq!(snapshot.rows[0].last.to_f64(), 50000.12);
    assert_eq!(snapshot.rows[0].deviation_pct, Some(0.0));
    assert_eq!(snapshot.reference_price, Some(50000.12));

    let kinds: Vec<_> = snapshot.failures.iter().map(|f| (f.source.as_str(), f.kind)).collect();
    assert_eq!(kinds, vec![("B", FailureKind::TimedOut), ("C", FailureKind::MalformedResponse)]);
}

#[tokio::test(start_paused = true)]
async fn test_reference_and_ordering() {
    let c = FakeAdapter::new("charlie", Behavior::Delayed(Duration::from_millis(10), 98.0));
    let a = FakeAdapter::new("alpha", Behavior::Delayed(Duration::from_millis(300), 100.0));
    let b = FakeAdapter::new("bravo", Behavior::Price(102.0));
    let engine = QuoteEngine::new(registry(&[c, a, b]), &config());

    let snapshot = engine.get_snapshot(&btc_usdt()).await;

    let sources: Vec<_> = snapshot.rows.iter().map(|r| r.source.as_str()).collect();
    assert_eq!(sources, vec!["alpha", "bravo", "charlie"]);
    assert_eq!(snapshot.reference_price, Some(100.0));
    let devs: Vec<_> = snapshot.rows.iter().map(|r| r.deviation_pct.unwrap()).collect();
    assert_eq!(devs, vec![0.0, 2.0, -2.0]);
    assert!(snapshot.rows.iter().all(|r| r.reference == Some(100.0)));
}

#[tokio::test(start_paused = true)]
async fn test_all_sources_fail_is_not_an_error() {
    let a = FakeAdapter::new("A", Behavior::Fail(AdapterError::Unreachable("connection refused".into())));
    let b = FakeAdapter::new("B", Behavior::Fail(AdapterError::HttpStatus { status: 502 }));
    let engine = QuoteEngine::new(registry(&[a, b]), &config());

    let snapshot = engine.get_snapshot(&btc_usdt()).await;

    assert_eq!(snapshot.status, SnapshotStatus::NoSourcesAvailable);
    assert!(snapshot.rows.is_empty());
    assert_eq!(snapshot.reference_price, None);
    assert_eq!(snapshot.failures.len(), 2);
    assert!(!snapshot.stale);
}

#[tokio::test(start_paused = true)]
async fn test_unsupported_pair_makes_no_calls() {
    let a = FakeAdapter::new("A", Behavior::Price(1.0));
    let b = FakeAdapter::new("B", Behavior::Price(1.0));
    let engine = QuoteEngine::new(registry(&[a.clone(), b.clone()]), &config());

    let exotic = PairRequest::parse("XYZ/EUR").unwrap();
    let snapshot = engine.get_snapshot(&exotic).await;

    assert_eq!(snapshot.status, SnapshotStatus::UnsupportedPair);
    assert!(snapshot.rows.is_empty());
    assert_eq!(snapshot.reference_price, None);
    assert_eq!(a.calls() + b.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_hanging_sources_bound_latency_by_timeout_not_sum() {
    let hanging: Vec<_> = (0..6)
        .map(|i| FakeAdapter::new(&format!("slow{}", i), Behavior::Hang))
        .collect();
    let engine = QuoteEngine::new(registry(&hanging), &config());

    let started = Instant::now();
    let snapshot = engine.get_snapshot(&btc_usdt()).await;
    let elapsed = started.elapsed();

    assert_eq!(snapshot.status, SnapshotStatus::NoSourcesAvailable);
    assert!(elapsed >= Duration::from_millis(500));
    assert!(elapsed < Duration::from_millis(600), "took {:?}", elapsed);
    assert!(snapshot.failures.iter().all(|f| f.kind == FailureKind::TimedOut));
}

#[tokio::test(start_paused = true)]
async fn test_fast_source_survives_hanging_siblings_under_ceiling() {
    let a = FakeAdapter::new("a_hang", Behavior::Hang);
    let b = FakeAdapter::new("b_hang", Behavior::Hang);
    let z = FakeAdapter::new("z_ok", Behavior::Delayed(Duration::from_millis(50), 100.0));
    let mut cfg = config();
    cfg.max_concurrency = 2;
    let engine = QuoteEngine::new(registry(&[a, b, z.clone()]), &cfg);

    let started = Instant::now();
    let snapshot = engine.get_snapshot(&btc_usdt()).await;

    // z_ok queues behind both hangs, then gets its own full budget.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(550) && elapsed < Duration::from_millis(560), "took {:?}", elapsed);
    assert_eq!(snapshot.status, SnapshotStatus::Ok);
    assert_eq!(snapshot.rows.len(), 1);
    assert_eq!(snapshot.rows[0].source, "z_ok");
    assert_eq!(snapshot.reference_price, Some(100.0));
    assert_eq!(z.calls(), 1);

    let kinds: Vec<_> = snapshot.failures.iter().map(|f| (f.source.as_str(), f.kind)).collect();
    assert_eq!(kinds, vec![("a_hang", FailureKind::TimedOut), ("b_hang", FailureKind::TimedOut)]);
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_ceiling_runs_sources_in_waves() {
    let adapters: Vec<_> = (0..5)
        .map(|i| FakeAdapter::new(&format!("s{}", i), Behavior::Delayed(Duration::from_millis(200), 10.0)))
        .collect();
    let mut cfg = config();
    cfg.max_concurrency = 2;
    let engine = QuoteEngine::new(registry(&adapters), &cfg);

    let started = Instant::now();
    let snapshot = engine.get_snapshot(&btc_usdt()).await;

    // Two at a time: 2 + 2 + 1.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(600) && elapsed < Duration::from_millis(610), "took {:?}", elapsed);
    assert_eq!(snapshot.rows.len(), 5);
    assert!(snapshot.failures.is_empty());
    assert!(adapters.iter().all(|a| a.calls() == 1));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_callers_share_one_fan_out() {
    let a = FakeAdapter::new("A", Behavior::Delayed(Duration::from_millis(100), 10.0));
    let b = FakeAdapter::new("B", Behavior::Delayed(Duration::from_millis(50), 12.0));
    let engine = QuoteEngine::new(registry(&[a.clone(), b.clone()]), &config());
    let pair = btc_usdt();

    let snapshots = join_all((0..25).map(|_| engine.get_snapshot(&pair))).await;

    assert_eq!(a.calls(), 1);
    assert_eq!(b.calls(), 1);
    assert!(snapshots.iter().all(|s| Arc::ptr_eq(s, &snapshots[0])));

    // Spawned callers on other tasks coalesce too.
    tokio::time::advance(Duration::from_secs(6)).await;
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let engine = engine.clone();
            let pair = pair.clone();
            tokio::spawn(async move { engine.get_snapshot(&pair).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(a.calls(), 2);
    assert_eq!(b.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cache_ttl_window() {
    let a = FakeAdapter::new("A", Behavior::Price(10.0));
    let engine = QuoteEngine::new(registry(&[a.clone()]), &config());
    let pair = btc_usdt();

    let first = engine.get_snapshot(&pair).await;
    tokio::time::advance(Duration::from_secs(4)).await;
    let second = engine.get_snapshot(&pair).await;
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(a.calls(), 1);

    tokio::time::advance(Duration::from_secs(2)).await;
    let third = engine.get_snapshot(&pair).await;
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(a.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_pairs_are_cached_independently() {
    let a = FakeAdapter::new("A", Behavior::Price(10.0));
    let engine = QuoteEngine::new(registry(&[a.clone()]), &config());

    let pairs = vec![btc_usdt(), PairRequest::parse("ETH/USDT").unwrap(), btc_usdt()];
    let snapshots = engine.get_snapshots(&pairs).await;

    assert_eq!(snapshots.len(), 3);
    assert_eq!(snapshots[0].pair, pairs[0]);
    assert_eq!(snapshots[1].pair, pairs[1]);
    assert!(Arc::ptr_eq(&snapshots[0], &snapshots[2]));
    assert_eq!(a.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stale_snapshot_served_when_refresh_finds_nothing() {
    let a = FakeAdapter::new("A", Behavior::Price(10.0));
    let engine = QuoteEngine::new(registry(&[a.clone()]), &config());
    let pair = btc_usdt();

    let fresh = engine.get_snapshot(&pair).await;
    assert!(!fresh.stale);

    a.set_behavior(Behavior::Fail(AdapterError::HttpStatus { status: 503 }));
    tokio::time::advance(Duration::from_secs(6)).await;
    let served = engine.get_snapshot(&pair).await;

    assert!(served.stale);
    assert_eq!(served.status, SnapshotStatus::Ok);
    assert_eq!(served.rows, fresh.rows);
    assert_eq!(served.failures.len(), 1);
    assert_eq!(served.failures[0].kind, FailureKind::UpstreamHttpError);

    // Stale data is not re-cached: the next request tries upstream again.
    a.set_behavior(Behavior::Price(11.0));
    let recovered = engine.get_snapshot(&pair).await;
    assert!(!recovered.stale);
    assert_eq!(recovered.reference_price, Some(11.0));
    assert_eq!(a.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_stale_serving_can_be_disabled() {
    let a = FakeAdapter::new("A", Behavior::Price(10.0));
    let mut cfg = config();
    cfg.serve_stale_on_failure = false;
    let engine = QuoteEngine::new(registry(&[a.clone()]), &cfg);
    let pair = btc_usdt();

    engine.get_snapshot(&pair).await;
    a.set_behavior(Behavior::Malformed);
    tokio::time::advance(Duration::from_secs(6)).await;
    let snapshot = engine.get_snapshot(&pair).await;

    assert!(!snapshot.stale);
    assert_eq!(snapshot.status, SnapshotStatus::NoSourcesAvailable);
}
