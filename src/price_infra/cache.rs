use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use crate::price_infra::Snapshot;
use crate::types::PairRequest;

pub enum CacheLookup {
    Fresh(Arc<Snapshot>),
    /// Expired; only good as a fallback if a refresh finds nothing.
    Stale(Arc<Snapshot>),
    Miss,
}

struct CacheEntry {
    snapshot: Arc<Snapshot>,
    expires_at: Instant,
    last_access: u64,
}

struct CacheState {
    entries: HashMap<PairRequest, CacheEntry>,
    tick: u64,
}

/// Bounded TTL cache of the latest snapshot per pair. Expiry is checked at
/// read time; the least recently used pair is evicted at capacity.
pub struct ResultCache {
    state: Mutex<CacheState>,
    ttl: Duration,
    capacity: usize,
}

impl ResultCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        ResultCache {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                tick: 0,
            }),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, pair: &PairRequest, now: Instant) -> CacheLookup {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.tick += 1;
        let tick = state.tick;

        match state.entries.get_mut(pair) {
            Some(entry) => {
                entry.last_access = tick;
                if now < entry.expires_at {
                    CacheLookup::Fresh(Arc::clone(&entry.snapshot))
                } else {
                    CacheLookup::Stale(Arc::clone(&entry.snapshot))
                }
            }
            None => CacheLookup::Miss,
        }
    }

    /// Replace the entry for `pair` wholesale.
    pub fn put(&self, pair: PairRequest, snapshot: Arc<Snapshot>, now: Instant) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.tick += 1;
        let tick = state.tick;

        if !state.entries.contains_key(&pair) && state.entries.len() >= self.capacity {
            let victim = state
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_access)
                .map(|(k, _)| k.clone());
            if let Some(victim) = victim {
                tracing::debug!(pair = %victim, "Evicting least recently used snapshot");
                state.entries.remove(&victim);
            }
        }

        state.entries.insert(
            pair,
            CacheEntry {
                snapshot,
                expires_at: now + self.ttl,
                last_access: tick,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
