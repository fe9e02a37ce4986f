#![allow(dead_code)]

use async_trait::async_trait;
use quote_infra::price_infra::connectors::SourceAdapter;
use quote_infra::price_infra::symbols::SymbolRules;
use quote_infra::{AdapterError, Price, QuoteAsset};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub enum Behavior {
    Price(f64),
    /// Answer after a delay (tokio time, so paused tests skip ahead).
    Delayed(Duration, f64),
    Hang,
    Malformed,
    Fail(AdapterError),
}

/// Scripted adapter that counts how often it is called.
pub struct FakeAdapter {
    name: String,
    rules: SymbolRules,
    behavior: std::sync::Mutex<Behavior>,
    calls: AtomicUsize,
}

impl FakeAdapter {
    pub fn new(name: &str, behavior: Behavior) -> Arc<Self> {
        let rules = SymbolRules::new("{base}{quote}")
            .with_quotes(&[QuoteAsset::Usdt, QuoteAsset::Usd, QuoteAsset::Ars]);
        Self::with_rules(name, behavior, rules)
    }

    pub fn with_rules(name: &str, behavior: Behavior, rules: SymbolRules) -> Arc<Self> {
        Arc::new(FakeAdapter {
            name: name.to_string(),
            rules,
            behavior: std::sync::Mutex::new(behavior),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }
}

#[async_trait]
impl SourceAdapter for FakeAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn symbol_rules(&self) -> &SymbolRules {
        &self.rules
    }

    async fn fetch_last_price(&self, _symbol: &str) -> Result<Price, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            Behavior::Price(p) => Ok(Price::new(p).unwrap()),
            Behavior::Delayed(delay, p) => {
                tokio::time::sleep(delay).await;
                Ok(Price::new(p).unwrap())
            }
            Behavior::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            Behavior::Malformed => Err(AdapterError::MalformedResponse("body was \"N/A\"".to_string())),
            Behavior::Fail(e) => Err(e),
        }
    }
}

pub fn registry(adapters: &[Arc<FakeAdapter>]) -> Vec<Arc<dyn SourceAdapter>> {
    adapters.iter().map(|a| a.clone() as Arc<dyn SourceAdapter>).collect()
}
