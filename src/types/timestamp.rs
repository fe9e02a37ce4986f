use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Time source for the engine. Cache expiry runs on the monotonic instant,
/// snapshot stamps on wall-clock UTC.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn wall(&self) -> DateTime<Utc>;
}

/// Tokio's clock, so tests driving a paused runtime also move cache expiry.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
