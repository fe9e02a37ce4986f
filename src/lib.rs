pub mod api;
pub mod config;
pub mod error;
pub mod observability;
pub mod price_infra;
pub mod types;

pub use error::{AdapterError, Error, FailureKind, Result};
pub use price_infra::engine::QuoteEngine;
pub use price_infra::{QuoteRow, Snapshot, SnapshotStatus, SourceFailure};
pub use types::{PairRequest, Price, QuoteAsset};
