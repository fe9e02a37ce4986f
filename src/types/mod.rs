pub mod pair;
pub mod price;
pub mod timestamp;

pub use pair::{PairRequest, QuoteAsset};
pub use price::Price;
pub use timestamp::{Clock, SystemClock};
