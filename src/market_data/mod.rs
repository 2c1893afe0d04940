pub mod feed;
pub mod parser;

pub use feed::{MarketDataFeed, MarketDataSource};
