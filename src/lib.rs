//! Maker-only volume generation loop for an exchange spot API.
//!
//! Each iteration samples the mid price, places a post-only buy just below it and a
//! post-only sell just above it, and credits the notional to a running volume total
//! until the configured target is reached.

pub mod error;
pub mod exchange;
pub mod market_data;
pub mod trading;
pub mod utils;
pub mod volume;
