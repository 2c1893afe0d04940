//! Error types shared across the bot.
//!
//! Per-iteration faults (`MarketDataError`, `PricingError`, `SubmissionError`) are
//! recovered by the loop controller. `ConfigError` is fatal at startup.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::exchange::types::OrderSide;

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("ticker request returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("exchange error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("malformed ticker response: {0}")]
    Malformed(String),

    #[error("ticker response has no price field")]
    MissingPrice,

    #[error("invalid price {0:?}")]
    InvalidPrice(String),
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("order request returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to encode order payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("unparseable order response: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("mid price must be positive, got {0}")]
    NonPositiveMid(Decimal),

    #[error("buy price rounds to {0} at configured precision")]
    NonPositiveBuyPrice(Decimal),

    #[error("quote arithmetic overflowed for mid price {0}")]
    Overflow(Decimal),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Source(#[from] config::ConfigError),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error("missing configuration value: {0}")]
    Missing(&'static str),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// A fault that aborts the current iteration.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("market data: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("pricing: {0}")]
    Pricing(#[from] PricingError),

    #[error("{side} submission failed: {source}")]
    Submission {
        side: OrderSide,
        #[source]
        source: SubmissionError,
    },
}
