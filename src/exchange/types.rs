use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceQuote {
    pub symbol: String,
    pub price: Decimal,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Upper-case spelling used by the legacy spot API.
    pub fn as_upper(&self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }

    pub fn as_title(&self) -> &'static str {
        match self {
            OrderSide::Buy => "Buy",
            OrderSide::Sell => "Sell",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_upper())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    Limit,
}

/// Maker-only: the exchange rejects the order instead of matching it on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    PostOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub kind: OrderKind,
    pub time_in_force: TimeInForce,
    pub quantity: Decimal,
    pub price: Decimal,
    pub timestamp: i64,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResult {
    pub accepted: bool,
    pub order_id: Option<String>,
    pub raw_response: serde_json::Value,
    pub error_detail: Option<String>,
}

impl OrderResult {
    pub fn accepted(order_id: String, raw_response: serde_json::Value) -> Self {
        Self {
            accepted: true,
            order_id: Some(order_id),
            raw_response,
            error_detail: None,
        }
    }

    pub fn rejected(detail: String, raw_response: serde_json::Value) -> Self {
        Self {
            accepted: false,
            order_id: None,
            raw_response,
            error_detail: Some(detail),
        }
    }
}

/// Decimal rendering used on the wire: no exponent, no trailing zeros.
pub fn wire_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}
