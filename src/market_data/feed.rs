use async_trait::async_trait;
use tracing::debug;

use crate::error::MarketDataError;
use crate::exchange::types::PriceQuote;
use crate::exchange::{ApiVariant, ExchangeClient};
use crate::market_data::parser::parse_mid_price;

/// Source of the reference price the loop quotes around.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_mid_price(&self, symbol: &str) -> Result<PriceQuote, MarketDataError>;
}

/// Fetches a fresh ticker on every call. Nothing is cached.
pub struct MarketDataFeed {
    client: ExchangeClient,
    variant: ApiVariant,
}

impl MarketDataFeed {
    pub fn new(client: ExchangeClient, variant: ApiVariant) -> Self {
        Self { client, variant }
    }
}

#[async_trait]
impl MarketDataSource for MarketDataFeed {
    async fn fetch_mid_price(&self, symbol: &str) -> Result<PriceQuote, MarketDataError> {
        let request = self.variant.ticker_request(symbol);
        let response = self.client.send(&request).await?;

        if !response.is_success() {
            return Err(MarketDataError::Status {
                status: response.status,
                body: response.body,
            });
        }

        let price = parse_mid_price(self.variant, &response.body)?;
        debug!(symbol, %price, "fetched mid price");

        Ok(PriceQuote {
            symbol: symbol.to_string(),
            price,
            observed_at: chrono::Utc::now(),
        })
    }
}
