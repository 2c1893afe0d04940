use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, SubmissionError};
use crate::exchange::protocol::{parse_order_response, OrderDraft};
use crate::exchange::types::{OrderResult, OrderSide};
use crate::exchange::{ApiVariant, ExchangeClient, Signer};
use crate::utils::config::ExchangeConfig;

/// Places maker-only limit orders. Each call is one live order; never retried here.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn submit_limit_order(
        &self,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<OrderResult, SubmissionError>;
}

pub struct Executor {
    client: ExchangeClient,
    variant: ApiVariant,
    signer: Signer,
    api_key: String,
    recv_window_ms: u64,
    symbol: String,
    mock_mode: bool,
}

impl Executor {
    pub fn new(
        client: ExchangeClient,
        config: &ExchangeConfig,
        symbol: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        Ok(Executor {
            client,
            variant: config.api_variant,
            signer: Signer::new(&config.api_secret)?,
            api_key: config.api_key.clone(),
            recv_window_ms: config.recv_window_ms,
            symbol: symbol.into(),
            mock_mode: false,
        })
    }

    /// In mock mode orders are built and signed but never sent.
    pub fn set_mock_mode(&mut self, mock_mode: bool) {
        self.mock_mode = mock_mode;
        if mock_mode {
            warn!("Order executor in DRY-RUN mode, no orders will reach the exchange");
        } else {
            warn!("Order executor in LIVE mode, real orders will be placed");
        }
    }

    pub fn is_mock_mode(&self) -> bool {
        self.mock_mode
    }
}

#[async_trait]
impl OrderGateway for Executor {
    async fn submit_limit_order(
        &self,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<OrderResult, SubmissionError> {
        let draft = OrderDraft {
            symbol: &self.symbol,
            side,
            quantity,
            price,
        };
        let timestamp = chrono::Utc::now().timestamp_millis();
        let signed = self.variant.sign_order(
            &self.signer,
            &self.api_key,
            self.recv_window_ms,
            draft,
            timestamp,
        )?;

        if self.mock_mode {
            info!(%side, %quantity, %price, symbol = %self.symbol, "DRY-RUN order");
            let order_id = format!("dry-{}", uuid::Uuid::new_v4().simple());
            return Ok(OrderResult::accepted(order_id, serde_json::Value::Null));
        }

        debug!(%side, %quantity, %price, timestamp, "submitting post-only order");
        let response = self.client.send(&signed.request).await?;
        let result = parse_order_response(&response)?;

        match (&result.order_id, &result.error_detail) {
            (Some(order_id), _) => info!(%side, %order_id, %quantity, %price, "order accepted"),
            (None, Some(detail)) => warn!(%side, %detail, %quantity, %price, "order rejected"),
            (None, None) => warn!(%side, "order rejected without detail"),
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn exchange_config() -> ExchangeConfig {
        ExchangeConfig {
            // Unroutable; dry-run must never connect.
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            api_variant: ApiVariant::V5,
            recv_window_ms: 5000,
            request_timeout_ms: 1000,
        }
    }

    #[tokio::test]
    async fn dry_run_accepts_without_sending() {
        let config = exchange_config();
        let client = ExchangeClient::new(&config).unwrap();
        let mut executor = Executor::new(client, &config, "NXPCUSDT").unwrap();
        executor.set_mock_mode(true);
        assert!(executor.is_mock_mode());

        let result = executor
            .submit_limit_order(OrderSide::Buy, dec!(10), dec!(99.99))
            .await
            .unwrap();
        assert!(result.accepted);
        assert!(result.order_id.unwrap().starts_with("dry-"));
    }

    #[test]
    fn empty_secret_fails_construction() {
        let mut config = exchange_config();
        config.api_secret = String::new();
        let client = ExchangeClient::new(&config).unwrap();
        assert!(Executor::new(client, &config, "NXPCUSDT").is_err());
    }
}
