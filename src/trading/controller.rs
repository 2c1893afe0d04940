//! The order loop: sample mid, quote both sides, submit buy then sell, credit volume.
//!
//! One iteration runs at a time. Any fault aborts the iteration before it is credited,
//! then the loop cools down and samples again. There is no retry ceiling; the loop ends
//! only when the volume target is reached.

use rust_decimal::Decimal;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::error::{ConfigError, CycleError};
use crate::exchange::types::{OrderResult, OrderSide};
use crate::market_data::MarketDataSource;
use crate::trading::events::{EventSink, LoopEvent};
use crate::trading::executor::OrderGateway;
use crate::trading::strategy::SymmetricQuoter;
use crate::utils::config::{Config, CreditPolicy};
use crate::volume::accountant::iterations_to_target;
use crate::volume::{VolumeAccountant, VolumeState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Sampling,
    ComputingPrices,
    SubmittingBuy,
    SubmittingSell,
    Accounting,
    PacingDelay,
    ErrorBackoff,
    Terminated,
}

/// Validated, immutable loop parameters.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub symbol: String,
    pub order_notional: Decimal,
    pub target_volume: Decimal,
    pub quoter: SymmetricQuoter,
    pub pacing_interval: Duration,
    pub error_backoff: Duration,
    pub maker_fee_rate: Decimal,
    pub credit_policy: CreditPolicy,
}

impl LoopSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let trading = &config.trading;
        Ok(Self {
            symbol: trading.symbol.clone(),
            order_notional: trading.order_notional,
            target_volume: config.target_volume()?,
            quoter: SymmetricQuoter::new(
                trading.price_spread,
                trading.price_precision,
                trading.quantity_precision,
            ),
            pacing_interval: Duration::from_millis(trading.pacing_interval_ms),
            error_backoff: Duration::from_millis(trading.error_backoff_ms),
            maker_fee_rate: trading.maker_fee_rate,
            credit_policy: trading.credit_policy,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationOutcome {
    Credited(VolumeState),
    /// Both orders were submitted but the credit policy withheld credit.
    Uncredited,
}

pub struct LoopController<M, G, S> {
    settings: LoopSettings,
    market_data: M,
    gateway: G,
    sink: S,
    accountant: VolumeAccountant,
    state: LoopState,
}

impl<M, G, S> LoopController<M, G, S>
where
    M: MarketDataSource,
    G: OrderGateway,
    S: EventSink,
{
    pub fn new(settings: LoopSettings, market_data: M, gateway: G, sink: S) -> Self {
        Self {
            settings,
            market_data,
            gateway,
            sink,
            accountant: VolumeAccountant::new(),
            state: LoopState::Idle,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn volume(&self) -> VolumeState {
        self.accountant.state()
    }

    pub fn market_data(&self) -> &M {
        &self.market_data
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Runs until the volume target is reached and returns the final tally.
    pub async fn run(&mut self) -> VolumeState {
        let settings = &self.settings;
        self.sink.record(&LoopEvent::Started {
            symbol: settings.symbol.clone(),
            target_volume: settings.target_volume,
            order_notional: settings.order_notional,
            estimated_iterations: iterations_to_target(
                settings.target_volume,
                settings.order_notional,
            ),
        });

        while !self.accountant.has_reached_target(self.settings.target_volume) {
            match self.run_iteration().await {
                Ok(_) => {
                    self.transition(LoopState::PacingDelay);
                    sleep(self.settings.pacing_interval).await;
                }
                Err(err) => {
                    self.transition(LoopState::ErrorBackoff);
                    self.sink.record(&LoopEvent::ErrorBackoff {
                        loop_index: self.accountant.state().iteration_count + 1,
                        detail: err.to_string(),
                        cooldown: self.settings.error_backoff,
                    });
                    sleep(self.settings.error_backoff).await;
                }
            }
        }

        self.transition(LoopState::Terminated);
        let final_state = self.accountant.state();
        self.sink.record(&LoopEvent::Terminated {
            iterations: final_state.iteration_count,
            total_volume: final_state.cumulative_volume,
            estimated_fees: self.estimated_fees(&final_state),
        });
        final_state
    }

    /// One sample-quote-submit-account pass. Volume is only touched on success.
    pub async fn run_iteration(&mut self) -> Result<IterationOutcome, CycleError> {
        let loop_index = self.accountant.state().iteration_count + 1;

        self.transition(LoopState::Sampling);
        let quote = self
            .market_data
            .fetch_mid_price(&self.settings.symbol)
            .await?;

        self.transition(LoopState::ComputingPrices);
        let plan = self
            .settings
            .quoter
            .quote(quote.price, self.settings.order_notional)?;

        self.transition(LoopState::SubmittingBuy);
        let buy = self
            .submit(OrderSide::Buy, plan.quantity, plan.buy_price)
            .await?;
        self.report_rejection(loop_index, OrderSide::Buy, &buy);

        // Mandatory gap between the two sides, whatever the buy returned.
        sleep(self.settings.pacing_interval).await;

        self.transition(LoopState::SubmittingSell);
        let sell = self
            .submit(OrderSide::Sell, plan.quantity, plan.sell_price)
            .await?;
        self.report_rejection(loop_index, OrderSide::Sell, &sell);

        self.transition(LoopState::Accounting);
        if self.settings.credit_policy == CreditPolicy::Accepted && !(buy.accepted && sell.accepted)
        {
            self.sink.record(&LoopEvent::IterationUncredited {
                loop_index,
                reason: "at least one order was rejected".to_string(),
            });
            return Ok(IterationOutcome::Uncredited);
        }

        let state = self.accountant.record_iteration(self.settings.order_notional);
        self.sink.record(&LoopEvent::IterationCompleted {
            loop_index,
            quantity: plan.quantity,
            buy_price: plan.buy_price,
            sell_price: plan.sell_price,
            credited: self.settings.order_notional * Decimal::TWO,
            total_volume: state.cumulative_volume,
            estimated_fees: self.estimated_fees(&state),
        });
        Ok(IterationOutcome::Credited(state))
    }

    async fn submit(
        &self,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<OrderResult, CycleError> {
        self.gateway
            .submit_limit_order(side, quantity, price)
            .await
            .map_err(|source| CycleError::Submission { side, source })
    }

    fn report_rejection(&self, loop_index: u64, side: OrderSide, result: &OrderResult) {
        if !result.accepted {
            self.sink.record(&LoopEvent::OrderRejected {
                loop_index,
                side,
                detail: result
                    .error_detail
                    .clone()
                    .unwrap_or_else(|| "no detail".to_string()),
            });
        }
    }

    fn estimated_fees(&self, state: &VolumeState) -> Decimal {
        state.cumulative_volume * self.settings.maker_fee_rate
    }

    fn transition(&mut self, next: LoopState) {
        debug!(from = ?self.state, to = ?next, "loop state");
        self.state = next;
    }
}
