use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::exchange::types::OrderSide;

#[derive(Debug, Clone, PartialEq)]
pub enum LoopEvent {
    Started {
        symbol: String,
        target_volume: Decimal,
        order_notional: Decimal,
        estimated_iterations: u64,
    },
    OrderRejected {
        loop_index: u64,
        side: OrderSide,
        detail: String,
    },
    IterationCompleted {
        loop_index: u64,
        quantity: Decimal,
        buy_price: Decimal,
        sell_price: Decimal,
        credited: Decimal,
        total_volume: Decimal,
        estimated_fees: Decimal,
    },
    IterationUncredited {
        loop_index: u64,
        reason: String,
    },
    ErrorBackoff {
        loop_index: u64,
        detail: String,
        cooldown: Duration,
    },
    Terminated {
        iterations: u64,
        total_volume: Decimal,
        estimated_fees: Decimal,
    },
}

/// Receives every loop event, in order.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &LoopEvent);
}

/// Renders loop events as structured `tracing` records.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: &LoopEvent) {
        match event {
            LoopEvent::Started {
                symbol,
                target_volume,
                order_notional,
                estimated_iterations,
            } => info!(
                %symbol,
                %target_volume,
                %order_notional,
                estimated_iterations,
                "Trader started"
            ),
            LoopEvent::OrderRejected {
                loop_index,
                side,
                detail,
            } => warn!(loop_index, %side, %detail, "Order rejected by exchange"),
            LoopEvent::IterationCompleted {
                loop_index,
                quantity,
                buy_price,
                sell_price,
                credited,
                total_volume,
                estimated_fees,
            } => info!(
                loop_index,
                %quantity,
                %buy_price,
                %sell_price,
                %credited,
                %total_volume,
                %estimated_fees,
                "Loop {loop_index}: BUY {quantity} @ {buy_price}, SELL {quantity} @ {sell_price} +{credited} (total {total_volume})"
            ),
            LoopEvent::IterationUncredited { loop_index, reason } => {
                warn!(loop_index, %reason, "Iteration not credited")
            }
            LoopEvent::ErrorBackoff {
                loop_index,
                detail,
                cooldown,
            } => error!(
                loop_index,
                %detail,
                cooldown = ?cooldown,
                "Error on loop {loop_index}: {detail}"
            ),
            LoopEvent::Terminated {
                iterations,
                total_volume,
                estimated_fees,
            } => info!(
                iterations,
                %total_volume,
                %estimated_fees,
                "Target volume achieved after {iterations} loops. Exiting."
            ),
        }
    }
}
