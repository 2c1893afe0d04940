use rust_decimal::Decimal;

use crate::error::PricingError;

/// Buy and sell prices placed symmetrically around mid, plus the shared quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotePlan {
    pub mid: Decimal,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Copy)]
pub struct SymmetricQuoter {
    spread: Decimal,
    price_precision: u32,
    quantity_precision: u32,
}

impl SymmetricQuoter {
    pub fn new(spread: Decimal, price_precision: u32, quantity_precision: u32) -> Self {
        Self {
            spread,
            price_precision,
            quantity_precision,
        }
    }

    /// Quantity is sized off the buy price so the buy side costs `notional`.
    pub fn quote(&self, mid: Decimal, notional: Decimal) -> Result<QuotePlan, PricingError> {
        if mid <= Decimal::ZERO {
            return Err(PricingError::NonPositiveMid(mid));
        }

        let buy_price = mid
            .checked_mul(Decimal::ONE - self.spread)
            .ok_or(PricingError::Overflow(mid))?
            .round_dp(self.price_precision);
        let sell_price = mid
            .checked_mul(Decimal::ONE + self.spread)
            .ok_or(PricingError::Overflow(mid))?
            .round_dp(self.price_precision);
        if buy_price <= Decimal::ZERO {
            return Err(PricingError::NonPositiveBuyPrice(buy_price));
        }
        let quantity = notional
            .checked_div(buy_price)
            .ok_or(PricingError::Overflow(mid))?
            .round_dp(self.quantity_precision);

        Ok(QuotePlan {
            mid,
            buy_price,
            sell_price,
            quantity,
        })
    }
}
