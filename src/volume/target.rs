//! Volume target derived from a pro-rata reward campaign.
//!
//! A campaign splits `reward_pool` across participants in proportion to traded volume.
//! To earn `reward_goal`, the bot needs `reward_goal / reward_pool` of the total volume,
//! estimated as `participants * volume_per_participant`.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct CampaignConfig {
    pub reward_pool: Decimal,
    pub reward_goal: Decimal,
    pub participants: u64,
    pub volume_per_participant: Decimal,
}

impl CampaignConfig {
    pub fn required_volume(&self) -> Result<Decimal, ConfigError> {
        if self.reward_pool <= Decimal::ZERO {
            return Err(ConfigError::invalid(
                "campaign.reward_pool",
                "must be positive",
            ));
        }
        if self.reward_goal <= Decimal::ZERO || self.reward_goal > self.reward_pool {
            return Err(ConfigError::invalid(
                "campaign.reward_goal",
                format!("must be in (0, {}]", self.reward_pool),
            ));
        }

        let share = self.reward_goal / self.reward_pool;
        let market_volume = Decimal::from(self.participants)
            .checked_mul(self.volume_per_participant)
            .ok_or_else(|| ConfigError::invalid("campaign.participants", "volume overflows"))?;

        Ok((share * market_volume).ceil())
    }
}
