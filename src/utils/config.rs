use rust_decimal::Decimal;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

use crate::error::ConfigError;
use crate::exchange::ApiVariant;
use crate::volume::target::CampaignConfig;

/// Environment overrides look like `VOLBOT_EXCHANGE__API_SECRET`.
pub const ENV_PREFIX: &str = "VOLBOT";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub exchange: ExchangeConfig,
    pub trading: TradingConfig,
    #[serde(default)]
    pub campaign: Option<CampaignConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    #[serde(default)]
    pub api_variant: ApiVariant,
    #[serde(default = "default_recv_window_ms")]
    pub recv_window_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

// Keeps the secret out of logs.
impl fmt::Debug for ExchangeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("api_variant", &self.api_variant)
            .field("recv_window_ms", &self.recv_window_ms)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditPolicy {
    /// Credit once both orders were submitted, whatever the exchange answered.
    #[default]
    Attempted,
    /// Credit only when both orders were accepted.
    Accepted,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradingConfig {
    pub symbol: String,
    /// Quote-currency value of each order side.
    pub order_notional: Decimal,
    #[serde(default)]
    pub target_volume: Option<Decimal>,
    /// Fractional offset from mid, e.g. 0.0001 for 1bp.
    pub price_spread: Decimal,
    #[serde(default = "default_price_precision")]
    pub price_precision: u32,
    #[serde(default = "default_quantity_precision")]
    pub quantity_precision: u32,
    #[serde(default = "default_pacing_interval_ms")]
    pub pacing_interval_ms: u64,
    #[serde(default = "default_error_backoff_ms")]
    pub error_backoff_ms: u64,
    #[serde(default = "default_maker_fee_rate")]
    pub maker_fee_rate: Decimal,
    #[serde(default)]
    pub initial_capital: Option<Decimal>,
    #[serde(default)]
    pub credit_policy: CreditPolicy,
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_path: None,
            json: false,
        }
    }
}

fn default_base_url() -> String {
    "https://api.bybit.com".to_string()
}

fn default_recv_window_ms() -> u64 {
    5_000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_price_precision() -> u32 {
    6
}

fn default_quantity_precision() -> u32 {
    8
}

fn default_pacing_interval_ms() -> u64 {
    1_000
}

fn default_error_backoff_ms() -> u64 {
    5_000
}

fn default_maker_fee_rate() -> Decimal {
    Decimal::new(1, 3)
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Loads `path` (if present), then `.env` and `VOLBOT_*` overrides, then validates.
    ///
    /// Environment values stay strings until deserialization so credentials made of
    /// digits keep their leading zeros.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let exchange = &self.exchange;
        if exchange.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("exchange.api_key"));
        }
        if exchange.api_secret.trim().is_empty() {
            return Err(ConfigError::Missing("exchange.api_secret"));
        }
        url::Url::parse(&exchange.base_url)
            .map_err(|e| ConfigError::invalid("exchange.base_url", e.to_string()))?;
        if exchange.request_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "exchange.request_timeout_ms",
                "must be greater than zero",
            ));
        }

        let trading = &self.trading;
        if trading.symbol.trim().is_empty() {
            return Err(ConfigError::Missing("trading.symbol"));
        }
        if trading.order_notional <= Decimal::ZERO {
            return Err(ConfigError::invalid(
                "trading.order_notional",
                format!("must be positive, got {}", trading.order_notional),
            ));
        }
        if trading.price_spread < Decimal::ZERO || trading.price_spread >= Decimal::ONE {
            return Err(ConfigError::invalid(
                "trading.price_spread",
                format!("must be in [0, 1), got {}", trading.price_spread),
            ));
        }
        if trading.maker_fee_rate < Decimal::ZERO {
            return Err(ConfigError::invalid(
                "trading.maker_fee_rate",
                "must not be negative",
            ));
        }
        if let Some(capital) = trading.initial_capital {
            if trading.order_notional > capital {
                return Err(ConfigError::invalid(
                    "trading.order_notional",
                    format!("{} exceeds initial capital {}", trading.order_notional, capital),
                ));
            }
        }

        let target = self.target_volume()?;
        if target <= Decimal::ZERO {
            return Err(ConfigError::invalid(
                "trading.target_volume",
                format!("must be positive, got {target}"),
            ));
        }
        Ok(())
    }

    /// Explicit target, or the one derived from `[campaign]`.
    pub fn target_volume(&self) -> Result<Decimal, ConfigError> {
        match (self.trading.target_volume, &self.campaign) {
            (Some(target), _) => Ok(target),
            (None, Some(campaign)) => campaign.required_volume(),
            (None, None) => Err(ConfigError::Missing("trading.target_volume")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = r#"
        [exchange]
        api_key = "key"
        api_secret = "secret"
        api_variant = "spot_v1"

        [trading]
        symbol = "NXPCUSDT"
        order_notional = "1000"
        target_volume = "466667"
        price_spread = "0.0001"
        initial_capital = "1000"
    "#;

    #[test]
    fn parses_sample_with_defaults() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.exchange.base_url, "https://api.bybit.com");
        assert_eq!(config.exchange.api_variant, ApiVariant::SpotV1);
        assert_eq!(config.exchange.recv_window_ms, 5000);
        assert_eq!(config.exchange.request_timeout_ms, 10_000);
        assert_eq!(config.trading.price_precision, 6);
        assert_eq!(config.trading.quantity_precision, 8);
        assert_eq!(config.trading.pacing_interval_ms, 1000);
        assert_eq!(config.trading.error_backoff_ms, 5000);
        assert_eq!(config.trading.maker_fee_rate, dec!(0.001));
        assert_eq!(config.trading.credit_policy, CreditPolicy::Attempted);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.target_volume().unwrap(), dec!(466667));
    }

    #[test]
    fn debug_output_redacts_secret() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        let rendered = format!("{:?}", config.exchange);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("\"secret\""));
    }

    #[test]
    fn rejects_non_positive_notional() {
        let source = SAMPLE.replace(r#"order_notional = "1000""#, r#"order_notional = "0""#);
        assert!(matches!(
            Config::from_toml_str(&source),
            Err(ConfigError::Invalid { field: "trading.order_notional", .. })
        ));
    }

    #[test]
    fn rejects_negative_spread() {
        let source = SAMPLE.replace(r#"price_spread = "0.0001""#, r#"price_spread = "-0.1""#);
        assert!(matches!(
            Config::from_toml_str(&source),
            Err(ConfigError::Invalid { field: "trading.price_spread", .. })
        ));
    }

    #[test]
    fn rejects_missing_credentials() {
        let source = SAMPLE.replace(r#"api_secret = "secret""#, "");
        assert!(matches!(
            Config::from_toml_str(&source),
            Err(ConfigError::Missing("exchange.api_secret"))
        ));
    }

    #[test]
    fn rejects_notional_above_capital() {
        let source = SAMPLE.replace(r#"initial_capital = "1000""#, r#"initial_capital = "500""#);
        assert!(matches!(
            Config::from_toml_str(&source),
            Err(ConfigError::Invalid { field: "trading.order_notional", .. })
        ));
    }

    #[test]
    fn target_from_campaign_when_not_explicit() {
        let source = SAMPLE.replace(r#"target_volume = "466667""#, "")
            + r#"
            [campaign]
            reward_pool = "9000000"
            reward_goal = "14000"
            participants = 600000
            volume_per_participant = "500"
        "#;
        let config = Config::from_toml_str(&source).unwrap();
        assert_eq!(config.target_volume().unwrap(), dec!(466667));
    }

    #[test]
    fn missing_target_is_error() {
        let source = SAMPLE.replace(r#"target_volume = "466667""#, "");
        assert!(matches!(
            Config::from_toml_str(&source),
            Err(ConfigError::Missing("trading.target_volume"))
        ));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let path = std::env::temp_dir().join(format!("volbot-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, SAMPLE).unwrap();
        let config = Config::load(&path);
        std::fs::remove_file(&path).ok();
        assert_eq!(config.unwrap().trading.symbol, "NXPCUSDT");
    }

    #[test]
    fn rejects_non_positive_target() {
        for target in ["0", "-5"] {
            let source = SAMPLE.replace(
                r#"target_volume = "466667""#,
                &format!(r#"target_volume = "{target}""#),
            );
            assert!(matches!(
                Config::from_toml_str(&source),
                Err(ConfigError::Invalid { field: "trading.target_volume", .. })
            ));
        }
    }

    #[test]
    fn rejects_spread_of_one_or_more() {
        for spread in ["1", "1.5"] {
            let source = SAMPLE.replace(
                r#"price_spread = "0.0001""#,
                &format!(r#"price_spread = "{spread}""#),
            );
            assert!(matches!(
                Config::from_toml_str(&source),
                Err(ConfigError::Invalid { field: "trading.price_spread", .. })
            ));
        }
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let source = SAMPLE.replace(
            r#"api_variant = "spot_v1""#,
            r#"api_variant = "spot_v1"
        base_url = "not a url""#,
        );
        assert!(matches!(
            Config::from_toml_str(&source),
            Err(ConfigError::Invalid { field: "exchange.base_url", .. })
        ));
    }

    #[test]
    fn rejects_zero_request_timeout() {
        let source = SAMPLE.replace(
            r#"api_variant = "spot_v1""#,
            r#"api_variant = "spot_v1"
        request_timeout_ms = 0"#,
        );
        assert!(matches!(
            Config::from_toml_str(&source),
            Err(ConfigError::Invalid { field: "exchange.request_timeout_ms", .. })
        ));
    }

    #[test]
    fn env_overrides_file_and_keeps_digit_secrets_verbatim() {
        let path = std::env::temp_dir().join(format!("volbot-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, SAMPLE).unwrap();
        std::env::set_var("VOLBOT_EXCHANGE__API_SECRET", "00123456789");
        std::env::set_var("VOLBOT_TRADING__PACING_INTERVAL_MS", "250");

        let config = Config::load(&path);

        std::env::remove_var("VOLBOT_EXCHANGE__API_SECRET");
        std::env::remove_var("VOLBOT_TRADING__PACING_INTERVAL_MS");
        std::fs::remove_file(&path).ok();

        let config = config.unwrap();
        assert_eq!(config.exchange.api_secret, "00123456789");
        assert_eq!(config.trading.pacing_interval_ms, 250);
        assert_eq!(config.trading.symbol, "NXPCUSDT");
    }
}
