use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use maker_volume_bot::{
    exchange::ExchangeClient,
    market_data::MarketDataFeed,
    trading::{Executor, LoopController, LoopSettings, TracingSink},
    utils::{config::Config, logging},
};

#[derive(Debug, Parser)]
#[command(version, about = "Maker-only volume generation loop")]
struct Cli {
    /// TOML configuration file; `VOLBOT_*` environment variables override it.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Build and sign orders without sending them.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    logging::init(&config.logging)?;
    info!(variant = ?config.exchange.api_variant, base_url = %config.exchange.base_url, "Configuration loaded");

    let settings = LoopSettings::from_config(&config)?;
    let client = ExchangeClient::new(&config.exchange).context("building HTTP client")?;
    let feed = MarketDataFeed::new(client.clone(), config.exchange.api_variant);
    let mut executor = Executor::new(client, &config.exchange, settings.symbol.clone())?;
    executor.set_mock_mode(cli.dry_run || config.trading.dry_run);

    let mut controller = LoopController::new(settings, feed, executor, TracingSink);
    let final_state = controller.run().await;

    info!(
        iterations = final_state.iteration_count,
        total_volume = %final_state.cumulative_volume,
        "Volume loop finished"
    );
    Ok(())
}
