use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use betslip_relay::bot::{self, DialogueManager, TelegramPublisher};
use betslip_relay::config::BotConfig;
use betslip_relay::extraction::AnthropicExtractor;
use betslip_relay::localization::get_localization_manager;
use betslip_relay::pending_store::{spawn_sweeper, PendingBetStore};

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = BotConfig::from_env()?;
    init_logging(config.json_logs);

    info!("Starting Bet Slip Relay Telegram Bot");

    if config.extraction.api_key.is_none() {
        warn!("ANTHROPIC_API_KEY is not set, screenshots will be rejected");
    }
    if config.destination_channel.is_none() {
        warn!("VIP_CHANNEL_ID is not set, confirmed bets cannot be posted");
    }

    // Load message catalogues up front
    get_localization_manager();

    let store = Arc::new(PendingBetStore::new(config.pending_ttl));
    let sweeper = spawn_sweeper(Arc::clone(&store), config.sweep_interval);

    // Initialize the bot
    let bot = Bot::new(&config.telegram_token);

    let extractor = Arc::new(AnthropicExtractor::new(config.extraction.clone())?);
    let publisher = Arc::new(TelegramPublisher::new(bot.clone()));
    let manager = Arc::new(DialogueManager::new(
        store,
        extractor,
        publisher,
        config.destination_channel.clone(),
    ));
    let config = Arc::new(config);

    info!(
        pending_ttl_secs = config.pending_ttl.as_secs(),
        "Bot initialized, starting dispatcher"
    );

    let handler = dptree::entry().branch(Update::filter_message().endpoint(bot::message_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![manager, config])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    sweeper.abort();
    info!("Bot stopped");

    Ok(())
}
