mod bot;
mod chat;
mod config;
mod error;
mod firefly;
mod report;
mod scheduler;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::AppState;
use crate::chat::ChatClient;
use crate::config::Config;
use crate::firefly::FireflyClient;
use crate::scheduler::Scheduler;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("settings.toml"));

    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    // RUST_LOG wins over log_level from the config file
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Configuration loaded from {}", config_path.display());
    info!("  Firefly: {}", config.firefly.api_url);
    info!("  Chat: {}", config.telegram.chat_id);
    info!(
        "  Reports: daily={} monthly={} periodic={} (every {} days)",
        config.daily_report.send_report,
        config.monthly_report.send_report,
        config.periodic_report.send_report,
        config.day_period
    );

    let ledger = FireflyClient::new(&config.firefly).context("Failed to create Firefly client")?;
    let bot = chat::build_bot(&config.telegram).context("Failed to create Telegram bot")?;
    let chat = ChatClient::new(bot.clone(), config.telegram.chat_id);

    let state = Arc::new(AppState::new(config, Arc::new(ledger), chat));

    let mut scheduler = Scheduler::new().await?;
    let schedule = scheduler::tasks::register_report_task(&scheduler, state.clone()).await?;
    scheduler.start().await?;
    info!(
        "Next report run at {}",
        schedule.next_after(Local::now().naive_local())
    );

    bot::run(bot, state).await;

    scheduler.shutdown().await?;
    Ok(())
}
