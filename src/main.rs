use crossbot::api::BinanceClient;
use crossbot::{Bot, Settings, TelegramNotifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let settings = Settings::from_env()?;

    tracing::info!("🚀 crossbot starting");
    tracing::info!("\n📊 Configuration:");
    tracing::info!("  Symbol: {} ({}/{})", settings.symbol, settings.base_asset, settings.quote_asset);
    tracing::info!("  Interval: {}", settings.candle_interval);
    tracing::info!("  Windows: fast {} / slow {}", settings.fast_period, settings.slow_period);
    tracing::info!("  Poll: every {}s", settings.poll_interval_secs);
    tracing::info!("  Trading: {}", if settings.trading_enabled { "ENABLED" } else { "signal-only" });
    tracing::info!("  Position updates: {:?}", settings.position_update_policy);
    tracing::info!("  Display zone: {}", settings.display_timezone);

    let client = match &settings.binance_base_url {
        Some(url) => BinanceClient::with_base_url(
            settings.binance_api_key.clone(),
            settings.binance_secret_key.clone(),
            url.clone(),
        )?,
        None => BinanceClient::new(
            settings.binance_api_key.clone(),
            settings.binance_secret_key.clone(),
        )?,
    };

    let notifier = match &settings.telegram_base_url {
        Some(url) => TelegramNotifier::with_base_url(
            settings.telegram_token.clone(),
            settings.telegram_chat_id.clone(),
            url.clone(),
        ),
        None => TelegramNotifier::new(
            settings.telegram_token.clone(),
            settings.telegram_chat_id.clone(),
        ),
    };

    let mut bot = Bot::new(settings, client, notifier);

    // Balance snapshot before the first cycle
    bot.report_balances().await;

    tracing::info!("Press Ctrl+C to stop...\n");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("\n⚠️  Received Ctrl+C, shutting down...");
        }
        _ = bot.run() => {
            // run() loops forever; reaching here means the ticker died
            tracing::error!("Trading loop exited unexpectedly");
        }
    }

    tracing::info!("👋 crossbot stopped");
    Ok(())
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crossbot=info".into()),
        )
        .init();
}
