//! Configuration loaded from the environment at startup

use anyhow::{Context, Result};
use chrono_tz::Tz;
use std::env;

use crate::execution::PositionUpdatePolicy;
use crate::strategy::CrossoverConfig;

/// Bot configuration, read once at startup.
///
/// There are no CLI flags; everything comes from the environment (a `.env`
/// file is honored). Credentials are required, everything else defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Binance API credentials
    pub binance_api_key: String,
    pub binance_secret_key: String,
    /// Override for the exchange endpoint (testnet, mock server)
    pub binance_base_url: Option<String>,

    /// Telegram bot credentials
    pub telegram_token: String,
    pub telegram_chat_id: String,
    pub telegram_base_url: Option<String>,

    /// Traded pair, e.g. "NEIROUSDT" = NEIRO priced in USDT
    pub symbol: String,
    pub base_asset: String,
    pub quote_asset: String,

    /// Candle interval in exchange notation ("1m", "5m", "1h", ...)
    pub candle_interval: String,

    /// Moving-average window lengths, in candles
    pub fast_period: usize,
    pub slow_period: usize,

    /// Seconds between cycles
    pub poll_interval_secs: u64,

    /// When false the bot only logs and notifies signals
    pub trading_enabled: bool,
    pub position_update_policy: PositionUpdatePolicy,

    /// Zone candle close times are displayed in
    pub display_timezone: Tz,
}

impl Settings {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let binance_api_key =
            env::var("BINANCE_API_KEY").context("BINANCE_API_KEY not set")?;
        let binance_secret_key =
            env::var("BINANCE_SECRET_KEY").context("BINANCE_SECRET_KEY not set")?;
        let telegram_token = env::var("TELEGRAM_TOKEN").context("TELEGRAM_TOKEN not set")?;
        let telegram_chat_id = env::var("TELEGRAM_CHAT_ID").context("TELEGRAM_CHAT_ID not set")?;

        let binance_base_url = env::var("BINANCE_BASE_URL").ok().filter(|s| !s.is_empty());
        let telegram_base_url = env::var("TELEGRAM_BASE_URL").ok().filter(|s| !s.is_empty());

        let symbol = env::var("SYMBOL").unwrap_or_else(|_| "NEIROUSDT".to_string());
        let base_asset = env::var("BASE_ASSET").unwrap_or_else(|_| "NEIRO".to_string());
        let quote_asset = env::var("QUOTE_ASSET").unwrap_or_else(|_| "USDT".to_string());
        let candle_interval = env::var("CANDLE_INTERVAL").unwrap_or_else(|_| "1h".to_string());

        let fast_period = env::var("FAST_PERIOD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(7);
        let slow_period = env::var("SLOW_PERIOD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(40);

        let poll_interval_secs = env::var("POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3600);

        // Default to signal-only mode for safety
        let trading_enabled = env::var("TRADING_ENABLED")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        let position_update_policy = match env::var("POSITION_UPDATE_POLICY") {
            Ok(raw) => raw
                .parse::<PositionUpdatePolicy>()
                .map_err(anyhow::Error::msg)?,
            Err(_) => PositionUpdatePolicy::default(),
        };

        let display_timezone = env::var("DISPLAY_TIMEZONE")
            .unwrap_or_else(|_| "America/Sao_Paulo".to_string())
            .parse::<Tz>()
            .map_err(anyhow::Error::msg)?;

        // Validate configuration
        if fast_period == 0 || slow_period == 0 {
            anyhow::bail!("moving-average periods must be positive");
        }
        if fast_period >= slow_period {
            anyhow::bail!(
                "FAST_PERIOD ({}) must be shorter than SLOW_PERIOD ({})",
                fast_period,
                slow_period
            );
        }
        if poll_interval_secs == 0 {
            anyhow::bail!("POLL_INTERVAL_SECS must be positive");
        }

        Ok(Self {
            binance_api_key,
            binance_secret_key,
            binance_base_url,
            telegram_token,
            telegram_chat_id,
            telegram_base_url,
            symbol,
            base_asset,
            quote_asset,
            candle_interval,
            fast_period,
            slow_period,
            poll_interval_secs,
            trading_enabled,
            position_update_policy,
            display_timezone,
        })
    }

    /// Strategy view of the configured windows
    pub fn crossover(&self) -> CrossoverConfig {
        CrossoverConfig {
            fast_period: self.fast_period,
            slow_period: self.slow_period,
        }
    }
}
