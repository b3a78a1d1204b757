use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::api::BinanceClient;
use crate::config::Settings;
use crate::error::BotError;
use crate::execution::{Executor, PositionUpdatePolicy};
use crate::models::{PositionState, Side};
use crate::notify::TelegramNotifier;
use crate::strategy::{evaluate_crossover, CrossoverConfig, Evaluation};

/// Candles fetched per cycle (the exchange caps a single request at 1000)
const CANDLE_LIMIT: u16 = 1000;

/// Summary of one cycle, for logging and tests
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub fast: Option<f64>,
    pub slow: Option<f64>,
    pub signal: Option<Side>,
    pub state: PositionState,
}

/// The poll → compute → act loop.
///
/// Owns the position state and threads it through each cycle; nothing else
/// in the process mutates it. One cycle performs its network calls
/// sequentially, and a failed cycle leaves the state wherever the
/// configured update policy last put it.
pub struct Bot {
    settings: Settings,
    crossover: CrossoverConfig,
    client: BinanceClient,
    executor: Executor,
    notifier: TelegramNotifier,
    state: PositionState,
}

impl Bot {
    pub fn new(settings: Settings, client: BinanceClient, notifier: TelegramNotifier) -> Self {
        let executor = Executor::new(
            client.clone(),
            settings.symbol.clone(),
            settings.base_asset.clone(),
            settings.quote_asset.clone(),
        );
        let crossover = settings.crossover();

        Self {
            settings,
            crossover,
            client,
            executor,
            notifier,
            state: PositionState::Flat,
        }
    }

    pub fn position(&self) -> PositionState {
        self.state
    }

    /// Report free balances for both legs of the pair.
    ///
    /// Runs once at startup. Failures are reported and swallowed so a
    /// transient exchange problem does not prevent the loop from starting.
    pub async fn report_balances(&self) {
        match self.client.get_balances().await {
            Ok(balances) => {
                let free = |asset: &str| {
                    balances
                        .iter()
                        .find(|b| b.asset == asset)
                        .map(|b| b.free)
                        .unwrap_or(0.0)
                };
                let quote_free = free(&self.settings.quote_asset);
                let base_free = free(&self.settings.base_asset);

                tracing::info!(
                    quote = %self.settings.quote_asset,
                    quote_free,
                    base = %self.settings.base_asset,
                    base_free,
                    "Account balances"
                );
                self.notifier
                    .send(&format!(
                        "💰 *Balances*\n🔹 {}: {}\n🔹 {}: {}",
                        self.settings.quote_asset,
                        quote_free,
                        self.settings.base_asset,
                        base_free
                    ))
                    .await;
            }
            Err(e) => {
                tracing::error!("Failed to fetch balances: {}", e);
                self.notifier
                    .send(&format!("❌ Failed to fetch balances: {}", e))
                    .await;
            }
        }
    }

    /// One fetch → evaluate → act pass.
    ///
    /// Errors are returned to the loop boundary; the caller reports them
    /// and waits for the next tick.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, BotError> {
        let candles = self
            .client
            .get_klines(
                &self.settings.symbol,
                &self.settings.candle_interval,
                CANDLE_LIMIT,
                self.settings.display_timezone,
            )
            .await?;

        let Some(eval) = evaluate_crossover(&candles, self.state, &self.crossover) else {
            // Not enough history for the slow window yet
            tracing::info!(
                "Collecting data... ({}/{} candles needed)",
                candles.len(),
                self.crossover.slow_period
            );
            return Ok(CycleReport {
                fast: None,
                slow: None,
                signal: None,
                state: self.state,
            });
        };

        let last_close = candles.last().map(|c| c.close).unwrap_or_default();

        tracing::info!(
            fast = eval.fast,
            slow = eval.slow,
            close = last_close,
            state = %self.state,
            "Cycle evaluated"
        );
        self.notifier.send(&format_status(&eval, last_close)).await;

        if let Some(side) = eval.signal {
            self.act_on_signal(side, eval.next_state, last_close).await?;
        }

        Ok(CycleReport {
            fast: Some(eval.fast),
            slow: Some(eval.slow),
            signal: eval.signal,
            state: self.state,
        })
    }

    async fn act_on_signal(
        &mut self,
        side: Side,
        next_state: PositionState,
        last_close: f64,
    ) -> Result<(), BotError> {
        if !self.settings.trading_enabled {
            // Signal-only mode: the state tracks every signal
            self.state = next_state;
            let message = format!("✅ *{} signal* at {:.7} (trading disabled)", side, last_close);
            tracing::info!("{}", message);
            self.notifier.send(&message).await;
            return Ok(());
        }

        // Optimistic mode advances the state before knowing whether the
        // order goes through; confirmed mode waits for the acknowledgement.
        if self.settings.position_update_policy == PositionUpdatePolicy::Optimistic {
            self.state = next_state;
        }

        let outcome = self.executor.execute(side).await?;

        if self.settings.position_update_policy == PositionUpdatePolicy::Confirmed
            && outcome.submitted
        {
            self.state = next_state;
        }

        let message = if outcome.submitted {
            format!("✅ *{} signal* — {}", side, outcome.detail)
        } else {
            format!("⚠️ *{} signal* — {}", side, outcome.detail)
        };
        tracing::info!("{}", message);
        self.notifier.send(&message).await;

        Ok(())
    }

    /// Run cycles forever on the configured tick.
    ///
    /// No error is fatal here: failed cycles are reported and the ticker
    /// carries on. The process only stops when it is killed.
    pub async fn run(&mut self) {
        let mut ticker = interval(Duration::from_secs(self.settings.poll_interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            match self.run_cycle().await {
                Ok(report) => {
                    tracing::debug!(?report, "Cycle complete");
                }
                Err(e) => {
                    let message = match &e {
                        BotError::Exchange(inner) => format!("❌ Exchange error: {}", inner),
                        BotError::Unexpected(inner) => format!("❌ Unexpected error: {}", inner),
                    };
                    tracing::error!("{}", message);
                    self.notifier.send(&message).await;
                }
            }
        }
    }
}

fn format_status(eval: &Evaluation, last_close: f64) -> String {
    let footer = match eval.signal {
        Some(side) => format!("{} signal", side),
        None => "⏳ waiting for a crossover...".to_string(),
    };

    format!(
        "📉 *Bot active*\n🔹 fast SMA: {:.7}\n🔹 slow SMA: {:.7}\n🔹 close: {:.7}\n{}",
        eval.fast, eval.slow, last_close, footer
    )
}
