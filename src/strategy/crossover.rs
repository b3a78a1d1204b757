use crate::indicators::fast_slow_sma;
use crate::models::{Candle, PositionState, Side};

/// Configuration for the moving-average crossover signal
#[derive(Debug, Clone)]
pub struct CrossoverConfig {
    pub fast_period: usize,
    pub slow_period: usize,
}

impl Default for CrossoverConfig {
    fn default() -> Self {
        Self {
            fast_period: 7,
            slow_period: 40,
        }
    }
}

/// Outcome of evaluating one candle window against the current state
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub fast: f64,
    pub slow: f64,
    pub signal: Option<Side>,
    pub next_state: PositionState,
}

/// State transition for a crossover.
///
/// Strict inequality on both sides: a tie (fast == slow) never flips the
/// state, and a side that already matches the desired position produces no
/// signal.
pub fn transition(fast: f64, slow: f64, state: PositionState) -> (PositionState, Option<Side>) {
    if fast > slow && !state.is_long() {
        (PositionState::Long, Some(Side::Buy))
    } else if fast < slow && state.is_long() {
        (PositionState::Flat, Some(Side::Sell))
    } else {
        (state, None)
    }
}

/// Evaluate the candle window and derive the position signal.
///
/// Returns `None` while the series is shorter than the slow window — the
/// caller reports "collecting data" and skips trading for the cycle.
pub fn evaluate_crossover(
    candles: &[Candle],
    state: PositionState,
    config: &CrossoverConfig,
) -> Option<Evaluation> {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

    let (fast, slow) = fast_slow_sma(&closes, config.fast_period, config.slow_period);
    let (fast, slow) = (fast?, slow?);

    let (next_state, signal) = transition(fast, slow, state);

    tracing::debug!(
        fast = %fast,
        slow = %slow,
        state = %state,
        signal = ?signal,
        "Crossover evaluated"
    );

    Some(Evaluation {
        fast,
        slow,
        signal,
        next_state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn create_test_candles(prices: &[f64]) -> Vec<Candle> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &price)| {
                // Hourly candles, oldest first
                let close_utc =
                    Utc::now() - chrono::Duration::hours((prices.len() - i) as i64);
                Candle {
                    open_time: close_utc - chrono::Duration::hours(1),
                    close: price,
                    close_time: close_utc.with_timezone(&chrono_tz::America::Sao_Paulo),
                }
            })
            .collect()
    }

    #[test]
    fn test_no_signal_when_fast_below_slow_and_flat() {
        // Scenario: fast=10, slow=12, flat -> nothing happens
        let (state, signal) = transition(10.0, 12.0, PositionState::Flat);
        assert_eq!(state, PositionState::Flat);
        assert_eq!(signal, None);
    }

    #[test]
    fn test_buy_on_cross_above_while_flat() {
        // Scenario: fast=12, slow=10, flat -> buy, now long
        let (state, signal) = transition(12.0, 10.0, PositionState::Flat);
        assert_eq!(state, PositionState::Long);
        assert_eq!(signal, Some(Side::Buy));
    }

    #[test]
    fn test_sell_on_cross_below_while_long() {
        let (state, signal) = transition(10.0, 12.0, PositionState::Long);
        assert_eq!(state, PositionState::Flat);
        assert_eq!(signal, Some(Side::Sell));
    }

    #[test]
    fn test_no_transition_on_tie() {
        for state in [PositionState::Flat, PositionState::Long] {
            let (next, signal) = transition(10.0, 10.0, state);
            assert_eq!(next, state);
            assert_eq!(signal, None);
        }
    }

    #[test]
    fn test_no_repeat_signal_when_side_already_matches() {
        // Already long, fast still above slow
        let (state, signal) = transition(12.0, 10.0, PositionState::Long);
        assert_eq!(state, PositionState::Long);
        assert_eq!(signal, None);

        // Already flat, fast still below slow
        let (state, signal) = transition(10.0, 12.0, PositionState::Flat);
        assert_eq!(state, PositionState::Flat);
        assert_eq!(signal, None);
    }

    #[test]
    fn test_short_window_yields_no_evaluation() {
        // 30 candles < slow window of 40: slow SMA undefined, no crash
        let candles = create_test_candles(&vec![100.0; 30]);
        let config = CrossoverConfig::default();

        let result = evaluate_crossover(&candles, PositionState::Flat, &config);
        assert!(result.is_none());
    }

    #[test]
    fn test_uptrend_buys_then_holds() {
        let config = CrossoverConfig::default();

        // Steady uptrend: fast SMA sits above slow SMA
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let candles = create_test_candles(&prices);

        let eval = evaluate_crossover(&candles, PositionState::Flat, &config).unwrap();
        assert!(eval.fast > eval.slow);
        assert_eq!(eval.signal, Some(Side::Buy));
        assert_eq!(eval.next_state, PositionState::Long);

        // Re-evaluating from the new state produces no second buy
        let eval = evaluate_crossover(&candles, eval.next_state, &config).unwrap();
        assert_eq!(eval.signal, None);
        assert_eq!(eval.next_state, PositionState::Long);
    }

    #[test]
    fn test_averages_match_arithmetic_mean() {
        let prices: Vec<f64> = (1..=40).map(|i| i as f64).collect();
        let candles = create_test_candles(&prices);
        let config = CrossoverConfig::default();

        let eval = evaluate_crossover(&candles, PositionState::Flat, &config).unwrap();
        // Mean of the last 7 (34..=40) and of all 40 (1..=40)
        assert!((eval.fast - 37.0).abs() < 1e-9);
        assert!((eval.slow - 20.5).abs() < 1e-9);
    }
}
