use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// One closed candle for the traded pair.
///
/// Only the fields the strategy consumes are kept from the exchange
/// response. `close_time` is converted to the configured display zone at
/// fetch time; `open_time` stays UTC.
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub close: f64,
    pub close_time: DateTime<Tz>,
}

/// Order side sent to the exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Wire representation expected by the order endpoint
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the bot currently holds the base asset.
///
/// Lives only in process memory and is threaded explicitly through each
/// cycle. Flips on a strict crossover, never on a tie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionState {
    #[default]
    Flat,
    Long,
}

impl PositionState {
    pub fn is_long(&self) -> bool {
        matches!(self, PositionState::Long)
    }
}

impl std::fmt::Display for PositionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionState::Flat => f.write_str("flat"),
            PositionState::Long => f.write_str("long"),
        }
    }
}

/// Free balance for a single asset, queried fresh at decision time
#[derive(Debug, Clone, PartialEq)]
pub struct Balance {
    pub asset: String,
    pub free: f64,
}

/// Exchange lot-size filter for the traded symbol
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LotConstraint {
    pub min_qty: f64,
    pub step_size: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_wire_format() {
        assert_eq!(Side::Buy.as_str(), "BUY");
        assert_eq!(Side::Sell.as_str(), "SELL");
        assert_eq!(Side::Sell.to_string(), "SELL");
    }

    #[test]
    fn test_position_state_starts_flat() {
        let state = PositionState::default();
        assert_eq!(state, PositionState::Flat);
        assert!(!state.is_long());
    }

    #[test]
    fn test_candle_creation() {
        let now = Utc::now();
        let candle = Candle {
            open_time: now,
            close: 0.0012345,
            close_time: now.with_timezone(&chrono_tz::America::Sao_Paulo),
        };

        assert_eq!(candle.close, 0.0012345);
        // Same instant, different zone
        assert_eq!(candle.close_time.with_timezone(&Utc), now);
    }
}
