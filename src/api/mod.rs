pub mod binance;
pub mod error;

pub use binance::{BinanceClient, OrderAck};
pub use error::{Error, Result};
