// Core modules
pub mod api;
pub mod bot;
pub mod config;
pub mod error;
pub mod execution;
pub mod indicators;
pub mod models;
pub mod notify;
pub mod strategy;

// Re-export commonly used types
pub use bot::{Bot, CycleReport};
pub use config::Settings;
pub use error::BotError;
pub use models::*;
pub use notify::TelegramNotifier;
