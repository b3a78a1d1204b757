use thiserror::Error;

/// Cycle-level error taxonomy.
///
/// Both classes are handled identically at the loop boundary — log, forward
/// to the notification channel, sleep until the next tick. The split exists
/// so reports distinguish an exchange outage from a bug.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("exchange service error: {0}")]
    Exchange(#[from] crate::api::Error),
    #[error("unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),
}
