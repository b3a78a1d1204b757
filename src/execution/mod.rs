// Order sizing and execution module
pub mod executor;
pub mod sizing;

pub use executor::{ExecutionOutcome, Executor, PositionUpdatePolicy};
pub use sizing::order_quantity;
