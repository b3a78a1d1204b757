// Trading strategy module
pub mod crossover;

pub use crossover::{evaluate_crossover, transition, CrossoverConfig, Evaluation};
