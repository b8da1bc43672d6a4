// In crates/analytics/src/lib.rs

pub mod chart;
pub mod classifier;
pub mod drawdown;
pub mod engine;
pub mod objectives;
pub mod trading_days;
pub mod types;

pub use classifier::TradeClassifier;
pub use engine::AnalyticsEngine;
pub use objectives::{evaluate_objectives, ProgramRules};
pub use types::{SnapshotInputs, TradeStats};
