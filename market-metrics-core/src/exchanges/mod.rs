//! Trade model and simulated exchanges

pub mod types;
pub mod errors;
pub mod simulator;

pub use types::{Symbol, Side, Trade, TradeId, TradeIdGenerator, MAX_TRADE_QUANTITY};
pub use errors::{MetricsError, MetricsResult};
pub use simulator::{ExchangeSimulator, SimulatorConfig};
