//! Simulated exchange producing random trades

use super::types::{Side, Symbol, Trade, TradeIdGenerator, MAX_TRADE_QUANTITY};
use super::errors::{MetricsError, MetricsResult};
use crate::publisher::{PublishReport, TradePublisher};
use chrono::Local;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Trade generation parameters
#[derive(Clone, Debug)]
pub struct SimulatorConfig {
    /// Inclusive lower bound of the pause between trades
    pub min_delay: Duration,
    /// Exclusive upper bound of the pause between trades
    pub max_delay: Duration,
    pub min_price: f64,
    pub max_price: f64,
    pub max_quantity: u32,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(200),
            max_delay: Duration::from_millis(1000),
            min_price: 50.0,
            max_price: 150.0,
            max_quantity: MAX_TRADE_QUANTITY,
        }
    }
}

/// One exchange worth of synthetic trade flow
pub struct ExchangeSimulator {
    exchange: String,
    publisher: Arc<TradePublisher>,
    symbols: Arc<[Symbol]>,
    ids: Arc<TradeIdGenerator>,
    config: SimulatorConfig,
}

impl ExchangeSimulator {
    pub fn new(
        exchange: impl Into<String>,
        publisher: Arc<TradePublisher>,
        symbols: Arc<[Symbol]>,
        ids: Arc<TradeIdGenerator>,
        config: SimulatorConfig,
    ) -> MetricsResult<Self> {
        let exchange = exchange.into();
        if symbols.is_empty() {
            return Err(MetricsError::Config(format!("{}: no symbols to trade", exchange)));
        }
        if config.min_delay > config.max_delay {
            return Err(MetricsError::Config(format!(
                "{}: min delay {:?} exceeds max delay {:?}",
                exchange, config.min_delay, config.max_delay
            )));
        }
        let finite = config.min_price.is_finite() && config.max_price.is_finite();
        if !(finite && config.min_price > 0.0 && config.min_price < config.max_price) {
            return Err(MetricsError::Config(format!(
                "{}: invalid price range [{}, {})",
                exchange, config.min_price, config.max_price
            )));
        }
        if config.max_quantity == 0 || config.max_quantity > MAX_TRADE_QUANTITY {
            return Err(MetricsError::Config(format!(
                "{}: max quantity must be within 1..={}",
                exchange, MAX_TRADE_QUANTITY
            )));
        }

        Ok(Self {
            exchange,
            publisher,
            symbols,
            ids,
            config,
        })
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    /// Build the next trade with a fresh id from the shared generator
    pub fn generate_trade<R: Rng + ?Sized>(&self, rng: &mut R) -> MetricsResult<Trade> {
        let symbol = self.symbols[rng.gen_range(0..self.symbols.len())].clone();
        let price = rng.gen_range(self.config.min_price..self.config.max_price);
        let quantity = rng.gen_range(1..=self.config.max_quantity);
        let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };

        Trade::new(self.ids.next_id(), self.exchange.clone(), symbol, price, quantity, side, Local::now())
    }

    /// Generate one trade and push it through the publisher
    pub fn publish_next<R: Rng + ?Sized>(&self, rng: &mut R) -> MetricsResult<PublishReport> {
        let trade = self.generate_trade(rng)?;
        debug!(exchange = %self.exchange, trade_id = %trade.id(), symbol = %trade.symbol(), "Publishing trade");
        Ok(self.publisher.publish_trade(&trade))
    }

    fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.config.min_delay == self.config.max_delay {
            return self.config.min_delay;
        }
        rng.gen_range(self.config.min_delay..self.config.max_delay)
    }

    /// Produce trades until `shutdown` fires. Returns the number published.
    ///
    /// Cancellation is only observed while sleeping, so a trade is either
    /// fully published or never generated.
    pub async fn run(self, shutdown: CancellationToken) -> u64 {
        let mut rng = StdRng::from_entropy();
        let mut published = 0u64;

        info!(exchange = %self.exchange, symbols = self.symbols.len(), "Exchange simulator started");

        loop {
            let delay = self.next_delay(&mut rng);
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }

            match self.publish_next(&mut rng) {
                Ok(_) => published += 1,
                Err(e) => debug!(exchange = %self.exchange, error = %e, "Skipped invalid trade"),
            }
        }

        info!(exchange = %self.exchange, published, "Exchange simulator stopped");
        published
    }
}
