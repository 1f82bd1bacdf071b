//! Rolling statistics for a single symbol
//!
//! Each symbol owns one [`SymbolStats`]; every field sits behind a single
//! per-symbol mutex so different symbols never contend and a reader always
//! sees the state left by one complete `update`.

use crate::exchanges::{Side, Trade};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;

/// Default number of prices kept in the rolling history
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

#[derive(Debug)]
struct StatsState {
    trade_count: u64,
    total_quantity: u64,
    total_price: f64,
    total_value: f64,
    min_price: Option<f64>,
    max_price: Option<f64>,
    buy_count: u64,
    sell_count: u64,
    first_price: Option<f64>,
    last_price: Option<f64>,
    price_history: VecDeque<f64>,
}

impl StatsState {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            trade_count: 0,
            total_quantity: 0,
            total_price: 0.0,
            total_value: 0.0,
            min_price: None,
            max_price: None,
            buy_count: 0,
            sell_count: 0,
            first_price: None,
            last_price: None,
            price_history: VecDeque::with_capacity(capacity),
        }
    }

    fn average_quantity(&self) -> f64 {
        if self.trade_count == 0 {
            0.0
        } else {
            self.total_quantity as f64 / self.trade_count as f64
        }
    }

    fn average_price(&self) -> f64 {
        if self.trade_count == 0 {
            0.0
        } else {
            self.total_price / self.trade_count as f64
        }
    }

    fn buy_sell_ratio(&self) -> f64 {
        // No sells yet: report the raw buy count rather than infinity.
        if self.sell_count == 0 {
            self.buy_count as f64
        } else {
            self.buy_count as f64 / self.sell_count as f64
        }
    }

    fn price_change_percent(&self) -> f64 {
        match (self.first_price, self.last_price) {
            (Some(first), Some(last)) if first > 0.0 && last > 0.0 => (last - first) / first * 100.0,
            _ => 0.0,
        }
    }
}

/// Point-in-time copy of one symbol's statistics, all taken under one lock
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolStatsSnapshot {
    pub trade_count: u64,
    pub total_quantity: u64,
    pub average_quantity: f64,
    pub average_price: f64,
    pub total_value: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub buy_count: u64,
    pub sell_count: u64,
    pub buy_sell_ratio: f64,
    pub price_change_percent: f64,
    pub price_history: Vec<f64>,
}

/// Mutable per-symbol accumulator
#[derive(Debug)]
pub struct SymbolStats {
    capacity: usize,
    state: Mutex<StatsState>,
}

impl SymbolStats {
    /// `capacity` is the rolling history length; zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            state: Mutex::new(StatsState::with_capacity(capacity)),
        }
    }

    /// Apply one trade
    pub fn update(&self, trade: &Trade) {
        let price = trade.price();
        let mut state = self.state.lock();

        state.trade_count += 1;
        state.total_quantity += trade.quantity() as u64;
        state.total_price += price;
        state.total_value += trade.notional();

        state.min_price = Some(state.min_price.map_or(price, |min| min.min(price)));
        state.max_price = Some(state.max_price.map_or(price, |max| max.max(price)));

        match trade.side() {
            Side::Buy => state.buy_count += 1,
            Side::Sell => state.sell_count += 1,
        }

        if state.first_price.is_none() {
            state.first_price = Some(price);
        }
        state.last_price = Some(price);

        if state.price_history.len() >= self.capacity {
            state.price_history.pop_front();
        }
        state.price_history.push_back(price);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn trade_count(&self) -> u64 {
        self.state.lock().trade_count
    }

    pub fn total_quantity(&self) -> u64 {
        self.state.lock().total_quantity
    }

    pub fn average_quantity(&self) -> f64 {
        self.state.lock().average_quantity()
    }

    pub fn average_price(&self) -> f64 {
        self.state.lock().average_price()
    }

    /// Cumulative notional value (price × quantity)
    pub fn total_value(&self) -> f64 {
        self.state.lock().total_value
    }

    /// 0 until the first trade arrives
    pub fn min_price(&self) -> f64 {
        self.state.lock().min_price.unwrap_or(0.0)
    }

    /// 0 until the first trade arrives
    pub fn max_price(&self) -> f64 {
        self.state.lock().max_price.unwrap_or(0.0)
    }

    pub fn buy_count(&self) -> u64 {
        self.state.lock().buy_count
    }

    pub fn sell_count(&self) -> u64 {
        self.state.lock().sell_count
    }

    pub fn buy_sell_ratio(&self) -> f64 {
        self.state.lock().buy_sell_ratio()
    }

    pub fn first_price(&self) -> Option<f64> {
        self.state.lock().first_price
    }

    pub fn last_price(&self) -> Option<f64> {
        self.state.lock().last_price
    }

    pub fn price_change_percent(&self) -> f64 {
        self.state.lock().price_change_percent()
    }

    /// Oldest first
    pub fn price_history(&self) -> Vec<f64> {
        self.state.lock().price_history.iter().copied().collect()
    }

    pub fn snapshot(&self) -> SymbolStatsSnapshot {
        let state = self.state.lock();
        SymbolStatsSnapshot {
            trade_count: state.trade_count,
            total_quantity: state.total_quantity,
            average_quantity: state.average_quantity(),
            average_price: state.average_price(),
            total_value: state.total_value,
            min_price: state.min_price.unwrap_or(0.0),
            max_price: state.max_price.unwrap_or(0.0),
            buy_count: state.buy_count,
            sell_count: state.sell_count,
            buy_sell_ratio: state.buy_sell_ratio(),
            price_change_percent: state.price_change_percent(),
            price_history: state.price_history.iter().copied().collect(),
        }
    }
}

impl Default for SymbolStats {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
