//! Trade data types shared by producers, the publisher and subscribers

use super::errors::{MetricsError, MetricsResult};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Largest quantity a single trade may carry
pub const MAX_TRADE_QUANTITY: u32 = 100;

/// Trading symbol
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn validate(&self) -> bool {
        !self.0.is_empty() && self.0.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Trade side
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Globally unique trade identifier, rendered as `T<n>`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TradeId(pub u64);

impl TradeId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Id source shared by every producer in the process.
///
/// Ids start at 1 and are handed out with a single atomic fetch-add, so no
/// two trades ever share one and none is skipped.
#[derive(Debug)]
pub struct TradeIdGenerator {
    next: AtomicU64,
}

impl TradeIdGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    pub fn next_id(&self) -> TradeId {
        TradeId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Number of ids issued so far when starting from 1
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed).saturating_sub(1)
    }
}

impl Default for TradeIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// One simulated transaction. Immutable once built; subscribers only ever see `&Trade`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Trade {
    id: TradeId,
    exchange: String,
    symbol: Symbol,
    price: f64,
    quantity: u32,
    side: Side,
    timestamp: DateTime<Local>,
}

impl Trade {
    pub fn new(
        id: TradeId,
        exchange: impl Into<String>,
        symbol: Symbol,
        price: f64,
        quantity: u32,
        side: Side,
        timestamp: DateTime<Local>,
    ) -> MetricsResult<Self> {
        if symbol.as_str().is_empty() {
            return Err(MetricsError::InvalidTrade(format!("{}: empty symbol", id)));
        }
        if !price.is_finite() || price <= 0.0 {
            return Err(MetricsError::InvalidTrade(format!("{}: price {} is not positive", id, price)));
        }
        if quantity == 0 || quantity > MAX_TRADE_QUANTITY {
            return Err(MetricsError::InvalidTrade(format!(
                "{}: quantity {} outside 1..={}",
                id, quantity, MAX_TRADE_QUANTITY
            )));
        }

        Ok(Self {
            id,
            exchange: exchange.into(),
            symbol,
            price,
            quantity,
            side,
            timestamp,
        })
    }

    pub fn id(&self) -> TradeId {
        self.id
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// Price times quantity
    pub fn notional(&self) -> f64 {
        self.price * self.quantity as f64
    }
}
