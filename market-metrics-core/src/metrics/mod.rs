//! Streaming trade statistics
//!
//! [`MetricsCollector`] subscribes to the publisher and keeps one
//! [`SymbolStats`] per symbol plus a trades-per-second counter that the
//! dashboard drains once per refresh.

pub mod symbol_stats;

pub use symbol_stats::{SymbolStats, SymbolStatsSnapshot, DEFAULT_HISTORY_CAPACITY};

use crate::exchanges::{MetricsResult, Symbol, Trade};
use crate::publisher::TradeSubscriber;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Copy of every symbol's statistics, ordered by symbol
pub type StatsSnapshot = BTreeMap<Symbol, SymbolStatsSnapshot>;

/// Aggregates trades from every exchange into per-symbol statistics
pub struct MetricsCollector {
    symbol_stats: DashMap<Symbol, Arc<SymbolStats>>,
    trades_this_second: AtomicU64,
    history_capacity: usize,
}

impl MetricsCollector {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            symbol_stats: DashMap::new(),
            trades_this_second: AtomicU64::new(0),
            history_capacity: history_capacity.max(1),
        }
    }

    /// Record one trade.
    ///
    /// The map entry is created under the shard lock, so racing first trades
    /// for a symbol install exactly one instance. The shard lock is released
    /// before the per-symbol update.
    pub fn record_trade(&self, trade: &Trade) {
        self.trades_this_second.fetch_add(1, Ordering::AcqRel);

        let stats = match self.symbol_stats.get(trade.symbol()) {
            Some(existing) => existing.value().clone(),
            None => self
                .symbol_stats
                .entry(trade.symbol().clone())
                .or_insert_with(|| Arc::new(SymbolStats::new(self.history_capacity)))
                .value()
                .clone(),
        };

        stats.update(trade);
    }

    /// Trades seen since the previous call; the counter restarts from zero
    pub fn get_and_reset_trades_per_second(&self) -> u64 {
        self.trades_this_second.swap(0, Ordering::AcqRel)
    }

    /// Copy every symbol's statistics. Each entry is read under its own
    /// symbol lock; writers on other symbols are not blocked.
    pub fn snapshot_symbol_stats(&self) -> StatsSnapshot {
        let handles: Vec<(Symbol, Arc<SymbolStats>)> = self
            .symbol_stats
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        handles
            .into_iter()
            .map(|(symbol, stats)| (symbol, stats.snapshot()))
            .collect()
    }

    /// The `k` most traded symbols, highest count first, ties by symbol
    pub fn top_traded(&self, k: usize) -> Vec<(Symbol, u64)> {
        let mut counts: Vec<(Symbol, u64)> = self
            .symbol_stats
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().trade_count()))
            .collect();

        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts.truncate(k);
        counts
    }

    pub fn symbol_stats(&self, symbol: &Symbol) -> Option<Arc<SymbolStats>> {
        self.symbol_stats.get(symbol).map(|s| s.value().clone())
    }

    pub fn symbol_count(&self) -> usize {
        self.symbol_stats.len()
    }

    /// Sum of per-symbol trade counts; never reset
    pub fn total_trades(&self) -> u64 {
        self.symbol_stats.iter().map(|entry| entry.value().trade_count()).sum()
    }

    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl TradeSubscriber for MetricsCollector {
    fn on_trade(&self, trade: &Trade) -> MetricsResult<()> {
        self.record_trade(trade);
        Ok(())
    }

    fn name(&self) -> &str {
        "metrics-collector"
    }
}
