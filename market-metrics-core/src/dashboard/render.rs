//! Text rendering of the dashboard frame

use crate::exchanges::Symbol;
use crate::metrics::{StatsSnapshot, SymbolStatsSnapshot};
use chrono::NaiveDateTime;
use colored::Colorize;
use std::fmt::Write;

const SPARK_BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const SPARK_EPSILON: f64 = 0.0001;
const RULE: &str = "-------------------------------------------";

/// Everything one refresh shows, copied out of the collector
#[derive(Debug, Clone)]
pub struct DashboardFrame {
    pub timestamp: NaiveDateTime,
    pub trades_per_second: u64,
    pub top_traded: Vec<(Symbol, u64)>,
    pub stats: StatsSnapshot,
}

/// Map prices onto eight block glyphs scaled between the window's min and max
pub fn sparkline(history: &[f64]) -> String {
    if history.is_empty() {
        return String::new();
    }

    let min = history.iter().copied().fold(f64::INFINITY, f64::min);
    let max = history.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let top = (SPARK_BLOCKS.len() - 1) as f64;

    history
        .iter()
        .map(|v| {
            let level = ((v - min) / (max - min + SPARK_EPSILON) * top) as isize;
            SPARK_BLOCKS[level.clamp(0, SPARK_BLOCKS.len() as isize - 1) as usize]
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct DashboardRenderer {
    use_colors: bool,
    sparkline_width: usize,
}

impl DashboardRenderer {
    pub fn new(use_colors: bool, sparkline_width: usize) -> Self {
        Self {
            use_colors,
            sparkline_width: sparkline_width.max(1),
        }
    }

    pub fn render(&self, frame: &DashboardFrame) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "=== REAL-TIME MARKET METRICS DASHBOARD ===");
        let _ = writeln!(out, "Timestamp: {}", frame.timestamp.format("%Y-%m-%dT%H:%M:%S%.3f"));
        let _ = writeln!(out, "{}", RULE);
        let _ = writeln!(out, "Trades per second: {}", frame.trades_per_second);

        let heading = "Top 3 traded symbols:";
        if self.use_colors {
            let _ = writeln!(out, "{}", heading.yellow());
        } else {
            let _ = writeln!(out, "{}", heading);
        }
        for (symbol, count) in &frame.top_traded {
            let _ = writeln!(out, "  {} ({} trades)", symbol, count);
        }

        let _ = writeln!(out, "\nPer-Symbol Statistics:");
        let _ = writeln!(
            out,
            "{:<8} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<10} {:<22}",
            "Symbol", "Trades", "AvgQty", "AvgPrice", "TotValue", "Min", "Max", "Buy/Sell", "Change%", "PriceTrend"
        );
        for (symbol, stats) in &frame.stats {
            out.push_str(&self.render_row(symbol, stats));
            out.push('\n');
        }

        let _ = writeln!(out, "{}", RULE);
        out
    }

    fn render_row(&self, symbol: &Symbol, stats: &SymbolStatsSnapshot) -> String {
        let ratio = format!("{:<10.2}", stats.buy_sell_ratio);
        let change = format!("{:<10.2}", stats.price_change_percent);

        let start = stats.price_history.len().saturating_sub(self.sparkline_width);
        let window = &stats.price_history[start..];
        let trend = sparkline(window);

        let (ratio, change, trend) = if self.use_colors {
            let ratio = if stats.buy_sell_ratio < 1.0 { ratio.red() } else { ratio.green() };
            let change = if stats.price_change_percent < 0.0 { change.red() } else { change.green() };
            let rising = match (window.first(), window.last()) {
                (Some(first), Some(last)) => last >= first,
                _ => true,
            };
            let trend = if rising { trend.green() } else { trend.red() };
            (ratio.to_string(), change.to_string(), trend.to_string())
        } else {
            (ratio, change, trend)
        };

        format!(
            "{:<8} {:<10} {:<10.2} {:<10.2} {:<10.2} {:<10.2} {:<10.2} {} {} | {}",
            symbol.as_str(),
            stats.trade_count,
            stats.average_quantity,
            stats.average_price,
            stats.total_value,
            stats.min_price,
            stats.max_price,
            ratio,
            change,
            trend
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchanges::{Side, Trade, TradeId};
    use crate::metrics::MetricsCollector;
    use chrono::{Local, NaiveDate};

    #[test]
    fn test_sparkline_levels() {
        assert_eq!(sparkline(&[]), "");
        assert_eq!(sparkline(&[42.0, 42.0, 42.0]), "▁▁▁");
        assert_eq!(sparkline(&[0.0, 100.0]), "▁▇");
        assert_eq!(sparkline(&[0.0, 50.0, 100.0]), "▁▄▇");

        let rising: Vec<f64> = (0..20).map(|i| 50.0 + i as f64 * 3.0).collect();
        let glyphs: Vec<char> = sparkline(&rising).chars().collect();
        assert_eq!(glyphs.len(), 20);
        assert!(glyphs.windows(2).all(|w| {
            let a = SPARK_BLOCKS.iter().position(|c| *c == w[0]).unwrap();
            let b = SPARK_BLOCKS.iter().position(|c| *c == w[1]).unwrap();
            a <= b
        }));
    }

    #[test]
    fn test_render_plain_frame() {
        let collector = MetricsCollector::default();
        for (price, side) in [(100.0, Side::Buy), (110.0, Side::Sell)] {
            let trade = Trade::new(TradeId(1), "NYSE", Symbol::new("AAPL"), price, 10, side, Local::now()).unwrap();
            collector.record_trade(&trade);
        }

        let frame = DashboardFrame {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(9, 30, 0).unwrap(),
            trades_per_second: collector.get_and_reset_trades_per_second(),
            top_traded: collector.top_traded(3),
            stats: collector.snapshot_symbol_stats(),
        };
        let text = DashboardRenderer::new(false, 20).render(&frame);

        assert!(text.starts_with("=== REAL-TIME MARKET METRICS DASHBOARD ===\n"));
        assert!(text.contains("Timestamp: 2024-03-01T09:30:00.000\n"));
        assert!(text.contains("Trades per second: 2\n"));
        assert!(text.contains("  AAPL (2 trades)\n"));
        assert!(!text.contains('\u{1b}'));

        let row = text.lines().find(|l| l.starts_with("AAPL")).unwrap();
        assert_eq!(
            row,
            "AAPL     2          10.00      105.00     2100.00    100.00     110.00     1.00       10.00      | ▁▇"
        );
    }

    #[test]
    fn test_sparkline_width_limits_window() {
        let stats = SymbolStatsSnapshot {
            trade_count: 4,
            total_quantity: 4,
            average_quantity: 1.0,
            average_price: 2.5,
            total_value: 10.0,
            min_price: 1.0,
            max_price: 4.0,
            buy_count: 4,
            sell_count: 0,
            buy_sell_ratio: 4.0,
            price_change_percent: 300.0,
            price_history: vec![1.0, 2.0, 3.0, 4.0],
        };
        let row = DashboardRenderer::new(false, 2).render_row(&Symbol::new("X"), &stats);
        assert!(row.ends_with("| ▁▇"));
    }
}
