//! Real-Time Market Metrics Dashboard
//!
//! Runs one simulated trade feed per configured exchange and redraws the
//! per-symbol statistics table until Ctrl+C.

use anyhow::Result;
use std::env;
use std::path::PathBuf;
use tokio::signal;
use tracing::info;

use market_metrics_core::config::{ConfigStore, DashboardConfig, DEFAULT_CONFIG_PATH};
use market_metrics_core::io::load_symbols;
use market_metrics_core::logging::init_tracing;
use market_metrics_core::MarketMetricsSystem;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_tracing();

    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let store = ConfigStore::load(&config_path);
    let config = DashboardConfig::from_store(&store);
    colored::control::set_override(config.colors_enabled);

    info!(
        config = %config_path.display(),
        exchanges = ?config.exchanges,
        refresh_ms = config.refresh_interval.as_millis() as u64,
        "🚀 Starting Real-Time Market Metrics Dashboard"
    );

    let symbols = load_symbols(&config.symbols_path);
    let mut system = MarketMetricsSystem::new(config, symbols)?;
    system.start()?;
    info!("✅ Market metrics dashboard started. Press Ctrl+C to stop.");

    signal::ctrl_c().await?;
    info!("🛑 Shutdown signal received...");

    let published = system.stop().await?;
    let collector = system.collector();
    info!("📊 Final Statistics:");
    info!("  Trades published: {}", published);
    info!("  Symbols tracked: {}", collector.symbol_count());
    for (symbol, count) in collector.top_traded(3) {
        info!("  {}: {} trades", symbol, count);
    }

    info!("✅ Market metrics dashboard shutdown complete");
    Ok(())
}
