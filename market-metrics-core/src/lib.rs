//! Market Metrics Core
//!
//! Simulated exchanges publish trades through a fan-out publisher into a
//! concurrent per-symbol statistics collector, which a dashboard loop polls
//! for rendering and CSV export.

pub mod exchanges;
pub mod publisher;
pub mod metrics;
pub mod config;
pub mod io;
pub mod export;
pub mod dashboard;
pub mod logging;

// Re-export main types for easy access
pub use exchanges::{
    ExchangeSimulator, MetricsError, MetricsResult, Side, SimulatorConfig, Symbol, Trade, TradeId,
    TradeIdGenerator,
};
pub use publisher::{PublishReport, SubscriberId, TradePublisher, TradeSubscriber};
pub use metrics::{MetricsCollector, StatsSnapshot, SymbolStats, SymbolStatsSnapshot};
pub use crate::config::{ConfigStore, DashboardConfig};
pub use export::CsvExporter;
pub use dashboard::{Dashboard, DashboardFrame, DashboardRenderer};

use anyhow::Result;
use futures_util::future::join_all;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Top-level composition of producers, publisher, collector and dashboard
pub struct MarketMetricsSystem {
    publisher: Arc<TradePublisher>,
    collector: Arc<MetricsCollector>,
    ids: Arc<TradeIdGenerator>,
    simulators: Vec<ExchangeSimulator>,
    dashboard: Option<Dashboard>,
    shutdown: CancellationToken,
    producer_handles: Vec<JoinHandle<u64>>,
    dashboard_handle: Option<JoinHandle<u64>>,
}

impl MarketMetricsSystem {
    /// Wire the component graph; nothing runs until [`MarketMetricsSystem::start`]
    pub fn new(config: DashboardConfig, symbols: Vec<Symbol>) -> Result<Self> {
        Self::with_simulator_config(config, symbols, SimulatorConfig::default())
    }

    pub fn with_simulator_config(
        config: DashboardConfig,
        symbols: Vec<Symbol>,
        simulator_config: SimulatorConfig,
    ) -> Result<Self> {
        let publisher = Arc::new(TradePublisher::new());
        let collector = Arc::new(MetricsCollector::new(config.sparkline_history));
        publisher.subscribe(collector.clone());

        let ids = Arc::new(TradeIdGenerator::new());
        let symbols: Arc<[Symbol]> = symbols.into();
        let simulators = config
            .exchanges
            .iter()
            .map(|exchange| {
                ExchangeSimulator::new(
                    exchange.clone(),
                    publisher.clone(),
                    symbols.clone(),
                    ids.clone(),
                    simulator_config.clone(),
                )
            })
            .collect::<MetricsResult<Vec<_>>>()?;

        let exporter = if config.csv_enabled {
            match CsvExporter::create(&config.csv_path) {
                Ok(exporter) => Some(exporter),
                Err(e) => {
                    warn!(error = %e, "CSV export disabled");
                    None
                }
            }
        } else {
            None
        };

        let renderer = DashboardRenderer::new(config.colors_enabled, config.sparkline_history);
        let dashboard = Dashboard::new(collector.clone(), renderer, exporter, config.refresh_interval);

        Ok(Self {
            publisher,
            collector,
            ids,
            simulators,
            dashboard: Some(dashboard),
            shutdown: CancellationToken::new(),
            producer_handles: Vec::new(),
            dashboard_handle: None,
        })
    }

    /// Replace the stdout dashboard, e.g. to draw into another writer
    pub fn set_dashboard(&mut self, dashboard: Dashboard) {
        self.dashboard = Some(dashboard);
    }

    /// Spawn one task per exchange and one for the dashboard
    pub fn start(&mut self) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(anyhow::anyhow!("Market metrics system already stopped"));
        }

        for simulator in self.simulators.drain(..) {
            let token = self.shutdown.clone();
            self.producer_handles.push(tokio::spawn(simulator.run(token)));
        }

        if let Some(dashboard) = self.dashboard.take() {
            let token = self.shutdown.clone();
            self.dashboard_handle = Some(tokio::spawn(dashboard.run(token)));
        }

        info!(producers = self.producer_handles.len(), "Market metrics system started");
        Ok(())
    }

    /// Signal every task to stop and wait for them. Returns trades published.
    pub async fn stop(&mut self) -> Result<u64> {
        self.shutdown.cancel();

        let mut published = 0;
        for result in join_all(self.producer_handles.drain(..)).await {
            published += result?;
        }
        if let Some(handle) = self.dashboard_handle.take() {
            handle.await?;
        }

        info!(published, trades_issued = self.ids.issued(), "Market metrics system stopped");
        Ok(published)
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn publisher(&self) -> &Arc<TradePublisher> {
        &self.publisher
    }

    pub fn collector(&self) -> &Arc<MetricsCollector> {
        &self.collector
    }
}
