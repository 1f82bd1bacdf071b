//! Periodic dashboard refresh
//!
//! Each tick drains the trades-per-second counter, copies the top list and
//! the per-symbol snapshot out of the collector, then renders and exports
//! from those copies without touching collector locks.

pub mod render;

pub use render::{sparkline, DashboardFrame, DashboardRenderer};

use crate::export::CsvExporter;
use crate::metrics::MetricsCollector;
use chrono::Local;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const TOP_SYMBOLS: usize = 3;
const CLEAR_SCREEN: &str = "\x1b[H\x1b[2J";

pub struct Dashboard {
    collector: Arc<MetricsCollector>,
    renderer: DashboardRenderer,
    exporter: Option<CsvExporter>,
    refresh_interval: Duration,
    output: Box<dyn Write + Send>,
}

impl Dashboard {
    /// Dashboard drawing to stdout
    pub fn new(
        collector: Arc<MetricsCollector>,
        renderer: DashboardRenderer,
        exporter: Option<CsvExporter>,
        refresh_interval: Duration,
    ) -> Self {
        Self::with_output(collector, renderer, exporter, refresh_interval, Box::new(std::io::stdout()))
    }

    pub fn with_output(
        collector: Arc<MetricsCollector>,
        renderer: DashboardRenderer,
        exporter: Option<CsvExporter>,
        refresh_interval: Duration,
        output: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            collector,
            renderer,
            exporter,
            refresh_interval,
            output,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Read the collector once
    pub fn capture(&self) -> DashboardFrame {
        DashboardFrame {
            timestamp: Local::now().naive_local(),
            trades_per_second: self.collector.get_and_reset_trades_per_second(),
            top_traded: self.collector.top_traded(TOP_SYMBOLS),
            stats: self.collector.snapshot_symbol_stats(),
        }
    }

    /// One refresh: capture, draw, export. Output and export failures are
    /// logged and the cycle carries on.
    pub fn tick(&mut self) -> DashboardFrame {
        let frame = self.capture();
        let text = self.renderer.render(&frame);

        let drawn = self
            .output
            .write_all(CLEAR_SCREEN.as_bytes())
            .and_then(|_| self.output.write_all(text.as_bytes()))
            .and_then(|_| self.output.flush());
        if let Err(e) = drawn {
            warn!(error = %e, "Dashboard render failed");
        }

        if let Some(exporter) = &self.exporter {
            match exporter.export(&frame.stats, frame.timestamp) {
                Ok(rows) => debug!(rows, "Exported metrics"),
                Err(e) => warn!(error = %e, "Metrics export skipped"),
            }
        }

        debug!(
            trades_per_second = frame.trades_per_second,
            symbols = frame.stats.len(),
            "Dashboard refreshed"
        );
        frame
    }

    /// Refresh until `shutdown` fires. Returns the number of refreshes.
    pub async fn run(mut self, shutdown: CancellationToken) -> u64 {
        let mut ticks = 0u64;
        info!(interval_ms = self.refresh_interval.as_millis() as u64, "Dashboard started");

        while !shutdown.is_cancelled() {
            self.tick();
            ticks += 1;

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.refresh_interval) => {}
            }
        }

        info!(ticks, "Dashboard stopped");
        ticks
    }
}
